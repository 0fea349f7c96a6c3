use crate::types::{Point, Rect};

/// Saturate a point into `rect`, each axis independently.
pub fn clamp(x: i32, y: i32, rect: &Rect) -> (i32, i32) {
    (
        x.max(rect.left()).min(rect.max_x()),
        y.max(rect.top()).min(rect.max_y()),
    )
}

pub fn clamp_point(p: Point, rect: &Rect) -> Point {
    let (x, y) = clamp(p.x, p.y, rect);
    Point::new(x, y)
}
