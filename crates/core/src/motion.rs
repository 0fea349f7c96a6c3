use rand::Rng;

use crate::types::Point;

/// Max control point offset per axis, in screen units.
pub const JITTER: f64 = 30.0;

fn cubic(t: f64, p0: f64, p1: f64, p2: f64, p3: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Jittered cubic Bezier path from `start` to `end` with `steps` points,
/// using the thread-local RNG so consecutive paths differ.
pub fn generate_path(start: Point, end: Point, steps: usize) -> Vec<Point> {
    generate_path_with(&mut rand::thread_rng(), start, end, steps)
}

/// Same as [`generate_path`] with a caller-supplied random source.
///
/// Control points sit at 25% and 75% of the straight line, each nudged by
/// up to [`JITTER`] per axis. Endpoints are the curve's own endpoints, so the
/// first point is `start` and the last is `end` exactly.
pub fn generate_path_with<R: Rng>(rng: &mut R, start: Point, end: Point, steps: usize) -> Vec<Point> {
    if steps == 0 {
        return Vec::new();
    }
    if steps == 1 {
        return vec![start];
    }

    let (x0, y0) = (start.x as f64, start.y as f64);
    let (x3, y3) = (end.x as f64, end.y as f64);
    let mut offset = || rng.gen_range(-JITTER..JITTER);

    let x1 = x0 + (x3 - x0) * 0.25 + offset();
    let y1 = y0 + (y3 - y0) * 0.25 + offset();
    let x2 = x0 + (x3 - x0) * 0.75 + offset();
    let y2 = y0 + (y3 - y0) * 0.75 + offset();

    let last = (steps - 1) as f64;
    (0..steps)
        .map(|i| {
            let t = i as f64 / last;
            Point::new(
                cubic(t, x0, x1, x2, x3).round() as i32,
                cubic(t, y0, y1, y2, y3).round() as i32,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn endpoints_are_pinned() {
        let mut rng = StdRng::seed_from_u64(7);
        let cases = [
            (Point::new(0, 0), Point::new(500, 300), 2),
            (Point::new(640, 480), Point::new(12, 900), 15),
            (Point::new(-40, 25), Point::new(-40, 25), 5),
            (Point::new(1919, 0), Point::new(0, 1079), 100),
        ];
        for _ in 0..50 {
            for (start, end, steps) in cases {
                let path = generate_path_with(&mut rng, start, end, steps);
                assert_eq!(path.first(), Some(&start));
                assert_eq!(path.last(), Some(&end));
            }
        }
    }

    #[test]
    fn length_matches_steps() {
        for steps in 1..40 {
            let path = generate_path(Point::new(3, 4), Point::new(300, 400), steps);
            assert_eq!(path.len(), steps);
        }
    }

    #[test]
    fn single_step_returns_start() {
        assert_eq!(generate_path(Point::new(10, 20), Point::new(90, 80), 1), vec![Point::new(10, 20)]);
        assert!(generate_path(Point::new(10, 20), Point::new(90, 80), 0).is_empty());
    }

    #[test]
    fn same_seed_same_path() {
        let a = generate_path_with(&mut StdRng::seed_from_u64(42), Point::new(0, 0), Point::new(400, 200), 15);
        let b = generate_path_with(&mut StdRng::seed_from_u64(42), Point::new(0, 0), Point::new(400, 200), 15);
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_bend_differently() {
        let a = generate_path_with(&mut StdRng::seed_from_u64(1), Point::new(0, 0), Point::new(400, 200), 15);
        let b = generate_path_with(&mut StdRng::seed_from_u64(2), Point::new(0, 0), Point::new(400, 200), 15);
        assert_ne!(a[1..14], b[1..14]);
    }

    #[test]
    fn stays_near_the_straight_line() {
        // Interior points are convex combinations of control points, so the
        // deviation from the chord can never exceed the jitter bound.
        let mut rng = StdRng::seed_from_u64(99);
        let path = generate_path_with(&mut rng, Point::new(0, 0), Point::new(1000, 0), 30);
        assert!(path.iter().all(|p| p.y.abs() <= JITTER as i32 + 1));
        assert!(path.iter().all(|p| p.x >= -(JITTER as i32) - 1 && p.x <= 1000 + JITTER as i32 + 1));
    }
}
