use anyhow::Result;
use image::{Rgb, RgbImage};

use crate::types::{Point, Rect};
use crate::logger;
use super::{Platform, Pointer, Screen};

/// Logs every call instead of touching the desktop.
pub struct StubPlatform;

impl Platform for StubPlatform {
    fn name(&self) -> &'static str { "stub" }

    fn screen(&self) -> Box<dyn Screen> {
        Box::new(StubScreen)
    }

    fn pointer(&self) -> Box<dyn Pointer> {
        Box::new(StubPointer { pos: Point::default(), moves: 0 })
    }
}

struct StubScreen;

impl Screen for StubScreen {
    fn grab(&mut self, rect: &Rect) -> Result<RgbImage> {
        logger::info_p("stub", &format!("grab({:?})", rect));
        let (w, h) = (rect.width() as u32, rect.height() as u32);
        Ok(RgbImage::from_fn(w, h, |x, y| {
            Rgb([(x * 255 / w.max(1)) as u8, (y * 255 / h.max(1)) as u8, 96])
        }))
    }
}

struct StubPointer {
    pos: Point,
    moves: usize,
}

impl Pointer for StubPointer {
    fn position(&mut self) -> Result<Point> {
        Ok(self.pos)
    }

    fn move_to(&mut self, p: Point) -> Result<()> {
        self.pos = p;
        self.moves += 1;
        Ok(())
    }

    fn click(&mut self, shift: bool) -> Result<()> {
        logger::info_p(
            "stub",
            &format!("click at ({}, {}) shift={} after {} moves", self.pos.x, self.pos.y, shift, self.moves),
        );
        self.moves = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grab_matches_rect_size() {
        let rect = Rect::new(10, 10, 64, 48).unwrap();
        let img = StubPlatform.screen().grab(&rect).unwrap();
        assert_eq!(img.dimensions(), (64, 48));
    }

    #[test]
    fn pointer_tracks_moves() {
        let mut p = StubPlatform.pointer();
        p.move_to(Point::new(3, 4)).unwrap();
        assert_eq!(p.position().unwrap(), Point::new(3, 4));
        p.click(true).unwrap();
    }
}
