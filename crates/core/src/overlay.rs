use std::path::PathBuf;

use anyhow::{Context, Result};
use image::{Rgb, RgbImage};

use crate::action::Action;
use crate::control::Actuator;
use crate::types::{DetectedObject, Observation};

pub const CLICK_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

fn put(img: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

/// Copy of `frame` with a filled radius-3 dot at the click point.
pub fn draw_click(frame: &RgbImage, click: [i32; 2]) -> RgbImage {
    const R: i32 = 3;
    let mut out = frame.clone();
    let [cx, cy] = click;
    for dy in -R..=R {
        for dx in -R..=R {
            if dx * dx + dy * dy <= R * R {
                put(&mut out, cx + dx, cy + dy, CLICK_COLOR);
            }
        }
    }
    out
}

/// Copy of `frame` with one-pixel outlines around each object's bbox.
pub fn draw_objects(frame: &RgbImage, objects: &[DetectedObject]) -> RgbImage {
    let mut out = frame.clone();
    for obj in objects {
        let [x1, y1, x2, y2] = obj.bbox;
        for x in x1.min(x2)..=x1.max(x2) {
            put(&mut out, x, y1, BOX_COLOR);
            put(&mut out, x, y2, BOX_COLOR);
        }
        for y in y1.min(y2)..=y1.max(y2) {
            put(&mut out, x1, y, BOX_COLOR);
            put(&mut out, x2, y, BOX_COLOR);
        }
    }
    out
}

/// Demo actuator: saves each annotated frame instead of moving the pointer.
pub struct OverlayRecorder {
    out_dir: PathBuf,
    saved: usize,
}

impl OverlayRecorder {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir, saved: 0 }
    }

    pub fn saved(&self) -> usize {
        self.saved
    }
}

impl Actuator for OverlayRecorder {
    fn act(&mut self, action: &Action, obs: &Observation) -> Result<()> {
        let mut frame = draw_click(&obs.image, action.click);
        if let Some(objects) = &obs.objects {
            frame = draw_objects(&frame, objects);
        }
        self.saved += 1;
        let path = self.out_dir.join(format!("demo_{:04}.png", self.saved));
        frame.save(&path).with_context(|| format!("cannot write {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn click_marker_is_drawn_and_clipped() {
        let frame = RgbImage::new(20, 20);
        let out = draw_click(&frame, [10, 10]);
        assert_eq!(out.get_pixel(10, 10), &CLICK_COLOR);
        assert_eq!(out.get_pixel(13, 10), &CLICK_COLOR);
        assert_eq!(out.get_pixel(13, 13), &Rgb([0, 0, 0]));
        // corner click must not panic
        let edge = draw_click(&frame, [0, 19]);
        assert_eq!(edge.get_pixel(0, 19), &CLICK_COLOR);
        assert_eq!(frame.get_pixel(10, 10), &Rgb([0, 0, 0]));
    }

    #[test]
    fn boxes_outline_only() {
        let frame = RgbImage::new(20, 20);
        let obj = DetectedObject { bbox: [2, 2, 8, 6], name: "tree".into() };
        let out = draw_objects(&frame, &[obj]);
        assert_eq!(out.get_pixel(2, 2), &BOX_COLOR);
        assert_eq!(out.get_pixel(8, 6), &BOX_COLOR);
        assert_eq!(out.get_pixel(5, 4), &Rgb([0, 0, 0]));
    }

    #[test]
    fn recorder_writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut rec = OverlayRecorder::new(dir.path().to_path_buf());
        let obs = Observation::new(RgbImage::new(16, 16));
        rec.act(&Action::new(8, 8, false, "x"), &obs).unwrap();
        rec.act(&Action::new(2, 2, false, "y"), &obs).unwrap();
        assert_eq!(rec.saved(), 2);
        let saved = image::open(dir.path().join("demo_0001.png")).unwrap().to_rgb8();
        assert_eq!(saved.get_pixel(8, 8), &CLICK_COLOR);
        assert!(dir.path().join("demo_0002.png").is_file());
    }
}
