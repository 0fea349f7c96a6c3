use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};

use crate::config::CaptureConfig;
use crate::platform::Screen;
use crate::types::{Observation, Rect};

/// Produces one observation per tick.
pub trait ObservationSource: Send {
    /// `Ok(None)` means the source is exhausted and the run should end.
    fn next_observation(&mut self) -> Result<Option<Observation>>;
}

/// Black out every row from `floor(h * (1 - fraction))` down.
pub fn mask_bottom(img: &mut RgbImage, fraction: f32) {
    let fraction = fraction.clamp(0.0, 1.0);
    let h = img.height();
    let cut = (h as f32 * (1.0 - fraction)).floor() as u32;
    for y in cut.min(h)..h {
        for x in 0..img.width() {
            img.put_pixel(x, y, Rgb([0, 0, 0]));
        }
    }
}

/// Scale a frame down to `size`×`size`.
pub fn downscale(img: &RgbImage, size: u32) -> RgbImage {
    if img.dimensions() == (size, size) {
        return img.clone();
    }
    imageops::resize(img, size, size, FilterType::Triangle)
}

/// Live source: grabs the configured window region from the screen.
pub struct ScreenCapturer {
    screen: Box<dyn Screen>,
    rect: Rect,
    config: CaptureConfig,
}

impl ScreenCapturer {
    pub fn new(screen: Box<dyn Screen>, rect: Rect, config: CaptureConfig) -> Self {
        Self { screen, rect, config }
    }

    /// Full-size frame with the mask applied.
    pub fn grab(&mut self) -> Result<RgbImage> {
        let mut frame = self.screen.grab(&self.rect)?;
        if let Some(fraction) = self.config.mask_bottom {
            mask_bottom(&mut frame, fraction);
        }
        Ok(frame)
    }

    pub fn grab_resized(&mut self) -> Result<RgbImage> {
        let frame = self.grab()?;
        Ok(downscale(&frame, self.config.size))
    }
}

impl ObservationSource for ScreenCapturer {
    fn next_observation(&mut self) -> Result<Option<Observation>> {
        Ok(Some(Observation::new(self.grab_resized()?)))
    }
}

/// Demo source: replays image files from a directory in name order.
pub struct FrameReplay {
    frames: Vec<PathBuf>,
    next: usize,
    size: u32,
}

impl FrameReplay {
    pub fn open(dir: &Path, limit: usize, size: u32) -> Result<Self> {
        let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)
            .with_context(|| format!("cannot read demo frames from {}", dir.display()))?
            .flatten()
            .map(|e| e.path())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                    .unwrap_or(false)
            })
            .collect();
        frames.sort();
        frames.truncate(limit);
        Ok(Self { frames, next: 0, size })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl ObservationSource for FrameReplay {
    fn next_observation(&mut self) -> Result<Option<Observation>> {
        let Some(path) = self.frames.get(self.next) else { return Ok(None) };
        self.next += 1;
        let img = image::open(path)
            .with_context(|| format!("cannot decode {}", path.display()))?
            .to_rgb8();
        Ok(Some(Observation::new(downscale(&img, self.size))))
    }
}
