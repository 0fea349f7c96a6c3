pub mod stub;

#[cfg(target_os = "macos")]
pub mod darwin;

use anyhow::Result;
use image::RgbImage;

use crate::types::{Point, Rect};
use crate::logger;

/// Screen capture collaborator.
pub trait Screen: Send {
    /// Grab `rect` (absolute coordinates) as an RGB frame of the same size.
    fn grab(&mut self, rect: &Rect) -> Result<RgbImage>;
}

/// Pointer control collaborator. Calls are immediate; pacing is the caller's job.
pub trait Pointer: Send {
    fn position(&mut self) -> Result<Point>;
    fn move_to(&mut self, p: Point) -> Result<()>;
    /// Left click at the current position, optionally holding shift.
    fn click(&mut self, shift: bool) -> Result<()>;
}

/// Platform-level factory for the collaborators above.
pub trait Platform: Send {
    fn name(&self) -> &'static str;
    fn screen(&self) -> Box<dyn Screen>;
    fn pointer(&self) -> Box<dyn Pointer>;
}

/// Create the platform appropriate for the current OS.
pub fn create_platform(force_stub: bool) -> Box<dyn Platform> {
    if force_stub {
        logger::register_prefix("stub", logger::COLOR_GRAY);
        return Box::new(stub::StubPlatform);
    }
    #[cfg(target_os = "macos")]
    {
        logger::register_prefix("darwin", logger::COLOR_GRAY);
        return Box::new(darwin::DarwinPlatform);
    }
    #[cfg(not(target_os = "macos"))]
    {
        logger::register_prefix("stub", logger::COLOR_GRAY);
        logger::warn("no native input backend on this OS, using stub platform");
        return Box::new(stub::StubPlatform);
    }
}
