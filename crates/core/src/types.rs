use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::action::Action;
use crate::config::ConfigError;

/// Absolute screen coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Screen rectangle in absolute coordinates. Width and height are always > 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rect {
    left: i32,
    top: i32,
    width: i32,
    height: i32,
}

impl Rect {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Result<Self, ConfigError> {
        if width <= 0 || height <= 0 {
            return Err(ConfigError::EmptyRect { width, height });
        }
        Ok(Self { left, top, width, height })
    }

    pub fn left(&self) -> i32 { self.left }
    pub fn top(&self) -> i32 { self.top }
    pub fn width(&self) -> i32 { self.width }
    pub fn height(&self) -> i32 { self.height }

    /// Right-most column that still lies inside the rectangle.
    pub fn max_x(&self) -> i32 {
        self.left.saturating_add(self.width - 1)
    }

    /// Bottom-most row that still lies inside the rectangle.
    pub fn max_y(&self) -> i32 {
        self.top.saturating_add(self.height - 1)
    }

    /// Translate an observation-local point into absolute screen space.
    /// Saturates instead of wrapping, so a clamp afterwards still lands on
    /// the nearest edge.
    pub fn to_absolute(&self, x: i32, y: i32) -> Point {
        Point::new(self.left.saturating_add(x), self.top.saturating_add(y))
    }
}

/// An object reported alongside a frame. `bbox` is `[x1, y1, x2, y2]` in
/// observation-local pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub bbox: [i32; 4],
    pub name: String,
}

/// One tick's worth of perception: an RGB frame plus optional objects.
#[derive(Debug, Clone)]
pub struct Observation {
    pub image: RgbImage,
    pub objects: Option<Vec<DetectedObject>>,
}

impl Observation {
    pub fn new(image: RgbImage) -> Self {
        Self { image, objects: None }
    }

    pub fn width(&self) -> u32 { self.image.width() }
    pub fn height(&self) -> u32 { self.image.height() }
}

/// Cooperative stop signal shared between a run and whoever controls it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Which loop a run is driving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Live,
    Demo,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Live => "live",
            Mode::Demo => "demo",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Stopped,
    Running,
    Stopping,
    Faulted,
}

/// Snapshot published by the orchestrator for the control panel.
#[derive(Debug, Clone)]
pub struct Status {
    pub state: RunState,
    pub mode: Option<Mode>,
    pub ticks: u64,
    pub last_action: Option<Action>,
    pub error: Option<String>,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            state: RunState::Stopped,
            mode: None,
            ticks: 0,
            last_action: None,
            error: None,
        }
    }
}

/// Command from TUI to orchestrator
pub enum Command {
    StartLive,
    StartDemo,
    Stop,
    Quit,
}
