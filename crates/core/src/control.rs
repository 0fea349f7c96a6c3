use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use crate::action::Action;
use crate::config::MotionConfig;
use crate::geometry;
use crate::motion;
use crate::platform::Pointer;
use crate::types::{Observation, Point, Rect};

/// Carries out a resolved action. An error here ends the run.
pub trait Actuator: Send {
    fn act(&mut self, action: &Action, obs: &Observation) -> Result<()>;
}

/// Move through `path` so that point `i` is reached no earlier than
/// `duration * i / (len - 1)` after the start. Late points go out immediately.
pub fn replay_path(pointer: &mut dyn Pointer, path: &[Point], duration: Duration) -> Result<()> {
    let start = Instant::now();
    let span = path.len().saturating_sub(1).max(1) as f64;
    for (i, p) in path.iter().enumerate() {
        let due = duration.mul_f64(i as f64 / span);
        if let Some(wait) = due.checked_sub(start.elapsed()) {
            thread::sleep(wait);
        }
        pointer
            .move_to(*p)
            .with_context(|| format!("move to ({}, {}) failed", p.x, p.y))?;
    }
    Ok(())
}

/// Absolute, clamped screen target for an observation-local click.
pub fn screen_target(action: &Action, rect: &Rect) -> Point {
    geometry::clamp_point(rect.to_absolute(action.x(), action.y()), rect)
}

/// Drives the real pointer along a jittered path, then clicks.
pub struct MouseActuator {
    pointer: Box<dyn Pointer>,
    rect: Rect,
    motion: MotionConfig,
}

impl MouseActuator {
    pub fn new(pointer: Box<dyn Pointer>, rect: Rect, motion: MotionConfig) -> Self {
        Self { pointer, rect, motion }
    }

    pub fn move_and_click(&mut self, action: &Action) -> Result<Point> {
        let target = screen_target(action, &self.rect);
        let from = self.pointer.position().context("cannot read pointer position")?;
        let path = motion::generate_path(from, target, self.motion.steps);
        replay_path(self.pointer.as_mut(), &path, self.motion.duration())?;
        self.pointer
            .click(action.modifiers.shift)
            .with_context(|| format!("click at ({}, {}) failed", target.x, target.y))?;
        Ok(target)
    }
}

impl Actuator for MouseActuator {
    fn act(&mut self, action: &Action, _obs: &Observation) -> Result<()> {
        self.move_and_click(action).map(|_| ())
    }
}
