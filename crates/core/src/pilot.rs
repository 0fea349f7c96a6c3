//! The perception-decision-action loop.
//!
//! Each iteration waits for the next tick, captures an observation, asks the
//! decision backend for an action, resolves failures to the fallback click
//! and hands the result to the actuator. The cancel token is checked once at
//! the top of every iteration; calls already in flight are never interrupted.
//!
//! Capture errors skip the tick. Decision errors never leave
//! [`action::resolve`]. An actuator error, or a panic anywhere in the
//! iteration, ends the run with [`RunOutcome::Faulted`] and is not retried.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use anyhow::Result;

use crate::action::{self, Action};
use crate::capture::{FrameReplay, ObservationSource, ScreenCapturer};
use crate::config::AppConfig;
use crate::control::{Actuator, MouseActuator};
use crate::decision::{self, DecisionBackend};
use crate::logger;
use crate::overlay::OverlayRecorder;
use crate::platform::Platform;
use crate::scheduler::TickScheduler;
use crate::types::{CancelToken, Mode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Capturing,
    Deciding,
    Validating,
    Acting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Stop signal observed between iterations
    Cancelled,
    /// Observation source ran out of frames
    Exhausted,
    /// Actuator failed; carries the error chain
    Faulted(String),
}

type ActionObserver = Box<dyn FnMut(u64, &Action) + Send>;

pub struct Pilot {
    mode: Mode,
    prompt: String,
    scheduler: TickScheduler,
    source: Box<dyn ObservationSource>,
    backend: Box<dyn DecisionBackend>,
    actuator: Box<dyn Actuator>,
    phase: Phase,
    ticks: u64,
    observer: Option<ActionObserver>,
}

impl Pilot {
    pub fn new(
        mode: Mode,
        prompt: String,
        scheduler: TickScheduler,
        source: Box<dyn ObservationSource>,
        backend: Box<dyn DecisionBackend>,
        actuator: Box<dyn Actuator>,
    ) -> Self {
        logger::register_prefix(mode.label(), logger::COLOR_MAGENTA);
        Self {
            mode,
            prompt,
            scheduler,
            source,
            backend,
            actuator,
            phase: Phase::Idle,
            ticks: 0,
            observer: None,
        }
    }

    /// Screen capture in, real pointer out.
    pub fn live(config: &AppConfig, platform: &dyn Platform) -> Result<Self> {
        let rect = config.rect()?;
        let source = ScreenCapturer::new(platform.screen(), rect, config.capture.clone());
        let actuator = MouseActuator::new(platform.pointer(), rect, config.motion.clone());
        Ok(Self::new(
            Mode::Live,
            config.system_prompt()?,
            TickScheduler::new(config.tick_interval()),
            Box::new(source),
            decision::create_backend(&config.model)?,
            Box::new(actuator),
        ))
    }

    /// Recorded frames in, annotated frames out; the pointer is never touched.
    pub fn demo(config: &AppConfig, run_dir: &Path) -> Result<Self> {
        let source = FrameReplay::open(&config.demo_dir, config.demo_limit, config.capture.size)?;
        if source.is_empty() {
            anyhow::bail!("no demo frames found in {}", config.demo_dir.display());
        }
        Ok(Self::new(
            Mode::Demo,
            config.system_prompt()?,
            TickScheduler::new(config.demo_interval()),
            Box::new(source),
            decision::create_backend(&config.model)?,
            Box::new(OverlayRecorder::new(run_dir.to_path_buf())),
        ))
    }

    /// Called after every executed action with the tick count.
    pub fn on_action(mut self, f: impl FnMut(u64, &Action) + Send + 'static) -> Self {
        self.observer = Some(Box::new(f));
        self
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Loop until cancelled, out of frames, or the actuator fails.
    pub fn run(&mut self, token: &CancelToken) -> RunOutcome {
        let tag = self.mode.label();
        logger::info_p(tag, &format!("started with backend {}", self.backend.name()));
        let outcome = loop {
            if token.is_cancelled() {
                break RunOutcome::Cancelled;
            }
            match panic::catch_unwind(AssertUnwindSafe(|| self.step())) {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => break RunOutcome::Exhausted,
                Ok(Err(e)) => {
                    logger::error_p(tag, &format!("stopping after tick {}: {:#}", self.ticks, e));
                    break RunOutcome::Faulted(format!("{:#}", e));
                }
                Err(payload) => {
                    let msg = format!("panicked in {:?}: {}", self.phase, panic_message(payload.as_ref()));
                    logger::error_p(tag, &format!("stopping after tick {}: {}", self.ticks, msg));
                    break RunOutcome::Faulted(msg);
                }
            }
        };
        self.phase = Phase::Idle;
        logger::info_p(tag, &format!("stopped after {} tick(s): {:?}", self.ticks, outcome));
        outcome
    }

    /// One iteration. `Ok(false)` when the source is exhausted, `Err` only
    /// from the actuator.
    fn step(&mut self) -> Result<bool> {
        let tag = self.mode.label();

        self.phase = Phase::Capturing;
        self.scheduler.wait_for_next_tick();
        let obs = match self.source.next_observation() {
            Ok(Some(obs)) => obs,
            Ok(None) => return Ok(false),
            Err(e) => {
                logger::warn_p(tag, &format!("capture failed, skipping tick: {:#}", e));
                self.phase = Phase::Idle;
                return Ok(true);
            }
        };

        self.phase = Phase::Deciding;
        let candidate = self.backend.generate_action(&self.prompt, &obs);

        self.phase = Phase::Validating;
        let action = action::resolve(candidate, obs.width(), obs.height());

        self.phase = Phase::Acting;
        self.actuator.act(&action, &obs)?;

        self.ticks += 1;
        logger::info_p(tag, &action.to_json());
        if let Some(observer) = self.observer.as_mut() {
            observer(self.ticks, &action);
        }
        self.phase = Phase::Idle;
        Ok(true)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
