use std::path::Path;
use std::sync::{mpsc, Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;

use crate::config::AppConfig;
use crate::logger;
use crate::pilot::{Pilot, RunOutcome};
use crate::platform::create_platform;
use crate::types::{CancelToken, Command, Mode, RunState, Status};

/// A run in flight on its own thread.
struct Worker {
    mode: Mode,
    token: CancelToken,
    handle: JoinHandle<RunOutcome>,
}

fn lock(status: &Mutex<Status>) -> MutexGuard<'_, Status> {
    status.lock().unwrap_or_else(|e| e.into_inner())
}

/// Build the pilot for `mode`. Live runs get a fresh platform.
pub fn build_pilot(config: &AppConfig, mode: Mode, force_stub: bool, run_dir: &Path) -> Result<Pilot> {
    match mode {
        Mode::Live => {
            let platform = create_platform(force_stub);
            logger::info(&format!("platform: {}", platform.name()));
            Pilot::live(config, platform.as_ref())
        }
        Mode::Demo => Pilot::demo(config, run_dir),
    }
}

/// Hand `pilot` to a worker thread and mark the status as running.
fn launch(pilot: Pilot, mode: Mode, status: &Arc<Mutex<Status>>) -> Worker {
    *lock(status) = Status {
        state: RunState::Running,
        mode: Some(mode),
        ..Status::default()
    };
    let sink = Arc::clone(status);
    let mut pilot = pilot.on_action(move |ticks, action| {
        let mut s = lock(&sink);
        s.ticks = ticks;
        s.last_action = Some(action.clone());
    });
    let token = CancelToken::new();
    let worker_token = token.clone();
    let handle = thread::spawn(move || pilot.run(&worker_token));
    Worker { mode, token, handle }
}

fn start(config: &AppConfig, mode: Mode, force_stub: bool, status: &Arc<Mutex<Status>>) -> Result<Worker> {
    let run_dir = logger::prepare_run_dir(config.log_dir.as_deref())?;
    logger::open_run_log(&run_dir)?;
    logger::info(&format!("{} run, artifacts in {}", mode.label(), run_dir.display()));
    let pilot = build_pilot(config, mode, force_stub, &run_dir)?;
    Ok(launch(pilot, mode, status))
}

/// Publish the outcome of a finished worker. Leaves running workers alone.
fn reap(worker: &mut Option<Worker>, status: &Mutex<Status>) {
    if !worker.as_ref().is_some_and(|w| w.handle.is_finished()) {
        return;
    }
    let Some(w) = worker.take() else { return };
    finish(w, status);
}

fn finish(w: Worker, status: &Mutex<Status>) {
    let label = w.mode.label();
    let outcome = w.handle.join();
    let mut s = lock(status);
    match outcome {
        Ok(RunOutcome::Faulted(msg)) => {
            s.state = RunState::Faulted;
            s.error = Some(msg);
        }
        Ok(outcome) => {
            logger::info(&format!("{} run ended: {:?}", label, outcome));
            s.state = RunState::Stopped;
        }
        Err(_) => {
            logger::error(&format!("{} worker panicked", label));
            s.state = RunState::Faulted;
            s.error = Some("worker panicked".to_string());
        }
    }
}

/// Control loop behind the TUI. Runs on a background thread until `Quit` or
/// until the command channel closes.
pub fn orchestrate(
    status: Arc<Mutex<Status>>,
    config: AppConfig,
    force_stub: bool,
    cmd_rx: mpsc::Receiver<Command>,
) {
    let mut worker: Option<Worker> = None;

    loop {
        let cmd = match cmd_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(cmd) => Some(cmd),
            Err(mpsc::RecvTimeoutError::Timeout) => None,
            Err(mpsc::RecvTimeoutError::Disconnected) => Some(Command::Quit),
        };

        match cmd {
            Some(Command::StartLive) | Some(Command::StartDemo) if worker.is_some() => {
                logger::warn("a run is already active, stop it first");
            }
            Some(Command::StartLive) => worker = start_or_fault(&config, Mode::Live, force_stub, &status),
            Some(Command::StartDemo) => worker = start_or_fault(&config, Mode::Demo, force_stub, &status),
            Some(Command::Stop) => {
                if let Some(w) = &worker {
                    logger::info(&format!("stopping {} run", w.mode.label()));
                    w.token.cancel();
                    lock(&status).state = RunState::Stopping;
                }
            }
            Some(Command::Quit) => {
                logger::info("shutting down");
                if let Some(w) = worker.take() {
                    w.token.cancel();
                    finish(w, &status);
                }
                return;
            }
            None => {}
        }

        reap(&mut worker, &status);
    }
}

fn start_or_fault(config: &AppConfig, mode: Mode, force_stub: bool, status: &Arc<Mutex<Status>>) -> Option<Worker> {
    match start(config, mode, force_stub, status) {
        Ok(w) => Some(w),
        Err(e) => {
            logger::error(&format!("cannot start {} run: {:#}", mode.label(), e));
            *lock(status) = Status {
                state: RunState::Faulted,
                mode: Some(mode),
                error: Some(format!("{:#}", e)),
                ..Status::default()
            };
            None
        }
    }
}

/// Run one pilot to completion on the current thread, logging to stderr.
pub fn run_headless(config: &AppConfig, mode: Mode, force_stub: bool) -> Result<RunOutcome> {
    logger::set_console(true);
    let run_dir = logger::prepare_run_dir(config.log_dir.as_deref())?;
    logger::open_run_log(&run_dir)?;
    logger::info(&format!("{} run, artifacts in {}", mode.label(), run_dir.display()));
    let mut pilot = build_pilot(config, mode, force_stub, &run_dir)?;
    Ok(pilot.run(&CancelToken::new()))
}
