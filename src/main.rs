use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, mpsc};
use std::thread;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    execute,
    event::{EnableMouseCapture, DisableMouseCapture},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use pilot_core::config::AppConfig;
use pilot_core::pilot::RunOutcome;
use pilot_core::types::{Command, Mode, Status};
use pilot_core::{logger, orchestrator};

/// Screen-watching pointer pilot driven by a vision-language model.
#[derive(Parser, Debug)]
#[command(name = "pilot", version)]
struct Cli {
    /// YAML config; built-in defaults when omitted.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Replay recorded frames headless and save annotated copies.
    #[arg(long, conflicts_with = "live")]
    demo: bool,

    /// Drive the real pointer headless until interrupted.
    #[arg(long)]
    live: bool,

    /// Use the stub platform (no capture or input).
    #[arg(long)]
    stub: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let mode = match (cli.demo, cli.live) {
        (true, _) => Some(Mode::Demo),
        (_, true) => Some(Mode::Live),
        _ => None,
    };
    if let Some(mode) = mode {
        return match orchestrator::run_headless(&config, mode, cli.stub)? {
            RunOutcome::Faulted(msg) => anyhow::bail!("{} run faulted: {}", mode.label(), msg),
            _ => Ok(()),
        };
    }

    run_tui(config, cli.stub)
}

fn run_tui(config: AppConfig, force_stub: bool) -> Result<()> {
    let status = Arc::new(Mutex::new(Status::default()));

    let (log_tx, log_rx) = mpsc::channel::<String>();
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();

    logger::set_tui_sender(log_tx);
    logger::info("pilot started");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = pilot_tui::App::new(Arc::clone(&status), config.clone(), log_rx, cmd_tx);

    let orch_status = Arc::clone(&status);
    let orch = thread::spawn(move || {
        orchestrator::orchestrate(orch_status, config, force_stub, cmd_rx);
    });

    let result = pilot_tui::event::run(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    // the App owns the command sender; dropping it also stops the orchestrator
    drop(app);
    orch.join().map_err(|_| anyhow::anyhow!("orchestrator panicked"))?;

    result
}
