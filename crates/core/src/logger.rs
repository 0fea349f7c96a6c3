use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex, MutexGuard, OnceLock};
use chrono::Local;

static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

#[derive(Default)]
struct Logger {
    file: Option<File>,
    console: bool,
    tui_tx: Option<mpsc::Sender<String>>,
    prefixes: HashMap<String, u8>, // prefix -> color index
}

// Color indices for TUI rendering (mapped in ui.rs)
pub const COLOR_GRAY: u8 = 1;
pub const COLOR_BLUE: u8 = 2;
pub const COLOR_MAGENTA: u8 = 3;

/// Serialises tests that swap the global file sink.
#[cfg(test)]
pub(crate) static SINK_LOCK: Mutex<()> = Mutex::new(());

fn logger() -> MutexGuard<'static, Logger> {
    let m = LOGGER.get_or_init(|| Mutex::new(Logger::default()));
    m.lock().unwrap_or_else(|e| e.into_inner())
}

/// Create `<base or "runs">/<timestamp>/` for one run's log and artifacts.
pub fn prepare_run_dir(base: Option<&Path>) -> std::io::Result<PathBuf> {
    let root = base.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("runs"));
    let dir = root.join(Local::now().format("%Y-%m-%d_%H-%M-%S").to_string());
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Point the file sink at `<run_dir>/run.log`. Replaces any previous run log.
pub fn open_run_log(run_dir: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(run_dir.join("run.log"))?;
    logger().file = Some(file);
    Ok(())
}

/// Echo every line to stderr (headless runs).
pub fn set_console(enabled: bool) {
    logger().console = enabled;
}

/// Wire the TUI log channel.
pub fn set_tui_sender(tx: mpsc::Sender<String>) {
    logger().tui_tx = Some(tx);
}

/// Register a prefix with a color. All subsequent log calls through
/// `*_p` functions will use this prefix and color.
pub fn register_prefix(prefix: &str, color: u8) {
    logger().prefixes.insert(prefix.to_string(), color);
}

/// Internal: format for TUI channel uses \x1f as field separator:
/// level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage
fn write_log(level: &str, prefix: &str, msg: &str) {
    let ts = Local::now().format("%H:%M:%S").to_string();

    let plain = if prefix.is_empty() {
        format!("[{}] [{}] {}", ts, level, msg)
    } else {
        format!("[{}] [{}] [{}] {}", ts, level, prefix, msg)
    };

    let mut l = logger();
    let color = l.prefixes.get(prefix).copied().unwrap_or(0);
    if let Some(file) = l.file.as_mut() {
        writeln!(file, "{}", plain).ok();
    }
    if l.console {
        eprintln!("{}", plain);
    }
    if let Some(tx) = &l.tui_tx {
        tx.send(format!("{}\x1f{}\x1f{}\x1f{}\x1f{}", level, prefix, color, ts, msg)).ok();
    }
}

pub fn info(msg: &str) {
    write_log("INFO", "", msg);
}

pub fn warn(msg: &str) {
    write_log("WARN", "", msg);
}

pub fn error(msg: &str) {
    write_log("ERROR", "", msg);
}

pub fn info_p(prefix: &str, msg: &str) {
    write_log("INFO", prefix, msg);
}

pub fn warn_p(prefix: &str, msg: &str) {
    write_log("WARN", prefix, msg);
}

pub fn error_p(prefix: &str, msg: &str) {
    write_log("ERROR", prefix, msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_dir_is_created_under_base() {
        let base = tempfile::tempdir().unwrap();
        let dir = prepare_run_dir(Some(base.path())).unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir.parent(), Some(base.path()));
    }

    #[test]
    fn lines_reach_file_and_channel() {
        let _guard = SINK_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let base = tempfile::tempdir().unwrap();
        let (tx, rx) = mpsc::channel();
        open_run_log(base.path()).unwrap();
        set_tui_sender(tx);
        register_prefix("logger-test", COLOR_MAGENTA);
        info_p("logger-test", "hello from test");

        let structured: Vec<String> = rx.try_iter().collect();
        assert!(structured.iter().any(|l| l.starts_with("INFO\x1flogger-test\x1f3\x1f") && l.ends_with("hello from test")));

        let text = fs::read_to_string(base.path().join("run.log")).unwrap();
        assert!(text.contains("[INFO] [logger-test] hello from test"));
    }
}
