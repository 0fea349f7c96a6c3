use std::sync::{Arc, Mutex, mpsc};

use pilot_core::config::AppConfig;
use pilot_core::types::{Command, Status};

use crate::confirm::ConfirmDialog;

const MAX_LOG_LINES: usize = 2000;

pub struct App {
    pub status: Arc<Mutex<Status>>,
    pub config: AppConfig,
    pub log_visible: bool,
    pub log_messages: Vec<String>,
    pub log_scroll: usize, // scroll offset from bottom (0 = latest)
    pub log_rx: mpsc::Receiver<String>,
    pub cmd_tx: mpsc::Sender<Command>,
    pub confirm: Option<ConfirmDialog>,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        status: Arc<Mutex<Status>>,
        config: AppConfig,
        log_rx: mpsc::Receiver<String>,
        cmd_tx: mpsc::Sender<Command>,
    ) -> Self {
        Self {
            status,
            config,
            log_visible: true,
            log_messages: Vec::new(),
            log_scroll: 0,
            log_rx,
            cmd_tx,
            confirm: None,
            should_quit: false,
        }
    }

    pub fn snapshot(&self) -> Status {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn drain_logs(&mut self) {
        self.log_messages.extend(self.log_rx.try_iter());
        if self.log_messages.len() > MAX_LOG_LINES {
            let excess = self.log_messages.len() - MAX_LOG_LINES;
            self.log_messages.drain(..excess);
        }
    }

    pub fn scroll_log_up(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_add(n);
    }

    pub fn scroll_log_down(&mut self, n: usize) {
        self.log_scroll = self.log_scroll.saturating_sub(n);
    }

    pub fn toggle_log(&mut self) {
        self.log_visible = !self.log_visible;
    }

    /// Live mode moves the real pointer, so it goes through a confirmation.
    pub fn request_live(&mut self) {
        self.confirm = Some(ConfirmDialog::new("Start live mode? The pointer will move."));
    }

    pub fn confirm_toggle(&mut self) {
        if let Some(dialog) = self.confirm.as_mut() {
            dialog.toggle();
        }
    }

    /// Close the dialog; `accept` overrides the highlighted button.
    pub fn confirm_close(&mut self, accept: Option<bool>) {
        let Some(dialog) = self.confirm.take() else { return };
        if accept.unwrap_or(dialog.selected) {
            self.cmd_tx.send(Command::StartLive).ok();
        }
    }

    pub fn start_demo(&mut self) {
        self.cmd_tx.send(Command::StartDemo).ok();
    }

    pub fn stop(&mut self) {
        self.cmd_tx.send(Command::Stop).ok();
    }

    pub fn quit(&mut self) {
        self.cmd_tx.send(Command::Quit).ok();
        self.should_quit = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> (App, mpsc::Sender<String>, mpsc::Receiver<Command>) {
        let (log_tx, log_rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let app = App::new(Arc::new(Mutex::new(Status::default())), AppConfig::default(), log_rx, cmd_tx);
        (app, log_tx, cmd_rx)
    }

    #[test]
    fn live_needs_confirmation() {
        let (mut app, _log, cmd_rx) = app();
        app.request_live();
        app.confirm_close(None); // defaults to No
        assert!(cmd_rx.try_recv().is_err());

        app.request_live();
        app.confirm_toggle();
        app.confirm_close(None);
        assert!(matches!(cmd_rx.try_recv(), Ok(Command::StartLive)));
        assert!(app.confirm.is_none());
    }

    #[test]
    fn log_buffer_is_bounded() {
        let (mut app, log_tx, _cmd) = app();
        for i in 0..MAX_LOG_LINES + 10 {
            log_tx.send(format!("line {}", i)).unwrap();
        }
        app.drain_logs();
        assert_eq!(app.log_messages.len(), MAX_LOG_LINES);
        assert_eq!(app.log_messages[0], "line 10");
    }
}
