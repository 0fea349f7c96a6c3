use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use pilot_core::types::{RunState, Status};
use crate::App;

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = if app.log_visible {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(f.area())
    } else {
        Layout::default()
            .constraints([Constraint::Percentage(100)])
            .split(f.area())
    };

    let status = app.snapshot();
    let (banner_label, banner_bg) = banner(&status);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(0)])
        .split(chunks[0]);

    let width = left[0].width as usize;
    let pad_left = width.saturating_sub(banner_label.len()) / 2;
    let centered = format!("{:<w$}", format!("{}{}", " ".repeat(pad_left), banner_label), w = width);
    let banner = Paragraph::new(Span::styled(
        centered,
        Style::default().fg(Color::Black).bg(banner_bg).add_modifier(Modifier::BOLD),
    ));
    f.render_widget(banner, left[0]);

    let details = Paragraph::new(detail_lines(app, &status))
        .block(
            Block::default()
                .borders(Borders::LEFT | Borders::RIGHT | Borders::BOTTOM)
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .wrap(Wrap { trim: false });
    f.render_widget(details, left[1]);

    if app.log_visible && chunks.len() > 1 {
        let visible_height = chunks[1].height.saturating_sub(2) as usize;
        let total = app.log_messages.len();
        let scroll = app.log_scroll.min(total.saturating_sub(visible_height));
        let start = total.saturating_sub(visible_height + scroll);
        let end = total.saturating_sub(scroll);
        let log_lines: Vec<Line> = app.log_messages[start..end]
            .iter()
            .map(|m| parse_log_line(m))
            .collect();

        let log_panel = Paragraph::new(log_lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Logs ")
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(log_panel, chunks[1]);
    }

    if let Some(dialog) = &app.confirm {
        dialog.render(f);
    }
}

fn banner(status: &Status) -> (String, Color) {
    let mode = status.mode.map(|m| m.label().to_uppercase()).unwrap_or_default();
    match status.state {
        RunState::Running => (format!("RUNNING {} (s to stop)", mode), Color::Green),
        RunState::Stopping => (format!("STOPPING {}...", mode), Color::Yellow),
        RunState::Stopped => ("STOPPED (l live, d demo)".to_string(), Color::Red),
        RunState::Faulted => (format!("FAULTED {} (l live, d demo)", mode), Color::Magenta),
    }
}

fn field<'a>(name: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!(" {:<9}", name), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(Color::White)),
    ])
}

fn detail_lines<'a>(app: &'a App, status: &Status) -> Vec<Line<'a>> {
    let cfg = &app.config;
    let w = &cfg.window;
    let mut lines = vec![
        Line::from(vec![
            Span::styled(" l", Style::default().fg(Color::Yellow)),
            Span::raw(" live, "),
            Span::styled("d", Style::default().fg(Color::Yellow)),
            Span::raw(" demo, "),
            Span::styled("s", Style::default().fg(Color::Yellow)),
            Span::raw(" stop, "),
            Span::styled("L", Style::default().fg(Color::Yellow)),
            Span::raw(" logs, "),
            Span::styled("q", Style::default().fg(Color::Yellow)),
            Span::raw(" quit"),
        ]),
        Line::from(""),
        field("window", format!("{}x{} at ({}, {})", w.width, w.height, w.left, w.top)),
        field("backend", format!("{} {}", cfg.model.backend, cfg.model.url)),
        field("tick", format!("{:.2}s live, {:.1} fps demo", cfg.tick_interval, cfg.fps)),
        field("ticks", status.ticks.to_string()),
    ];

    if let Some(action) = &status.last_action {
        let color = if action.is_fallback() { Color::Yellow } else { Color::Cyan };
        lines.push(Line::from(vec![
            Span::styled(format!(" {:<9}", "action"), Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("({}, {}){} {}", action.x(), action.y(), if action.modifiers.shift { " +shift" } else { "" }, action.reason),
                Style::default().fg(color),
            ),
        ]));
    }
    if let Some(err) = &status.error {
        lines.push(Line::from(Span::styled(format!(" err: {}", err), Style::default().fg(Color::Red))));
    }
    lines
}

/// Parse a structured log line (level\x1fprefix\x1fcolor\x1ftimestamp\x1fmessage)
/// into a colored Line for TUI rendering.
fn parse_log_line(raw: &str) -> Line<'_> {
    let parts: Vec<&str> = raw.splitn(5, '\x1f').collect();
    let [level, prefix, color_idx, timestamp, message] = parts[..] else {
        return Line::from(raw);
    };

    let color = match color_idx.parse::<u8>().unwrap_or(0) {
        1 => Color::DarkGray,  // COLOR_GRAY
        2 => Color::LightBlue, // COLOR_BLUE
        3 => Color::Magenta,   // COLOR_MAGENTA
        _ => Color::White,
    };

    let mut spans = vec![
        Span::styled(timestamp, Style::default().fg(Color::DarkGray)),
        Span::raw(" "),
    ];

    // only warn/error get a tag
    match level {
        "ERROR" => spans.push(Span::styled("error ", Style::default().fg(Color::Red))),
        "WARN" => spans.push(Span::styled("warn ", Style::default().fg(Color::Yellow))),
        _ => {}
    }

    if !prefix.is_empty() {
        spans.push(Span::styled(prefix, Style::default().fg(color).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::styled(message, Style::default().fg(color)));

    Line::from(spans)
}
