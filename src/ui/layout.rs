//! Main UI layout and rendering for the DaSifA terminal front-end.

use std::path::Path;

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, Paragraph},
    Frame,
};

use crate::app::App;
use crate::storage::{format_percent, usage_line, Reading, ReadingStatus};
use crate::ui::colors::ColorScheme;
use crate::ui::input::InputMode;
use crate::ui::state::TuiState;
use crate::volume::Host;

/// Application version string.
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
const APP_NAME: &str = "DaSifA";

/// How many notices fit in the notice panel.
const VISIBLE_NOTICES: usize = 3;

/// Main render function that draws the entire UI.
pub fn render_ui<H: Host>(frame: &mut Frame, app: &App<H>, state: &TuiState) {
    let size = frame.area();
    let colors = ColorScheme::for_theme(app.theme());

    frame.render_widget(
        Block::default().style(Style::default().bg(colors.header_bg)),
        size,
    );

    let notices_height = VISIBLE_NOTICES as u16 + 2;
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),              // Header
            Constraint::Min(8),                 // Storage panels
            Constraint::Length(notices_height), // Notices
            Constraint::Length(3),              // Status bar
        ])
        .split(size);

    render_header(frame, main_layout[0], &colors);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(main_layout[1]);

    render_storage_panel(
        frame,
        panels[0],
        " Internal storage ",
        Some(&app.config.internal_root),
        app.internal(),
        &[],
        &colors,
    );

    let folder_line = app
        .folders()
        .map(|folders| format!("Folder: {}", folders.root().display()));
    render_storage_panel(
        frame,
        panels[1],
        " USB storage ",
        app.session().handle().map(|h| h.root()),
        app.removable(),
        folder_line.as_slice(),
        &colors,
    );

    render_notices(frame, main_layout[2], app, &colors);
    render_status_bar(frame, main_layout[3], app, state, &colors);

    match state.input_mode {
        InputMode::Help => render_help_overlay(frame, size, &colors),
        InputMode::PathInput => render_path_input_overlay(frame, size, state, &colors),
        InputMode::Confirm => {
            if let Some(device) = app.pending_permission() {
                render_permission_overlay(frame, size, &device.to_string(), &colors);
            }
        }
        InputMode::Normal => {}
    }
}

fn render_header(frame: &mut Frame, area: Rect, colors: &ColorScheme) {
    let header_style = Style::default().fg(colors.header_fg).bg(colors.header_bg);

    let title_style = Style::default()
        .fg(colors.accent)
        .add_modifier(Modifier::BOLD);

    let hint_style = Style::default()
        .fg(colors.hint_fg)
        .add_modifier(Modifier::DIM);

    let header_line = Line::from(vec![
        Span::raw(" "),
        Span::styled(format!("{} v{}", APP_NAME, VERSION), title_style),
        Span::raw(" "),
        Span::styled("\u{2502}", header_style), // Vertical separator
        Span::raw(" "),
        Span::styled("Storage status", header_style),
        Span::raw(" "),
        Span::styled("\u{2502}", header_style),
        Span::raw(" "),
        Span::styled("Press ? for help", hint_style),
    ]);

    let header_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border))
        .style(header_style);

    let header = Paragraph::new(header_line)
        .block(header_block)
        .style(header_style);

    frame.render_widget(header, area);
}

/// One storage chart: a gauge with legend and size line, or a placeholder
/// when the reading has no data.
fn render_storage_panel(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    root: Option<&Path>,
    reading: &Reading,
    extra: &[String],
    colors: &ColorScheme,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border))
        .title(title.to_string())
        .title_style(Style::default().fg(colors.accent).add_modifier(Modifier::BOLD));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Root path
            Constraint::Length(1),
            Constraint::Length(1), // Gauge
            Constraint::Length(1),
            Constraint::Min(1), // Legend and sizes
        ])
        .split(inner);

    if let Some(root) = root {
        let path = Paragraph::new(Line::from(Span::styled(
            root.display().to_string(),
            Style::default().fg(colors.path_fg),
        )));
        frame.render_widget(path, rows[0]);
    }

    let mut lines = Vec::new();
    match &reading.status {
        ReadingStatus::Ok => {
            let snapshot = &reading.snapshot;
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(colors.used).bg(colors.free))
                .ratio((snapshot.used_percent() / 100.0).clamp(0.0, 1.0))
                .label(format!("{}% used", format_percent(snapshot.used_percent())));
            frame.render_widget(gauge, rows[2]);

            lines.push(Line::from(vec![
                Span::styled("\u{25A0} ", Style::default().fg(colors.used)),
                Span::styled(
                    format!("Used {}%", format_percent(snapshot.used_percent())),
                    Style::default().fg(colors.text),
                ),
                Span::raw("   "),
                Span::styled("\u{25A0} ", Style::default().fg(colors.free)),
                Span::styled(
                    format!("Free {}%", format_percent(snapshot.free_percent())),
                    Style::default().fg(colors.text),
                ),
            ]));
            lines.push(Line::from(Span::styled(
                usage_line(snapshot),
                Style::default().fg(colors.text_dim),
            )));
        }
        ReadingStatus::NoData => {
            let message = if root.is_some() {
                "No data"
            } else {
                "No USB storage selected. Press p to select one."
            };
            lines.push(Line::from(Span::styled(
                message,
                Style::default().fg(colors.hint_fg),
            )));
        }
        ReadingStatus::Failed(reason) => {
            lines.push(Line::from(Span::styled(
                format!("Could not read storage: {}", reason),
                Style::default().fg(colors.error_fg),
            )));
        }
    }

    for text in extra {
        lines.push(Line::from(Span::styled(
            text.clone(),
            Style::default().fg(colors.text_dim),
        )));
    }

    frame.render_widget(Paragraph::new(lines), rows[4]);
}

fn render_notices<H: Host>(frame: &mut Frame, area: Rect, app: &App<H>, colors: &ColorScheme) {
    let lines: Vec<Line> = app
        .notices
        .iter()
        .rev()
        .take(VISIBLE_NOTICES)
        .map(|notice| {
            Line::from(vec![
                Span::styled(
                    format!(" {} ", notice.at.format("%H:%M:%S")),
                    Style::default().fg(colors.text_dim),
                ),
                Span::styled(
                    notice.message.clone(),
                    Style::default().fg(colors.severity_color(notice.severity)),
                ),
            ])
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border))
        .title(" Notices ")
        .title_style(Style::default().fg(colors.hint_fg));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_status_bar<H: Host>(
    frame: &mut Frame,
    area: Rect,
    app: &App<H>,
    state: &TuiState,
    colors: &ColorScheme,
) {
    let status_style = Style::default().fg(colors.status_fg).bg(colors.status_bg);

    let key_style = Style::default()
        .fg(colors.key_fg)
        .add_modifier(Modifier::BOLD);

    let hint_style = Style::default().fg(colors.hint_fg);

    let mut hints: Vec<(&str, &str)> = match state.input_mode {
        InputMode::Normal => vec![("p", "select USB"), ("r", "refresh"), ("t", "theme")],
        InputMode::PathInput => vec![("Enter", "confirm"), ("Esc", "cancel")],
        InputMode::Confirm => vec![("y", "allow"), ("n", "deny")],
        InputMode::Help => vec![("any key", "close help")],
    };
    if state.input_mode == InputMode::Normal {
        if app.can_eject() {
            hints.push(("e", "eject"));
        }
        if app.folders().is_some() {
            hints.push(("o", "open folder"));
        }
        hints.push(("q", "quit"));
    }

    let mut spans = vec![Span::raw(" ")];
    for (i, (key, action)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" \u{2502} ", hint_style));
        }
        spans.push(Span::styled(*key, key_style));
        spans.push(Span::styled(format!(" {}", action), hint_style));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.border))
        .style(status_style);

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

/// Rectangle of at most `width` x `height` centered in `area`.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn overlay_block(title: &str, colors: &ColorScheme) -> Block<'static> {
    Block::default()
        .title(title.to_string())
        .title_style(Style::default().fg(colors.accent).add_modifier(Modifier::BOLD))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors.accent))
        .style(Style::default().bg(colors.status_bg))
}

/// Render help overlay with all keyboard shortcuts.
fn render_help_overlay(frame: &mut Frame, area: Rect, colors: &ColorScheme) {
    let overlay_area = centered(area, 50, 14);
    frame.render_widget(Clear, overlay_area);

    let entry = |key: &'static str, text: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<6}", key), Style::default().fg(colors.key_fg)),
            Span::styled(text, Style::default().fg(colors.text)),
        ])
    };

    let help_text = vec![
        entry("p", "Select USB storage by path"),
        entry("e", "Eject the selected USB storage"),
        entry("o", "Open the managed folder"),
        entry("r", "Refresh both storages"),
        entry("t", "Toggle light/dark theme"),
        entry("?", "Show this help"),
        entry("q", "Quit"),
        Line::from(""),
        entry("y/n", "Answer a permission prompt"),
        Line::from(""),
        Line::from(Span::styled(
            "Press any key to close",
            Style::default().fg(colors.hint_fg),
        )),
    ];

    let paragraph = Paragraph::new(help_text).block(overlay_block(" DaSifA Help ", colors));
    frame.render_widget(paragraph, overlay_area);
}

/// Render path input overlay.
fn render_path_input_overlay(frame: &mut Frame, area: Rect, state: &TuiState, colors: &ColorScheme) {
    let overlay_area = centered(area, 75, 6);
    frame.render_widget(Clear, overlay_area);

    let block = overlay_block(" Select USB storage ", colors);
    let inner = block.inner(overlay_area);
    frame.render_widget(block, overlay_area);

    let path_line = Line::from(vec![
        Span::styled("Path: ", Style::default().fg(colors.hint_fg)),
        Span::styled(state.path_input.as_str(), Style::default().fg(colors.input_fg)),
        Span::styled("\u{2588}", Style::default().fg(colors.accent)), // Cursor
    ]);

    let hint_line = Line::from(Span::styled(
        "Enter: confirm | Esc: cancel",
        Style::default().fg(colors.hint_fg),
    ));

    frame.render_widget(Paragraph::new(vec![path_line, Line::from(""), hint_line]), inner);
}

fn render_permission_overlay(frame: &mut Frame, area: Rect, device: &str, colors: &ColorScheme) {
    let overlay_area = centered(area, 60, 6);
    frame.render_widget(Clear, overlay_area);

    let text = vec![
        Line::from(Span::styled(
            format!("Allow DaSifA to access {}?", device),
            Style::default().fg(colors.text),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("y", Style::default().fg(colors.key_fg).add_modifier(Modifier::BOLD)),
            Span::styled(" allow   ", Style::default().fg(colors.hint_fg)),
            Span::styled("n", Style::default().fg(colors.key_fg).add_modifier(Modifier::BOLD)),
            Span::styled(" deny", Style::default().fg(colors.hint_fg)),
        ]),
    ];

    let paragraph = Paragraph::new(text).block(overlay_block(" USB permission ", colors));
    frame.render_widget(paragraph, overlay_area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::volume::testing::FakeHost;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;
    use tempfile::TempDir;

    fn test_app(dir: &TempDir, host: FakeHost) -> App<FakeHost> {
        let config = AppConfig {
            internal_root: dir.path().to_path_buf(),
            config_dir: dir.path().join("config"),
            poll_interval: Duration::from_secs(3600),
            ..AppConfig::default()
        };
        App::new(config, host)
    }

    fn draw(app: &App<FakeHost>, state: &TuiState) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|frame| render_ui(frame, app, state)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_render_without_usb() {
        let dir = TempDir::new().unwrap();
        let mut app = test_app(&dir, FakeHost::new());
        app.start();

        let screen = draw(&app, &TuiState::new());

        assert!(screen.contains("Internal storage"));
        assert!(screen.contains("Used 60%"));
        assert!(screen.contains("Free 40%"));
        assert!(screen.contains("No USB storage selected"));
        assert!(!screen.contains("eject"));
    }

    #[test]
    fn test_render_with_usb_offers_eject() {
        let dir = TempDir::new().unwrap();
        let usb = TempDir::new().unwrap();
        let mut app = test_app(&dir, FakeHost::new());
        app.pick_volume(Some(usb.path().to_path_buf()));

        let screen = draw(&app, &TuiState::new());

        assert!(screen.contains("eject"));
        assert!(screen.contains("open folder"));
        assert!(screen.contains("Folder:"));
    }

    #[test]
    fn test_render_permission_prompt() {
        let dir = TempDir::new().unwrap();
        let mut host = FakeHost::new();
        host.attach("/dev/sdb1");
        let mut app = test_app(&dir, host);
        app.start();
        let mut state = TuiState::new();
        state.sync(&app);

        let screen = draw(&app, &state);

        assert!(screen.contains("Allow DaSifA to access /dev/sdb1?"));
    }

    #[test]
    fn test_centered_fits_area() {
        let area = Rect::new(0, 0, 40, 10);
        let rect = centered(area, 75, 6);
        assert!(rect.width <= 36);
        assert!(rect.x + rect.width <= area.width);
        assert!(rect.y + rect.height <= area.height);
    }
}
