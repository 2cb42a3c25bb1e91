use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Gauge, Paragraph};

use crate::app::{App, InputMode, SettingsField};
use crate::format::format_bytes;
use crate::monitor::{ProcessSource, RunSettings, RunState};
use crate::ui::theme::{BorderStyle, Theme};

/// Everything the header shows, lifted out of [`App`] so it can be rendered
/// without a controller.
#[derive(Debug, Clone)]
pub struct HeaderInfo {
    pub state: RunState,
    pub settings: RunSettings,
    /// Field being edited and its current buffer.
    pub editing: Option<(SettingsField, String)>,
    pub samples: u64,
    /// Processes with accumulated I/O, before the top-N cut.
    pub tracked: usize,
    /// Bytes moved by the ranked rows.
    pub ranked_bytes: u64,
    pub progress: Option<f64>,
}

impl HeaderInfo {
    pub fn from_app<S>(app: &App<S>) -> Self
    where
        S: ProcessSource + Send + 'static,
    {
        let editing = (app.input_mode == InputMode::Edit)
            .then(|| (app.edit_field, app.edit_buffer.clone()));
        let summary = app.summary();
        HeaderInfo {
            state: app.run_state(),
            settings: app.active_settings(),
            editing,
            samples: app.samples(),
            tracked: summary.map(|s| s.observed).unwrap_or(0),
            ranked_bytes: summary.map(|s| s.total_bytes()).unwrap_or(0),
            progress: app.progress(),
        }
    }
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    info: &HeaderInfo,
    theme: &Theme,
    border_style: BorderStyle,
) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    render_settings(frame, chunks[0], info, theme, border_style);
    render_progress(frame, chunks[1], info, theme, border_style);
}

fn render_settings(
    frame: &mut Frame,
    area: Rect,
    info: &HeaderInfo,
    theme: &Theme,
    border_style: BorderStyle,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_style.border_type())
        .border_style(Style::default().fg(theme.overlay_border));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let state_color = match info.state {
        RunState::Running => theme.status_ok,
        RunState::Stopped => theme.status_err,
        RunState::Idle | RunState::Completed => theme.text_secondary,
    };

    let title = Line::from(vec![
        Span::styled(
            " disktop ",
            Style::default()
                .fg(theme.header_accent_fg)
                .bg(theme.header_accent_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            info.state.label(),
            Style::default().fg(state_color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!(
                "Samples: {}  Tracked: {}  Top total: {}",
                info.samples,
                info.tracked,
                format_bytes(info.ranked_bytes)
            ),
            Style::default().fg(theme.text_secondary),
        ),
    ]);

    let fields = [
        SettingsField::Duration,
        SettingsField::Interval,
        SettingsField::TopN,
    ];
    let mut spans = Vec::new();
    for field in fields {
        let (value, focused) = match &info.editing {
            Some((editing, buffer)) if *editing == field => (format!("{buffer}\u{2588}"), true),
            _ => (settings_value(&info.settings, field), false),
        };
        let value_style = if focused {
            Style::default()
                .fg(theme.pill_key_fg)
                .bg(theme.pill_key_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text_primary)
        };
        spans.push(Span::styled(
            format!(" {}: ", field.label()),
            Style::default().fg(theme.text_secondary),
        ));
        spans.push(Span::styled(value, value_style));
    }
    spans.push(Span::styled(
        format!("  Mode: {}", info.settings.mode.label()),
        Style::default().fg(theme.accent),
    ));

    frame.render_widget(Paragraph::new(vec![title, Line::from(spans)]), inner);
}

fn settings_value(settings: &RunSettings, field: SettingsField) -> String {
    match field {
        SettingsField::Duration => format!("{}", settings.duration_secs),
        SettingsField::Interval => format!("{}", settings.interval_secs),
        SettingsField::TopN => settings.top_n.to_string(),
    }
}

fn render_progress(
    frame: &mut Frame,
    area: Rect,
    info: &HeaderInfo,
    theme: &Theme,
    border_style: BorderStyle,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_style.border_type())
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            " Progress ",
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ));

    let ratio = match (info.state, info.progress) {
        (RunState::Running, Some(ratio)) => ratio,
        (RunState::Completed, _) => 1.0,
        _ => 0.0,
    };
    let elapsed = ratio * info.settings.duration_secs;

    let gauge = Gauge::default()
        .block(block)
        .gauge_style(
            Style::default()
                .fg(theme.gauge_filled)
                .bg(theme.gauge_unfilled),
        )
        .ratio(ratio)
        .label(format!(
            "{:.0}/{}s ({:.0}%)",
            elapsed,
            info.settings.duration_secs,
            ratio * 100.0
        ));

    frame.render_widget(gauge, area);
}
