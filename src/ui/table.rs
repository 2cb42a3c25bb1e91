use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::Span;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table};

use crate::format::format_mb;
use crate::monitor::{RunState, SummaryRow};
use crate::ui::theme::{BorderStyle, Theme};

/// Placeholder shown when there are no rows for the given run state.
/// `start_key` is the label of whatever key is bound to starting a run.
pub fn empty_message(state: RunState, start_key: &str) -> String {
    match state {
        RunState::Idle => format!("Press {start_key} to start monitoring"),
        RunState::Running => "Collecting baseline...".to_string(),
        RunState::Completed | RunState::Stopped => "No disk I/O recorded.".to_string(),
    }
}

/// Percentage of the ranked total that `row` accounts for.
pub fn share_percent(row: &SummaryRow, grand_total: u64) -> f64 {
    if grand_total == 0 {
        return 0.0;
    }
    row.total_bytes as f64 / grand_total as f64 * 100.0
}

pub fn render(
    frame: &mut Frame,
    area: Rect,
    rows: &[SummaryRow],
    state: RunState,
    start_key: &str,
    theme: &Theme,
    border_style: BorderStyle,
) {
    let title = match state {
        RunState::Running => " Top processes (live) ",
        _ => " Top processes ",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(border_style.border_type())
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            title,
            Style::default()
                .fg(theme.text_secondary)
                .add_modifier(Modifier::BOLD),
        ));

    if rows.is_empty() {
        let inner = block.inner(area);
        frame.render_widget(block, area);
        let msg = Paragraph::new(empty_message(state, start_key))
            .alignment(Alignment::Center)
            .style(Style::default().fg(theme.text_secondary));
        let y = inner.y + inner.height / 2;
        frame.render_widget(msg, Rect::new(inner.x, y, inner.width, 1.min(inner.height)));
        return;
    }

    let grand_total: u64 = rows.iter().map(|r| r.total_bytes).sum();
    let header = Row::new([
        "#",
        "PID",
        "Process",
        "Read (MB)",
        "Write (MB)",
        "Total (MB)",
        "Share",
    ])
    .style(
        Style::default()
            .fg(theme.text_primary)
            .add_modifier(Modifier::BOLD),
    );

    let body: Vec<Row> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Row::new([
                Cell::from((i + 1).to_string()),
                Cell::from(row.identity.pid.to_string()),
                Cell::from(row.identity.name.clone()),
                Cell::from(format_mb(row.read_mb())).style(Style::default().fg(theme.read_color)),
                Cell::from(format_mb(row.write_mb()))
                    .style(Style::default().fg(theme.write_color)),
                Cell::from(format_mb(row.total_mb())),
                Cell::from(format!("{:.1}%", share_percent(row, grand_total))),
            ])
            .style(Style::default().fg(theme.text_primary))
        })
        .collect();

    let widths = [
        Constraint::Length(3),
        Constraint::Length(7),
        Constraint::Min(12),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(10),
        Constraint::Length(6),
    ];

    let table = Table::new(body, widths)
        .header(header)
        .block(block)
        .column_spacing(1);
    frame.render_widget(table, area);
}
