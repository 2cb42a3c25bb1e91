use ratatui::Frame;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::ui::theme::Theme;

const MODE_NOTES: [&str; 2] = [
    "delta: bytes moved during the window",
    "cumulative: raw counters summed per tick",
];

/// Centered overlay listing every keybind plus a short note on accounting modes.
pub fn render(frame: &mut Frame, area: Rect, entries: &[(String, &str)], theme: &Theme) {
    let body_rows = entries.len() + 1 + MODE_NOTES.len();
    let width = 46u16.min(area.width.saturating_sub(4));
    let height = (body_rows as u16 + 2).min(area.height.saturating_sub(2));

    let overlay = centered_rect(width, height, area);
    frame.render_widget(Clear, overlay);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.overlay_border))
        .title(Span::styled(
            " Help ",
            Style::default()
                .fg(theme.accent)
                .add_modifier(Modifier::BOLD),
        ));
    let inner = block.inner(overlay);

    let key_style = Style::default()
        .fg(theme.pill_key_fg)
        .bg(theme.pill_key_bg)
        .add_modifier(Modifier::BOLD);
    let desc_style = Style::default().fg(theme.pill_desc_fg);

    let mut lines: Vec<Line> = entries
        .iter()
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(format!(" {key:>7} "), key_style),
                Span::styled(format!("  {desc}"), desc_style),
            ])
        })
        .collect();
    lines.push(Line::default());
    lines.extend(MODE_NOTES.iter().map(|note| {
        Line::from(Span::styled(
            format!(" {note}"),
            Style::default().fg(theme.text_secondary),
        ))
    }));

    frame.render_widget(block, overlay);
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(theme.surface_bg)),
        inner,
    );
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [vert] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [horiz] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(vert);
    horiz
}
