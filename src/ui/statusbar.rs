use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;

use crate::app::{InputMode, ResolvedKeybinds, StatusKind, StatusMessage, key_label};
use crate::ui::theme::Theme;

pub fn render(
    frame: &mut Frame,
    area: Rect,
    input_mode: InputMode,
    status_message: Option<&StatusMessage>,
    keybinds: &ResolvedKeybinds,
    theme: &Theme,
) {
    let bg_style = Style::default().bg(theme.statusbar_bg);

    // Status message takes priority
    if let Some(status) = status_message {
        let color = match status.kind {
            StatusKind::Info => theme.status_ok,
            StatusKind::Error => theme.status_err,
        };
        let line = Line::from(Span::styled(
            format!(" {}", status.text),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        frame.render_widget(Paragraph::new(line).style(bg_style), area);
        return;
    }

    let mut spans = Vec::new();
    match input_mode {
        InputMode::Edit => {
            spans.extend(pill_spans("Tab", "Next", theme));
            spans.extend(pill_spans("Enter", "Apply", theme));
            spans.extend(pill_spans("Esc", "Cancel", theme));
        }
        InputMode::Help => {
            spans.extend(pill_spans("Esc", "Close", theme));
        }
        InputMode::Normal => {
            let pills = [
                (keybinds.quit, "Quit"),
                (keybinds.start, "Start"),
                (keybinds.stop, "Stop"),
                (keybinds.export, "Export"),
                (keybinds.toggle_mode, "Mode"),
                (keybinds.edit, "Edit"),
                (keybinds.help, "Help"),
            ];
            for (code, desc) in pills {
                spans.extend(pill_spans(key_label(code), desc, theme));
            }
        }
    }

    frame.render_widget(Paragraph::new(Line::from(spans)).style(bg_style), area);
}

fn pill_spans(key: impl Into<String>, desc: &str, theme: &Theme) -> Vec<Span<'static>> {
    let key = key.into();
    vec![
        Span::raw(" "),
        Span::styled(
            format!(" {key} "),
            Style::default()
                .fg(theme.pill_key_fg)
                .bg(theme.pill_key_bg)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {desc}"),
            Style::default().fg(theme.pill_desc_fg).bg(theme.surface_bg),
        ),
    ]
}
