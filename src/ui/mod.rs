pub mod header;
pub mod help;
pub mod statusbar;
pub mod table;
pub mod theme;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};

use crate::app::{App, key_label};
use crate::monitor::ProcessSource;

pub fn draw<S>(frame: &mut Frame, app: &App<S>)
where
    S: ProcessSource + Send + 'static,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(frame.area());

    let info = header::HeaderInfo::from_app(app);
    header::render(frame, chunks[0], &info, &app.theme, app.border_style);
    table::render(
        frame,
        chunks[1],
        app.rows(),
        app.run_state(),
        &key_label(app.keybinds.start),
        &app.theme,
        app.border_style,
    );
    statusbar::render(
        frame,
        chunks[2],
        app.input_mode,
        app.status_message.as_ref(),
        &app.keybinds,
        &app.theme,
    );

    // Help overlay goes last so it sits on top
    if app.show_help() {
        help::render(frame, frame.area(), &app.keybinds.help_entries(), &app.theme);
    }
}
