use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tokio::sync::mpsc;

use crate::action::Action;
use crate::config::{Config, parse_key};
use crate::event::Event;
use crate::export::export_json;
use crate::format::format_secs;
use crate::monitor::{
    ControllerError, ProcessSource, RankedSummary, RunController, RunOutcome, RunReport,
    RunSettings, RunState, SummaryRow,
};
use crate::system::Collector;
use crate::ui::theme::{BorderStyle, Theme, resolve_color_support};

const STATUS_TTL_SECS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Edit,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsField {
    Duration,
    Interval,
    TopN,
}

impl SettingsField {
    pub fn next(self) -> Self {
        match self {
            SettingsField::Duration => SettingsField::Interval,
            SettingsField::Interval => SettingsField::TopN,
            SettingsField::TopN => SettingsField::Duration,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingsField::Duration => "Duration (s)",
            SettingsField::Interval => "Interval (s)",
            SettingsField::TopN => "Top N",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
    pub created: Instant,
}

#[derive(Debug, Clone)]
pub struct ResolvedKeybinds {
    pub quit: KeyCode,
    pub start: KeyCode,
    pub stop: KeyCode,
    pub export: KeyCode,
    pub toggle_mode: KeyCode,
    pub edit: KeyCode,
    pub help: KeyCode,
}

impl ResolvedKeybinds {
    pub fn from_config(kb: &crate::config::KeybindsConfig) -> Self {
        Self {
            quit: parse_key(&kb.quit).unwrap_or(KeyCode::Char('q')),
            start: parse_key(&kb.start).unwrap_or(KeyCode::Char('s')),
            stop: parse_key(&kb.stop).unwrap_or(KeyCode::Char('x')),
            export: parse_key(&kb.export).unwrap_or(KeyCode::Char('e')),
            toggle_mode: parse_key(&kb.toggle_mode).unwrap_or(KeyCode::Char('m')),
            edit: parse_key(&kb.edit).unwrap_or(KeyCode::Tab),
            help: parse_key(&kb.help).unwrap_or(KeyCode::Char('?')),
        }
    }

    /// Returns (key_label, description) pairs for all configurable keybinds.
    pub fn help_entries(&self) -> Vec<(String, &'static str)> {
        let mut entries = vec![
            (key_label(self.start), "Start monitoring"),
            (key_label(self.stop), "Stop monitoring"),
            (key_label(self.export), "Export JSON"),
            (key_label(self.toggle_mode), "Toggle delta/cumulative"),
            (key_label(self.edit), "Edit settings"),
            (key_label(self.help), "Toggle help"),
            (key_label(self.quit), "Quit"),
        ];
        entries.push(("Ctrl+C".to_string(), "Quit (always)"));
        entries
    }
}

pub fn key_label(code: KeyCode) -> String {
    match code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Backspace => "Bksp".to_string(),
        KeyCode::Delete => "Del".to_string(),
        _ => "?".to_string(),
    }
}

/// State of the interactive surface. The sampling loop itself lives in the
/// [`RunController`]; this side only reads immutable rankings from it.
pub struct App<S = Collector> {
    pub running: bool,
    pub controller: RunController<S>,
    pub settings: RunSettings,
    pub export_path: PathBuf,
    pub live: Option<Arc<RankedSummary>>,
    pub last_report: Option<RunReport>,
    pub run_started: Option<Instant>,
    /// Settings the current run was started with; edits made meanwhile only
    /// apply to the next run.
    pub run_settings: Option<RunSettings>,
    pub input_mode: InputMode,
    pub edit_field: SettingsField,
    pub edit_buffer: String,
    pub status_message: Option<StatusMessage>,
    pub theme: Theme,
    pub border_style: BorderStyle,
    pub keybinds: ResolvedKeybinds,
    events: mpsc::UnboundedSender<Event>,
}

impl<S> App<S>
where
    S: ProcessSource + Send + 'static,
{
    pub fn new(config: Config, source: S, events: mpsc::UnboundedSender<Event>) -> Self {
        let color_support = resolve_color_support(&config.ui.color_support);
        App {
            running: true,
            controller: RunController::new(source),
            settings: config.monitor.run_settings(),
            export_path: config.export.path,
            live: None,
            last_report: None,
            run_started: None,
            run_settings: None,
            input_mode: InputMode::Normal,
            edit_field: SettingsField::Duration,
            edit_buffer: String::new(),
            status_message: None,
            theme: Theme::from_config(&config.ui.theme, color_support),
            border_style: BorderStyle::from_config_str(&config.ui.border_style),
            keybinds: ResolvedKeybinds::from_config(&config.keybinds),
            events,
        }
    }

    pub fn run_state(&self) -> RunState {
        self.controller.state()
    }

    /// Ranking to show: the final one once a run has finished, otherwise the
    /// latest partial one.
    pub fn summary(&self) -> Option<&RankedSummary> {
        match &self.last_report {
            Some(report) => Some(&report.summary),
            None => self.live.as_deref(),
        }
    }

    pub fn rows(&self) -> &[SummaryRow] {
        self.summary().map(|s| s.rows.as_slice()).unwrap_or(&[])
    }

    pub fn samples(&self) -> u64 {
        self.summary().map(|s| s.samples).unwrap_or(0)
    }

    /// Settings in effect: the running window's while a run is active,
    /// otherwise the ones the next run will use.
    pub fn active_settings(&self) -> RunSettings {
        match self.run_settings {
            Some(settings) if self.controller.is_running() => settings,
            _ => self.settings,
        }
    }

    /// Fraction of the monitoring window that has elapsed, while running.
    pub fn progress(&self) -> Option<f64> {
        let started = self.run_started?;
        if !self.controller.is_running() {
            return None;
        }
        let total = self.active_settings().duration_secs;
        if total <= 0.0 {
            return None;
        }
        Some((started.elapsed().as_secs_f64() / total).clamp(0.0, 1.0))
    }

    pub fn show_help(&self) -> bool {
        self.input_mode == InputMode::Help
    }

    pub fn on_tick(&mut self) {
        if self.controller.is_running() {
            self.live = self.controller.latest();
        }

        let expired = self
            .status_message
            .as_ref()
            .is_some_and(|status| status.created.elapsed().as_secs() >= STATUS_TTL_SECS);
        if expired {
            self.status_message = None;
        }
    }

    pub fn on_run_finished(&mut self, report: RunReport) {
        let shown = report.summary.rows.len();
        let text = match report.outcome {
            RunOutcome::Completed => format!("Done: displayed top {shown}"),
            RunOutcome::Stopped => format!("Stopped: displayed top {shown}"),
        };
        self.live = None;
        self.run_started = None;
        self.run_settings = None;
        self.last_report = Some(report);
        self.set_status(text, StatusKind::Info);
    }

    pub fn map_key(&self, key: KeyEvent) -> Action {
        // Ctrl+C always quits (hardwired safety)
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Action::Quit;
        }

        match self.input_mode {
            InputMode::Normal => self.map_key_normal(key),
            InputMode::Edit => self.map_key_edit(key),
            InputMode::Help => self.map_key_help(key),
        }
    }

    fn map_key_normal(&self, key: KeyEvent) -> Action {
        let code = key.code;
        let kb = &self.keybinds;

        if code == kb.quit {
            return Action::Quit;
        }
        if code == kb.start {
            return Action::StartRun;
        }
        if code == kb.stop {
            return Action::StopRun;
        }
        if code == kb.export {
            return Action::Export;
        }
        if code == kb.toggle_mode {
            return Action::ToggleMode;
        }
        if code == kb.edit {
            return Action::EnterEdit;
        }
        if code == kb.help {
            return Action::ToggleHelp;
        }

        Action::None
    }

    fn map_key_help(&self, key: KeyEvent) -> Action {
        let code = key.code;
        if code == self.keybinds.help || code == KeyCode::Esc {
            return Action::ToggleHelp;
        }
        Action::None
    }

    fn map_key_edit(&self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Esc => Action::CancelEdit,
            KeyCode::Enter => Action::ApplyEdit,
            KeyCode::Tab => Action::NextField,
            KeyCode::Backspace => {
                let mut text = self.edit_buffer.clone();
                text.pop();
                Action::UpdateEdit(text)
            }
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' => {
                let mut text = self.edit_buffer.clone();
                text.push(c);
                Action::UpdateEdit(text)
            }
            _ => Action::None,
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => {
                self.controller.stop();
                self.running = false;
            }
            Action::StartRun => self.start_run(),
            Action::StopRun => self.stop_run(),
            Action::Export => self.export(),
            Action::ToggleMode => {
                self.settings.mode = self.settings.mode.toggle();
                self.set_status(
                    format!(
                        "Accounting mode: {} (applies to next run)",
                        self.settings.mode.label()
                    ),
                    StatusKind::Info,
                );
            }
            Action::EnterEdit => {
                self.input_mode = InputMode::Edit;
                self.edit_field = SettingsField::Duration;
                self.edit_buffer = self.field_value(self.edit_field);
            }
            Action::NextField => {
                if self.apply_edit() {
                    self.edit_field = self.edit_field.next();
                    self.edit_buffer = self.field_value(self.edit_field);
                }
            }
            Action::UpdateEdit(text) => {
                self.edit_buffer = text;
            }
            Action::ApplyEdit => {
                if self.apply_edit() {
                    self.input_mode = InputMode::Normal;
                }
            }
            Action::CancelEdit => {
                self.edit_buffer.clear();
                self.input_mode = InputMode::Normal;
            }
            Action::ToggleHelp => {
                self.input_mode = if self.input_mode == InputMode::Help {
                    InputMode::Normal
                } else {
                    InputMode::Help
                };
            }
            Action::None => {}
        }
    }

    fn start_run(&mut self) {
        let events = self.events.clone();
        let sink = move |report: RunReport| {
            let _ = events.send(Event::RunFinished(Box::new(report)));
        };

        match self.controller.start(self.settings, sink) {
            Ok(()) => {
                self.live = None;
                self.last_report = None;
                self.run_started = Some(Instant::now());
                self.run_settings = Some(self.settings);
                let text = format!(
                    "Monitoring for {}s (interval {}s)...",
                    format_secs_f64(self.settings.duration_secs),
                    format_secs_f64(self.settings.interval_secs)
                );
                self.set_status(text, StatusKind::Info);
            }
            Err(ControllerError::AlreadyRunning) => {
                self.set_status("Monitoring already in progress.", StatusKind::Error);
            }
            Err(err) => {
                self.set_status(format!("Cannot start: {err}"), StatusKind::Error);
            }
        }
    }

    fn stop_run(&mut self) {
        if self.controller.is_running() {
            self.controller.stop();
            self.set_status("Stopping...", StatusKind::Info);
        }
    }

    fn export(&mut self) {
        let Some(report) = &self.last_report else {
            self.set_status("No data to export.", StatusKind::Error);
            return;
        };
        match export_json(&report.summary, &self.export_path) {
            Ok(count) => {
                let text = format!("Exported {count} rows to {}", self.export_path.display());
                self.set_status(text, StatusKind::Info);
            }
            Err(err) => {
                self.set_status(format!("Failed to export: {err}"), StatusKind::Error);
            }
        }
    }

    pub fn field_value(&self, field: SettingsField) -> String {
        match field {
            SettingsField::Duration => format_secs_f64(self.settings.duration_secs),
            SettingsField::Interval => format_secs_f64(self.settings.interval_secs),
            SettingsField::TopN => self.settings.top_n.to_string(),
        }
    }

    /// Commit the edit buffer to the focused field. Values are clamped the same
    /// way the start form always has: duration >= 1s, interval >= 0.1s, top >= 1.
    fn apply_edit(&mut self) -> bool {
        let text = self.edit_buffer.trim();
        let field = self.edit_field;
        let applied = match field {
            SettingsField::Duration => text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| self.settings.duration_secs = v.max(1.0)),
            SettingsField::Interval => text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| self.settings.interval_secs = v.max(0.1)),
            SettingsField::TopN => text
                .parse::<usize>()
                .ok()
                .map(|v| self.settings.top_n = v.max(1)),
        };

        if applied.is_none() {
            self.set_status(
                format!("Invalid value for {}: {:?}", field.label(), text),
                StatusKind::Error,
            );
            return false;
        }
        true
    }

    fn set_status(&mut self, text: impl Into<String>, kind: StatusKind) {
        self.status_message = Some(StatusMessage {
            text: text.into(),
            kind,
            created: Instant::now(),
        });
    }
}

fn format_secs_f64(secs: f64) -> String {
    match std::time::Duration::try_from_secs_f64(secs) {
        Ok(duration) => format_secs(duration),
        Err(_) => format!("{secs}"),
    }
}
