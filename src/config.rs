use std::path::{Path, PathBuf};

use crossterm::event::KeyCode;
use serde::Deserialize;

use crate::monitor::{AccountingMode, RunSettings};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub export: ExportConfig,
    pub ui: UiConfig,
    pub keybinds: KeybindsConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub duration_secs: f64,
    pub interval_secs: f64,
    pub top_n: usize,
    pub mode: String,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            duration_secs: 120.0,
            interval_secs: 1.0,
            top_n: 15,
            mode: "delta".to_string(),
        }
    }
}

impl MonitorConfig {
    pub fn run_settings(&self) -> RunSettings {
        RunSettings::new(self.duration_secs, self.interval_secs, self.top_n)
            .with_mode(AccountingMode::from_str_config(&self.mode))
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub path: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            path: PathBuf::from("disk_usage.json"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub refresh_rate_ms: u64,
    pub theme: String,
    pub color_support: String,
    pub border_style: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        UiConfig {
            refresh_rate_ms: 500,
            theme: "dark".to_string(),
            color_support: "auto".to_string(),
            border_style: "rounded".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct KeybindsConfig {
    pub quit: String,
    pub start: String,
    pub stop: String,
    pub export: String,
    pub toggle_mode: String,
    pub edit: String,
    pub help: String,
}

impl Default for KeybindsConfig {
    fn default() -> Self {
        KeybindsConfig {
            quit: "q".to_string(),
            start: "s".to_string(),
            stop: "x".to_string(),
            export: "e".to_string(),
            toggle_mode: "m".to_string(),
            edit: "Tab".to_string(),
            help: "?".to_string(),
        }
    }
}

/// Parse a keybind name from the config file: a single character or one of
/// the named keys.
pub fn parse_key(s: &str) -> Option<KeyCode> {
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c));
    }
    match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "space" => Some(KeyCode::Char(' ')),
        "backspace" => Some(KeyCode::Backspace),
        "delete" | "del" => Some(KeyCode::Delete),
        _ => None,
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("disktop").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "invalid config, using defaults");
                Config::default()
            }
        },
        Err(_) => Config::default(),
    }
}
