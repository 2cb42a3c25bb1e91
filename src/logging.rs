use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::ValueEnum;
use color_eyre::eyre::{Result, WrapErr, eyre};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Where log lines go. The interactive surface owns the terminal, so it logs
/// to a file instead of stderr.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

pub fn default_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("disktop")
        .join("disktop.log")
}

/// `RUST_LOG` wins; otherwise each `-v` raises the level one step from `warn`.
pub fn filter_for_verbosity(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_name(verbosity)))
}

fn level_name(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

pub fn init_logging(target: &LogTarget, format: LogFormat, verbosity: u8) -> Result<()> {
    let filter = filter_for_verbosity(verbosity);
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match target {
        LogTarget::Stderr => {
            let builder = builder.with_writer(std::io::stderr);
            match format {
                LogFormat::Text => builder.try_init(),
                LogFormat::Json => builder.json().try_init(),
            }
        }
        LogTarget::File(path) => {
            ensure_parent_dir(path)?;
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .wrap_err_with(|| format!("failed to open log file {}", path.display()))?;
            let builder = builder.with_ansi(false).with_writer(Mutex::new(file));
            match format {
                LogFormat::Text => builder.try_init(),
                LogFormat::Json => builder.json().try_init(),
            }
        }
    };

    installed.map_err(|e| eyre!("failed to set tracing subscriber: {e}"))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}
