use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use color_eyre::Result;
use color_eyre::eyre::WrapErr;
use tokio::sync::oneshot;

use disktop::app::App;
use disktop::config::{self, Config, load_config, load_config_from_path};
use disktop::event::{Event, EventHandler};
use disktop::export::export_json;
use disktop::format::format_secs;
use disktop::logging::{LogFormat, LogTarget, default_log_path, init_logging};
use disktop::monitor::{AccountingMode, RunController};
use disktop::report::render_table;
use disktop::system::Collector;
use disktop::ui;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Delta,
    Cumulative,
}

impl From<ModeArg> for AccountingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Delta => AccountingMode::Delta,
            ModeArg::Cumulative => AccountingMode::Cumulative,
        }
    }
}

#[derive(Parser)]
#[command(
    name = "disktop",
    about = "Rank processes by disk I/O over a bounded sampling window"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Monitoring window in seconds
    #[arg(short, long)]
    duration: Option<f64>,

    /// Seconds between samples (minimum 0.1)
    #[arg(short, long)]
    interval: Option<f64>,

    /// Number of processes to rank
    #[arg(short = 'n', long = "top")]
    top_n: Option<usize>,

    /// Byte accounting: delta counts only I/O inside the window
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Write the ranking as JSON when the run ends (default path from config)
    #[arg(long, value_name = "PATH", num_args = 0..=1)]
    export: Option<Option<PathBuf>>,

    /// Open the interactive terminal UI instead of a one-shot console run
    #[arg(long, default_value_t = false)]
    tui: bool,

    /// Log file for the interactive UI
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log line format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let target = if cli.tui {
        LogTarget::File(cli.log_file.clone().unwrap_or_else(default_log_path))
    } else {
        LogTarget::Stderr
    };
    init_logging(&target, cli.log_format, cli.verbose)?;

    let config = load_config_for_cli(&cli);

    if cli.tui {
        return run_tui(config).await;
    }

    let export_path = cli
        .export
        .as_ref()
        .map(|path| path.clone().unwrap_or_else(|| config.export.path.clone()));
    run_console(config, export_path).await
}

async fn run_console(config: Config, export_path: Option<PathBuf>) -> Result<()> {
    let settings = config.monitor.run_settings();
    let controller = RunController::new(Collector::new());

    let (report_tx, mut report_rx) = oneshot::channel();
    controller
        .start(settings, move |report| {
            let _ = report_tx.send(report);
        })
        .wrap_err("cannot start monitoring")?;

    println!(
        "Monitoring disk I/O for {}s (interval {}s, {} accounting)...",
        settings.duration_secs,
        settings.interval_secs,
        settings.mode.label()
    );

    let report = tokio::select! {
        report = &mut report_rx => report?,
        _ = tokio::signal::ctrl_c() => {
            controller.stop();
            report_rx.await?
        }
    };

    println!();
    print!("{}", render_table(&report));

    if let Some(path) = export_path {
        if report.summary.is_empty() {
            println!("No data to export.");
        } else {
            let count = export_json(&report.summary, &path)?;
            println!("Exported {count} rows to {}", path.display());
        }
    }

    tracing::debug!(elapsed = %format_secs(report.elapsed), "console run done");
    Ok(())
}

async fn run_tui(config: Config) -> Result<()> {
    let mut terminal = ratatui::init();

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        ratatui::restore();
        original_hook(panic_info);
    }));

    let result = run(&mut terminal, config).await;

    ratatui::restore();

    result
}

async fn run(terminal: &mut ratatui::DefaultTerminal, config: Config) -> Result<()> {
    let tick_rate = Duration::from_millis(config.ui.refresh_rate_ms.max(50));
    let mut events = EventHandler::new(tick_rate);
    let mut app = App::new(config, Collector::new(), events.sender());

    terminal.draw(|frame| ui::draw(frame, &app))?;

    while app.running {
        let Some(event) = events.next().await else {
            break;
        };
        let mut should_draw = true;
        match event {
            Event::Key(key) => {
                if key.kind == crossterm::event::KeyEventKind::Press {
                    let action = app.map_key(key);
                    app.dispatch(action);
                } else {
                    should_draw = false;
                }
            }
            Event::Tick => app.on_tick(),
            Event::Resize => {}
            Event::RunFinished(report) => app.on_run_finished(*report),
        }
        if should_draw {
            terminal.draw(|frame| ui::draw(frame, &app))?;
        }
    }

    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    apply_overrides(&mut config.monitor, cli);
    config
}

fn apply_overrides(monitor: &mut config::MonitorConfig, cli: &Cli) {
    if let Some(duration) = cli.duration {
        monitor.duration_secs = duration;
    }
    if let Some(interval) = cli.interval {
        monitor.interval_secs = interval;
    }
    if let Some(top_n) = cli.top_n {
        monitor.top_n = top_n;
    }
    if let Some(mode) = cli.mode {
        monitor.mode = AccountingMode::from(mode).label().to_string();
    }
}
