use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;

use super::aggregator::Aggregator;
use super::source::{ProcessSource, Tick, sample};
use super::types::{AccountingMode, RankedSummary};

/// Lower bound for the sampling interval. Anything smaller is clamped up to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("monitoring duration must be a positive number of seconds, got {0}")]
    InvalidDuration(f64),
    #[error("sampling interval must be a finite number of seconds, got {0}")]
    InvalidInterval(f64),
    #[error("top-N must be at least 1")]
    InvalidTopN,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("monitoring already in progress")]
    AlreadyRunning,
    #[error("no tokio runtime available to run the sampling loop")]
    NoRuntime,
}

/// Run parameters as entered by the user, before validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSettings {
    pub duration_secs: f64,
    pub interval_secs: f64,
    pub top_n: usize,
    pub mode: AccountingMode,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            duration_secs: 120.0,
            interval_secs: 1.0,
            top_n: 15,
            mode: AccountingMode::Delta,
        }
    }
}

impl RunSettings {
    pub fn new(duration_secs: f64, interval_secs: f64, top_n: usize) -> Self {
        Self {
            duration_secs,
            interval_secs,
            top_n,
            mode: AccountingMode::Delta,
        }
    }

    pub fn with_mode(mut self, mode: AccountingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validate(&self) -> Result<ValidSettings, ConfigError> {
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return Err(ConfigError::InvalidDuration(self.duration_secs));
        }
        let duration = Duration::try_from_secs_f64(self.duration_secs)
            .map_err(|_| ConfigError::InvalidDuration(self.duration_secs))?;

        let top_n = NonZeroUsize::new(self.top_n).ok_or(ConfigError::InvalidTopN)?;

        if !self.interval_secs.is_finite() {
            return Err(ConfigError::InvalidInterval(self.interval_secs));
        }
        let interval = if self.interval_secs < MIN_INTERVAL.as_secs_f64() {
            tracing::warn!(
                requested = self.interval_secs,
                floor = MIN_INTERVAL.as_secs_f64(),
                "sampling interval below floor, clamping"
            );
            MIN_INTERVAL
        } else {
            Duration::try_from_secs_f64(self.interval_secs)
                .map_err(|_| ConfigError::InvalidInterval(self.interval_secs))?
        };

        Ok(ValidSettings {
            duration,
            interval,
            top_n,
            mode: self.mode,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidSettings {
    pub duration: Duration,
    pub interval: Duration,
    pub top_n: NonZeroUsize,
    pub mode: AccountingMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The monitoring window elapsed.
    Completed,
    /// `stop()` was requested before the window elapsed.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Completed,
    Stopped,
}

impl RunState {
    pub fn label(self) -> &'static str {
        match self {
            RunState::Idle => "Idle",
            RunState::Running => "Running",
            RunState::Completed => "Completed",
            RunState::Stopped => "Stopped",
        }
    }
}

impl From<RunOutcome> for RunState {
    fn from(outcome: RunOutcome) -> Self {
        match outcome {
            RunOutcome::Completed => RunState::Completed,
            RunOutcome::Stopped => RunState::Stopped,
        }
    }
}

/// What a finished run hands to its sink.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub summary: RankedSummary,
    pub outcome: RunOutcome,
    pub elapsed: Duration,
    pub settings: ValidSettings,
}

#[derive(Debug, Default)]
struct Shared {
    state: RunState,
    stop_tx: Option<watch::Sender<bool>>,
    run_id: u64,
}

type LiveSender = watch::Sender<Option<Arc<RankedSummary>>>;

/// Owns the lifecycle of monitoring runs: `Idle -> Running -> Completed | Stopped`.
///
/// At most one run is active per controller. The sampling loop runs on its own
/// tokio task and is the only writer of aggregation state; callers poll
/// [`RunController::latest`] for immutable partial rankings and receive the
/// final [`RunReport`] through the sink given to [`RunController::start`].
pub struct RunController<S> {
    source: Arc<Mutex<S>>,
    shared: Arc<Mutex<Shared>>,
    live: Arc<LiveSender>,
}

impl<S> RunController<S>
where
    S: ProcessSource + Send + 'static,
{
    pub fn new(source: S) -> Self {
        let (live, _) = watch::channel(None);
        Self {
            source: Arc::new(Mutex::new(source)),
            shared: Arc::new(Mutex::new(Shared::default())),
            live: Arc::new(live),
        }
    }

    pub fn state(&self) -> RunState {
        lock(&self.shared).state
    }

    pub fn is_running(&self) -> bool {
        self.state() == RunState::Running
    }

    /// Most recent ranking published by the sampling loop: partial while a run is
    /// in progress, final once it has ended.
    pub fn latest(&self) -> Option<Arc<RankedSummary>> {
        self.live.borrow().clone()
    }

    /// Validate `settings` and spawn the sampling loop on the current tokio
    /// runtime. `sink` is called exactly once, after the final ranking is built.
    ///
    /// Configuration and misuse errors are returned before anything is sampled
    /// and leave the controller untouched.
    pub fn start<F>(&self, settings: RunSettings, sink: F) -> Result<(), ControllerError>
    where
        F: FnOnce(RunReport) + Send + 'static,
    {
        let settings = settings.validate()?;
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ControllerError::NoRuntime)?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let run_id = {
            let mut shared = lock(&self.shared);
            if shared.state == RunState::Running {
                return Err(ControllerError::AlreadyRunning);
            }
            shared.state = RunState::Running;
            shared.stop_tx = Some(stop_tx);
            shared.run_id += 1;
            shared.run_id
        };
        self.live.send_replace(None);

        tracing::info!(
            run_id,
            duration_secs = settings.duration.as_secs_f64(),
            interval_secs = settings.interval.as_secs_f64(),
            top_n = settings.top_n.get(),
            mode = settings.mode.label(),
            "starting monitoring run"
        );

        let run = SamplingRun {
            source: Arc::clone(&self.source),
            shared: Arc::clone(&self.shared),
            live: Arc::clone(&self.live),
            settings,
            run_id,
        };
        runtime.spawn(run.execute(stop_rx, sink));
        Ok(())
    }

    /// Ask the running loop to finish at its next tick boundary. No-op when idle.
    pub fn stop(&self) {
        let shared = lock(&self.shared);
        if shared.state != RunState::Running {
            return;
        }
        if let Some(stop_tx) = &shared.stop_tx {
            tracing::info!(run_id = shared.run_id, "stop requested");
            stop_tx.send_replace(true);
        }
    }
}

struct SamplingRun<S> {
    source: Arc<Mutex<S>>,
    shared: Arc<Mutex<Shared>>,
    live: Arc<LiveSender>,
    settings: ValidSettings,
    run_id: u64,
}

impl<S> SamplingRun<S>
where
    S: ProcessSource + Send + 'static,
{
    async fn execute<F>(self, mut stop_rx: watch::Receiver<bool>, sink: F)
    where
        F: FnOnce(RunReport) + Send + 'static,
    {
        let settings = self.settings;
        let started = Instant::now();
        let deadline = started + settings.duration;
        let mut aggregator = Aggregator::new(settings.mode);

        let outcome = loop {
            if *stop_rx.borrow() {
                break RunOutcome::Stopped;
            }
            let tick_started = Instant::now();
            if tick_started >= deadline {
                break RunOutcome::Completed;
            }

            let tick = self.sample_blocking().await;
            tracing::debug!(
                run_id = self.run_id,
                readings = tick.readings.len(),
                gone = tick.gone,
                denied = tick.denied,
                unsupported = tick.unsupported,
                "tick sampled"
            );
            aggregator.observe(tick.readings);
            tracing::trace!(run_id = self.run_id, tracked = aggregator.tracked(), "tick folded");

            let partial = RankedSummary {
                partial: true,
                ..aggregator.finalize(settings.top_n)
            };
            self.live.send_replace(Some(Arc::new(partial)));

            let wake = (tick_started + settings.interval).min(deadline);
            tokio::select! {
                _ = tokio::time::sleep_until(wake) => {}
                changed = stop_rx.changed() => {
                    if changed.is_err() {
                        break RunOutcome::Stopped;
                    }
                }
            }
        };

        let summary = aggregator.finalize(settings.top_n);
        self.live.send_replace(Some(Arc::new(summary.clone())));

        {
            let mut shared = lock(&self.shared);
            if shared.run_id == self.run_id {
                shared.state = outcome.into();
                shared.stop_tx = None;
            }
        }

        let elapsed = started.elapsed();
        tracing::info!(
            run_id = self.run_id,
            ?outcome,
            samples = summary.samples,
            ranked = summary.rows.len(),
            elapsed_secs = elapsed.as_secs_f64(),
            "monitoring run finished"
        );

        sink(RunReport {
            summary,
            outcome,
            elapsed,
            settings,
        });
    }
}

impl<S> SamplingRun<S>
where
    S: ProcessSource + Send + 'static,
{
    /// Enumeration and counter reads are blocking syscalls; keep them off the
    /// runtime thread that also drives the terminal surface.
    async fn sample_blocking(&self) -> Tick {
        let source = Arc::clone(&self.source);
        let sampled = tokio::task::spawn_blocking(move || {
            let mut source = lock(&source);
            sample(&mut *source)
        })
        .await;

        sampled.unwrap_or_else(|err| {
            tracing::error!(run_id = self.run_id, error = %err, "sampling task failed, tick skipped");
            Tick::default()
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
