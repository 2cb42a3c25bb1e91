use thiserror::Error;

use super::types::{CounterSnapshot, LiveProcess, Reading};

/// Why the counters of a single process could not be read this tick.
///
/// Every variant means "skip this process for this tick"; none of them is ever
/// surfaced past [`sample`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CounterReadError {
    #[error("process exited before its counters could be read")]
    ProcessGone,
    #[error("access to process counters denied")]
    AccessDenied,
    #[error("per-process I/O counters are not available on this platform")]
    Unsupported,
}

/// Process enumeration and counter reads, provided by the OS layer.
///
/// Implementations should keep `read_io_counters` bounded: a tick reads every
/// listed process in turn and has no per-process timeout of its own.
pub trait ProcessSource {
    /// Live processes at this instant. Processes that vanish between listing and
    /// reading are reported through [`CounterReadError::ProcessGone`].
    fn list_live_processes(&mut self) -> Vec<LiveProcess>;

    fn read_io_counters(&mut self, pid: u32) -> Result<CounterSnapshot, CounterReadError>;
}

impl<S: ProcessSource + ?Sized> ProcessSource for Box<S> {
    fn list_live_processes(&mut self) -> Vec<LiveProcess> {
        (**self).list_live_processes()
    }

    fn read_io_counters(&mut self, pid: u32) -> Result<CounterSnapshot, CounterReadError> {
        (**self).read_io_counters(pid)
    }
}

/// Readings gathered during one tick plus the per-kind skip counts.
#[derive(Debug, Default)]
pub struct Tick {
    pub readings: Vec<Reading>,
    pub gone: usize,
    pub denied: usize,
    pub unsupported: usize,
}

impl Tick {
    pub fn skipped(&self) -> usize {
        self.gone + self.denied + self.unsupported
    }
}

/// Enumerate once and read every listed process. Per-process failures are
/// counted and swallowed so one process can never abort the tick.
pub fn sample<S: ProcessSource + ?Sized>(source: &mut S) -> Tick {
    let processes = source.list_live_processes();
    let mut tick = Tick {
        readings: Vec::with_capacity(processes.len()),
        ..Tick::default()
    };

    for process in processes {
        match source.read_io_counters(process.pid()) {
            Ok(counters) => tick.readings.push((process, counters)),
            Err(err) => {
                tracing::trace!(pid = process.pid(), error = %err, "skipping process this tick");
                match err {
                    CounterReadError::ProcessGone => tick.gone += 1,
                    CounterReadError::AccessDenied => tick.denied += 1,
                    CounterReadError::Unsupported => tick.unsupported += 1,
                }
            }
        }
    }

    tick
}
