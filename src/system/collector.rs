use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System};

use super::platform;
use crate::monitor::{CounterReadError, CounterSnapshot, LiveProcess, ProcessSource};

/// [`ProcessSource`] backed by `sysinfo` for enumeration and the platform
/// readers for per-process counters.
pub struct Collector {
    sys: System,
}

impl Default for Collector {
    fn default() -> Self {
        Self::new()
    }
}

impl Collector {
    pub fn new() -> Self {
        Collector { sys: System::new() }
    }

    fn refresh(&mut self) {
        let _refresh_span = tracing::debug_span!("collector.refresh").entered();

        // Names and start times come with every refresh. Threads are skipped:
        // their /proc io file repeats the whole thread group's counters.
        self.sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().without_tasks(),
        );
    }
}

impl ProcessSource for Collector {
    fn list_live_processes(&mut self) -> Vec<LiveProcess> {
        self.refresh();

        let mut processes: Vec<LiveProcess> = self
            .sys
            .processes()
            .iter()
            .filter(|(_, process)| process.thread_kind().is_none())
            .map(|(pid, process)| {
                LiveProcess::new(pid.as_u32(), process.name().to_string_lossy())
                    .with_start_time(process.start_time())
            })
            .collect();
        processes.sort_unstable_by_key(LiveProcess::pid);
        processes
    }

    fn read_io_counters(&mut self, pid: u32) -> Result<CounterSnapshot, CounterReadError> {
        platform::process_io(pid)
    }
}
