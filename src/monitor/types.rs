use std::fmt;

use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Process key used for accounting. The pid is only unique among live processes at
/// one instant; see [`LiveProcess::start_time`] for how reuse is detected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProcessIdentity {
    pub pid: u32,
    pub name: String,
}

impl ProcessIdentity {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.is_empty() {
            placeholder_name(pid)
        } else {
            name
        };
        Self { pid, name }
    }
}

impl fmt::Display for ProcessIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.pid)
    }
}

pub fn placeholder_name(pid: u32) -> String {
    format!("pid:{pid}")
}

/// One entry of the live process list for a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveProcess {
    pub identity: ProcessIdentity,
    /// Start time in seconds since the epoch, when the platform reports it.
    pub start_time: Option<u64>,
}

impl LiveProcess {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            identity: ProcessIdentity::new(pid, name),
            start_time: None,
        }
    }

    pub fn with_start_time(mut self, start_time: u64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn pid(&self) -> u32 {
        self.identity.pid
    }
}

/// Cumulative lifetime counters reported by the OS at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

impl CounterSnapshot {
    pub fn new(read_bytes: u64, write_bytes: u64) -> Self {
        Self {
            read_bytes,
            write_bytes,
        }
    }
}

/// A process paired with the counters read for it during a tick.
pub type Reading = (LiveProcess, CounterSnapshot);

/// Bytes attributed to one identity over the run so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeltaRecord {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

impl DeltaRecord {
    pub fn add(&mut self, read_bytes: u64, write_bytes: u64) {
        self.read_bytes = self.read_bytes.saturating_add(read_bytes);
        self.write_bytes = self.write_bytes.saturating_add(write_bytes);
    }

    pub fn total(&self) -> u64 {
        self.read_bytes.saturating_add(self.write_bytes)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountingMode {
    /// Sum of per-tick deltas; only bytes moved inside the window are counted.
    #[default]
    Delta,
    /// Legacy mode: raw cumulative counters summed every tick. Overstates totals
    /// for long-lived processes and is only good for coarse ranking.
    Cumulative,
}

impl AccountingMode {
    pub fn label(self) -> &'static str {
        match self {
            AccountingMode::Delta => "delta",
            AccountingMode::Cumulative => "cumulative",
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            AccountingMode::Delta => AccountingMode::Cumulative,
            AccountingMode::Cumulative => AccountingMode::Delta,
        }
    }

    pub fn from_str_config(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "cumulative" | "legacy" => AccountingMode::Cumulative,
            _ => AccountingMode::Delta,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub identity: ProcessIdentity,
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub total_bytes: u64,
}

impl SummaryRow {
    pub fn read_mb(&self) -> f64 {
        self.read_bytes as f64 / BYTES_PER_MB
    }

    pub fn write_mb(&self) -> f64 {
        self.write_bytes as f64 / BYTES_PER_MB
    }

    pub fn total_mb(&self) -> f64 {
        self.total_bytes as f64 / BYTES_PER_MB
    }
}

/// Ranked top-N result. Immutable once produced; this is the only aggregation
/// artifact that leaves the sampling task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedSummary {
    /// Sorted by total bytes descending, then pid ascending, then name.
    pub rows: Vec<SummaryRow>,
    /// Ticks observed.
    pub samples: u64,
    /// Identities with an accumulated record, before truncation.
    pub observed: usize,
    pub mode: AccountingMode,
    /// Produced while the run was still sampling.
    pub partial: bool,
}

impl RankedSummary {
    pub fn empty(mode: AccountingMode) -> Self {
        Self {
            rows: Vec::new(),
            samples: 0,
            observed: 0,
            mode,
            partial: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total_bytes(&self) -> u64 {
        self.rows
            .iter()
            .fold(0u64, |acc, row| acc.saturating_add(row.total_bytes))
    }
}
