//! Sampling and aggregation engine.
//!
//! [`aggregator`] turns repeated cumulative counter snapshots into per-process
//! totals and ranks them; [`controller`] drives it on a background task for a
//! bounded window. OS access goes through the [`source::ProcessSource`] trait so
//! nothing here depends on the platform or on a presentation layer.

pub mod aggregator;
pub mod controller;
pub mod source;
pub mod types;

pub use aggregator::Aggregator;
pub use controller::{
    ConfigError, ControllerError, MIN_INTERVAL, RunController, RunOutcome, RunReport, RunSettings,
    RunState, ValidSettings,
};
pub use source::{CounterReadError, ProcessSource, Tick, sample};
pub use types::{
    AccountingMode, CounterSnapshot, DeltaRecord, LiveProcess, ProcessIdentity, RankedSummary,
    Reading, SummaryRow,
};
