use std::collections::HashMap;
use std::num::NonZeroUsize;

use super::types::{
    AccountingMode, CounterSnapshot, DeltaRecord, ProcessIdentity, RankedSummary, Reading,
    SummaryRow,
};

#[derive(Debug, Clone, Copy)]
struct Baseline {
    start_time: Option<u64>,
    counters: CounterSnapshot,
}

impl Baseline {
    /// A differing start time means the pid now belongs to another process.
    /// Without start times on both sides the pid is trusted.
    fn same_process(&self, start_time: Option<u64>) -> bool {
        match (self.start_time, start_time) {
            (Some(prev), Some(cur)) => prev == cur,
            _ => true,
        }
    }
}

/// Folds per-tick counter readings into per-process totals.
///
/// Owned by exactly one sampling loop; nothing else mutates it. Other tasks only
/// ever see the [`RankedSummary`] values produced by [`Aggregator::finalize`].
#[derive(Debug)]
pub struct Aggregator {
    mode: AccountingMode,
    baselines: HashMap<u32, Baseline>,
    records: HashMap<ProcessIdentity, DeltaRecord>,
    samples: u64,
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new(AccountingMode::default())
    }
}

impl Aggregator {
    pub fn new(mode: AccountingMode) -> Self {
        Self {
            mode,
            baselines: HashMap::new(),
            records: HashMap::new(),
            samples: 0,
        }
    }

    /// Ticks observed so far.
    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// Identities that have an accumulated record.
    pub fn tracked(&self) -> usize {
        self.records.len()
    }

    /// Fold one tick of readings. Processes missing from `readings` keep their
    /// history and simply stop accumulating.
    pub fn observe<I>(&mut self, readings: I)
    where
        I: IntoIterator<Item = Reading>,
    {
        self.samples += 1;
        for (process, counters) in readings {
            match self.mode {
                AccountingMode::Delta => {
                    self.observe_delta(process.identity, process.start_time, counters)
                }
                AccountingMode::Cumulative => {
                    self.records
                        .entry(process.identity)
                        .or_default()
                        .add(counters.read_bytes, counters.write_bytes);
                }
            }
        }
    }

    fn observe_delta(
        &mut self,
        identity: ProcessIdentity,
        start_time: Option<u64>,
        counters: CounterSnapshot,
    ) {
        let current = Baseline {
            start_time,
            counters,
        };

        let Some(prior) = self.baselines.get_mut(&identity.pid) else {
            // First sighting only establishes the baseline.
            self.baselines.insert(identity.pid, current);
            return;
        };

        if !prior.same_process(start_time) {
            tracing::debug!(pid = identity.pid, name = %identity.name, "pid reused, re-baselining");
            *prior = current;
            return;
        }

        // Counters can go backwards on reset; clamp instead of going negative.
        let delta_read = counters
            .read_bytes
            .saturating_sub(prior.counters.read_bytes);
        let delta_write = counters
            .write_bytes
            .saturating_sub(prior.counters.write_bytes);
        *prior = current;

        self.records
            .entry(identity)
            .or_default()
            .add(delta_read, delta_write);
    }

    /// Rank everything accumulated so far and keep the top `top_n` rows.
    ///
    /// Does not consume or modify state, so it may be called mid-run for a
    /// partial ranking and repeated calls without new ticks return equal results.
    pub fn finalize(&self, top_n: NonZeroUsize) -> RankedSummary {
        let mut rows: Vec<SummaryRow> = self
            .records
            .iter()
            .map(|(identity, record)| SummaryRow {
                identity: identity.clone(),
                read_bytes: record.read_bytes,
                write_bytes: record.write_bytes,
                total_bytes: record.total(),
            })
            .collect();

        rows.sort_by(|a, b| {
            b.total_bytes
                .cmp(&a.total_bytes)
                .then_with(|| a.identity.cmp(&b.identity))
        });
        rows.truncate(top_n.get());

        RankedSummary {
            rows,
            samples: self.samples,
            observed: self.records.len(),
            mode: self.mode,
            partial: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::types::LiveProcess;

    fn top(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn reading(pid: u32, name: &str, read: u64, write: u64) -> Reading {
        (LiveProcess::new(pid, name), CounterSnapshot::new(read, write))
    }

    fn row_for<'a>(summary: &'a RankedSummary, pid: u32) -> Option<&'a SummaryRow> {
        summary.rows.iter().find(|r| r.identity.pid == pid)
    }

    #[test]
    fn worked_example_clamps_counter_regression() {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        agg.observe([reading(100, "a", 100, 50)]);
        agg.observe([reading(100, "a", 150, 80)]);
        agg.observe([reading(100, "a", 140, 90)]);

        let summary = agg.finalize(top(10));
        let row = row_for(&summary, 100).unwrap();
        assert_eq!(row.read_bytes, 50);
        assert_eq!(row.write_bytes, 40);
        assert_eq!(row.total_bytes, 90);
        assert_eq!(summary.samples, 3);
    }

    #[test]
    fn first_sighting_is_baseline_only() {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        agg.observe([reading(1, "big", 10_000_000, 5_000_000)]);

        let summary = agg.finalize(top(5));
        assert!(summary.is_empty());
        assert_eq!(summary.observed, 0);
        assert_eq!(summary.samples, 1);
    }

    #[test]
    fn idle_process_with_two_samples_is_listed_with_zero() {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        agg.observe([reading(1, "idle", 7, 7)]);
        agg.observe([reading(1, "idle", 7, 7)]);

        let summary = agg.finalize(top(5));
        assert_eq!(summary.rows.len(), 1);
        assert_eq!(summary.rows[0].total_bytes, 0);
    }

    #[test]
    fn absent_process_keeps_its_history() {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        agg.observe([reading(1, "a", 0, 0), reading(2, "b", 0, 0)]);
        agg.observe([reading(1, "a", 10, 0), reading(2, "b", 0, 20)]);
        agg.observe([reading(2, "b", 0, 25)]);
        agg.observe([reading(2, "b", 0, 30)]);

        let summary = agg.finalize(top(5));
        assert_eq!(row_for(&summary, 1).unwrap().total_bytes, 10);
        assert_eq!(row_for(&summary, 2).unwrap().total_bytes, 30);
    }

    #[test]
    fn returning_process_deltas_against_last_seen_snapshot() {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        agg.observe([reading(9, "flaky", 100, 0)]);
        agg.observe(Vec::<Reading>::new());
        agg.observe([reading(9, "flaky", 160, 0)]);

        let summary = agg.finalize(top(5));
        assert_eq!(row_for(&summary, 9).unwrap().read_bytes, 60);
    }

    #[test]
    fn ranking_orders_by_total_then_pid() {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        agg.observe([
            reading(30, "c", 0, 0),
            reading(10, "a", 0, 0),
            reading(20, "b", 0, 0),
            reading(40, "d", 0, 0),
        ]);
        agg.observe([
            reading(30, "c", 500, 0),
            reading(10, "a", 250, 250),
            reading(20, "b", 0, 900),
            reading(40, "d", 1, 0),
        ]);

        let summary = agg.finalize(top(10));
        let pids: Vec<u32> = summary.rows.iter().map(|r| r.identity.pid).collect();
        assert_eq!(pids, vec![20, 10, 30, 40]);
    }

    #[test]
    fn finalize_truncates_to_top_n() {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        let first: Vec<Reading> = (1..=8).map(|pid| reading(pid, "p", 0, 0)).collect();
        let second: Vec<Reading> = (1..=8)
            .map(|pid| reading(pid, "p", u64::from(pid) * 10, 0))
            .collect();
        agg.observe(first);
        agg.observe(second);

        let summary = agg.finalize(top(3));
        assert_eq!(summary.rows.len(), 3);
        assert_eq!(summary.observed, 8);
        assert_eq!(summary.rows[0].identity.pid, 8);
    }

    #[test]
    fn finalize_is_repeatable_and_mid_run_safe() {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        agg.observe([reading(1, "a", 0, 0)]);
        agg.observe([reading(1, "a", 5, 5)]);

        let first = agg.finalize(top(3));
        let second = agg.finalize(top(3));
        assert_eq!(first, second);

        agg.observe([reading(1, "a", 10, 10)]);
        let third = agg.finalize(top(3));
        assert_eq!(third.rows[0].total_bytes, 20);
    }

    #[test]
    fn reused_pid_with_new_start_time_is_rebaselined() {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        let old = LiveProcess::new(77, "worker").with_start_time(1_000);
        let new = LiveProcess::new(77, "worker").with_start_time(2_000);

        agg.observe([(old.clone(), CounterSnapshot::new(0, 0))]);
        agg.observe([(old, CounterSnapshot::new(0, 100))]);
        // New process with the same pid starts with a large lifetime counter.
        agg.observe([(new.clone(), CounterSnapshot::new(0, 1_000_000))]);
        agg.observe([(new, CounterSnapshot::new(0, 1_000_050))]);

        let summary = agg.finalize(top(3));
        assert_eq!(row_for(&summary, 77).unwrap().write_bytes, 150);
    }

    #[test]
    fn renamed_pid_gets_a_separate_row() {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        agg.observe([reading(5, "sh", 0, 0)]);
        agg.observe([reading(5, "sh", 10, 0)]);
        agg.observe([reading(5, "cargo", 30, 0)]);

        let summary = agg.finalize(top(5));
        assert_eq!(summary.rows.len(), 2);
        assert_eq!(summary.rows[0].identity.name, "cargo");
        assert_eq!(summary.rows[0].read_bytes, 20);
        assert_eq!(summary.rows[1].read_bytes, 10);
    }

    #[test]
    fn cumulative_mode_sums_raw_counters() {
        let mut agg = Aggregator::new(AccountingMode::Cumulative);
        agg.observe([reading(1, "a", 100, 50)]);
        agg.observe([reading(1, "a", 150, 80)]);

        let summary = agg.finalize(top(5));
        assert_eq!(summary.mode, AccountingMode::Cumulative);
        let row = row_for(&summary, 1).unwrap();
        assert_eq!(row.read_bytes, 250);
        assert_eq!(row.write_bytes, 130);
    }
}
