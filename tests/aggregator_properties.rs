use std::collections::HashMap;
use std::num::NonZeroUsize;

use disktop::monitor::{AccountingMode, Aggregator, CounterSnapshot, LiveProcess, Reading};
use proptest::prelude::*;

fn top(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

/// One tick per inner vec; each entry is (pid, read, write) for a process
/// named after its pid.
fn ticks_strategy() -> impl Strategy<Value = Vec<Vec<(u32, u64, u64)>>> {
    prop::collection::vec(
        prop::collection::vec((1u32..20, 0u64..1_000_000, 0u64..1_000_000), 0..12),
        1..10,
    )
}

fn readings(tick: &[(u32, u64, u64)]) -> Vec<Reading> {
    tick.iter()
        .map(|&(pid, read, write)| {
            (
                LiveProcess::new(pid, format!("p{pid}")),
                CounterSnapshot::new(read, write),
            )
        })
        .collect()
}

proptest! {
    #[test]
    fn ranking_is_sorted_and_bounded(
        ticks in ticks_strategy(),
        top_n in 1usize..8,
    ) {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        for tick in &ticks {
            agg.observe(readings(tick));
        }
        let summary = agg.finalize(top(top_n));

        // A pid earns a record once it has been seen twice, even within one tick.
        let mut sightings: HashMap<u32, usize> = HashMap::new();
        for &(pid, _, _) in ticks.iter().flatten() {
            *sightings.entry(pid).or_default() += 1;
        }
        let tracked = sightings.values().filter(|&&seen| seen >= 2).count();

        prop_assert_eq!(summary.observed, tracked);
        prop_assert_eq!(summary.rows.len(), top_n.min(summary.observed));
        prop_assert_eq!(summary.samples, ticks.len() as u64);
        for pair in summary.rows.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            prop_assert!(
                a.total_bytes > b.total_bytes
                    || (a.total_bytes == b.total_bytes && a.identity < b.identity)
            );
        }
        for row in &summary.rows {
            prop_assert_eq!(row.total_bytes, row.read_bytes + row.write_bytes);
        }
    }

    #[test]
    fn smaller_top_n_is_a_prefix(ticks in ticks_strategy(), k in 1usize..5) {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        for tick in &ticks {
            agg.observe(readings(tick));
        }
        let all = agg.finalize(top(64));
        let head = agg.finalize(top(k));
        let expected = &all.rows[..all.rows.len().min(k)];
        prop_assert_eq!(head.rows.as_slice(), expected);
    }

    #[test]
    fn totals_never_decrease_as_ticks_arrive(ticks in ticks_strategy()) {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        let mut previous = HashMap::new();
        for tick in &ticks {
            agg.observe(readings(tick));
            for row in agg.finalize(top(64)).rows {
                let before = previous.insert(row.identity.clone(), row.total_bytes).unwrap_or(0);
                prop_assert!(row.total_bytes >= before);
            }
        }
    }

    #[test]
    fn single_process_total_is_sum_of_positive_steps(
        counters in prop::collection::vec((0u64..10_000, 0u64..10_000), 1..20),
    ) {
        let mut agg = Aggregator::new(AccountingMode::Delta);
        for &(read, write) in &counters {
            agg.observe([(LiveProcess::new(7, "solo"), CounterSnapshot::new(read, write))]);
        }

        let expected_read: u64 = counters
            .windows(2)
            .map(|w| w[1].0.saturating_sub(w[0].0))
            .sum();
        let expected_write: u64 = counters
            .windows(2)
            .map(|w| w[1].1.saturating_sub(w[0].1))
            .sum();

        let summary = agg.finalize(top(1));
        if counters.len() == 1 {
            prop_assert!(summary.is_empty());
        } else {
            prop_assert_eq!(summary.rows[0].read_bytes, expected_read);
            prop_assert_eq!(summary.rows[0].write_bytes, expected_write);
        }
    }
}
