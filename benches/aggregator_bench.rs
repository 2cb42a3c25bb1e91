use std::hint::black_box;
use std::num::NonZeroUsize;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use disktop::monitor::{
    AccountingMode, Aggregator, CounterSnapshot, LiveProcess, RankedSummary, Reading, RunState,
    SummaryRow,
};
use disktop::ui::table;
use disktop::ui::theme::{BorderStyle, Theme};
use ratatui::Terminal;
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;

const TOP_N: NonZeroUsize = NonZeroUsize::new(15).unwrap();

fn make_tick(n: usize, step: u64) -> Vec<Reading> {
    (0..n)
        .map(|i| {
            let pid = i as u32 + 1;
            let rate = (i as u64 % 97) + 1;
            (
                LiveProcess::new(pid, format!("proc_{i}")).with_start_time(1_000 + i as u64),
                CounterSnapshot::new(rate * step * 4096, rate * step * 8192),
            )
        })
        .collect()
}

fn warmed_aggregator(n: usize, ticks: u64) -> Aggregator {
    let mut agg = Aggregator::new(AccountingMode::Delta);
    for step in 0..ticks {
        agg.observe(make_tick(n, step));
    }
    agg
}

fn bench_observe(c: &mut Criterion) {
    let mut group = c.benchmark_group("observe_500_1000_2000");

    for size in [500usize, 1000, 2000] {
        let tick = make_tick(size, 10);
        group.bench_with_input(BenchmarkId::from_parameter(size), &tick, |b, tick| {
            let mut agg = warmed_aggregator(size, 2);
            b.iter(|| {
                agg.observe(black_box(tick.clone()));
            })
        });
    }

    group.finish();
}

fn bench_finalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("finalize_500_1000_2000");

    for size in [500usize, 1000, 2000] {
        let agg = warmed_aggregator(size, 5);
        group.bench_with_input(BenchmarkId::from_parameter(size), &agg, |b, agg| {
            b.iter(|| {
                let summary = agg.finalize(black_box(TOP_N));
                black_box(summary);
            })
        });
    }

    group.finish();
}

fn bench_table_render(c: &mut Criterion) {
    let theme = Theme::dark();
    let summary: RankedSummary = warmed_aggregator(2000, 5).finalize(TOP_N);
    let rows: Vec<SummaryRow> = summary.rows;

    c.bench_function("table_render_top_15", |b| {
        b.iter(|| {
            let backend = TestBackend::new(160, 50);
            let mut terminal = Terminal::new(backend).expect("bench terminal init failed");
            terminal
                .draw(|frame| {
                    table::render(
                        frame,
                        Rect::new(0, 0, 160, 50),
                        black_box(&rows),
                        RunState::Completed,
                        "s",
                        &theme,
                        BorderStyle::Rounded,
                    );
                })
                .expect("bench draw failed");
            black_box(terminal.backend());
        })
    });
}

criterion_group!(benches, bench_observe, bench_finalize, bench_table_render);
criterion_main!(benches);
