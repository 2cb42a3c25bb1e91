use std::fmt::Write;

use crate::format::{fit_width, format_mb, format_secs};
use crate::monitor::{AccountingMode, RunOutcome, RunReport};

const NAME_WIDTH: usize = 30;
const RULE_WIDTH: usize = 78;

/// Plain-text ranking for console output.
pub fn render_table(report: &RunReport) -> String {
    let mut out = String::new();
    let summary = &report.summary;

    let _ = writeln!(
        out,
        "{:>7}  {} {:>12} {:>12} {:>12}",
        "PID",
        fit_width("Process", NAME_WIDTH),
        "Read (MB)",
        "Write (MB)",
        "Total (MB)"
    );
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));

    if summary.is_empty() {
        let _ = writeln!(out, "No disk I/O recorded.");
    }
    for row in &summary.rows {
        let _ = writeln!(
            out,
            "{:>7}  {} {:>12} {:>12} {:>12}",
            row.identity.pid,
            fit_width(&row.identity.name, NAME_WIDTH),
            format_mb(row.read_mb()),
            format_mb(row.write_mb()),
            format_mb(row.total_mb())
        );
    }

    let _ = writeln!(out);
    let duration = format_secs(report.settings.duration);
    match report.outcome {
        RunOutcome::Completed => {
            let _ = writeln!(
                out,
                "Monitored for {duration} seconds ({} samples)",
                summary.samples
            );
        }
        RunOutcome::Stopped => {
            let _ = writeln!(
                out,
                "Stopped after {} of {duration} seconds ({} samples)",
                format_secs(report.elapsed),
                summary.samples
            );
        }
    }
    if summary.mode == AccountingMode::Cumulative {
        let _ = writeln!(
            out,
            "Totals are raw cumulative counters summed per sample and overstate long-lived processes."
        );
    }

    out
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;
    use std::time::Duration;

    use super::*;
    use crate::monitor::{ProcessIdentity, RankedSummary, SummaryRow, ValidSettings};

    const MB: u64 = 1024 * 1024;

    fn report(rows: Vec<SummaryRow>, outcome: RunOutcome, mode: AccountingMode) -> RunReport {
        RunReport {
            summary: RankedSummary {
                observed: rows.len(),
                rows,
                samples: 3,
                mode,
                partial: false,
            },
            outcome,
            elapsed: Duration::from_millis(2500),
            settings: ValidSettings {
                duration: Duration::from_secs(60),
                interval: Duration::from_secs(1),
                top_n: NonZeroUsize::new(15).unwrap(),
                mode,
            },
        }
    }

    fn row(pid: u32, name: &str, read: u64, write: u64) -> SummaryRow {
        SummaryRow {
            identity: ProcessIdentity::new(pid, name),
            read_bytes: read,
            write_bytes: write,
            total_bytes: read + write,
        }
    }

    #[test]
    fn table_for_stopped_run() {
        let rendered = render_table(&report(
            vec![
                row(4242, "postgres", 10 * MB, 5 * MB),
                row(17, "kworker/u16:2-events_unbound_flush", 0, 3 * MB / 2),
            ],
            RunOutcome::Stopped,
            AccountingMode::Delta,
        ));

        insta::assert_snapshot!(rendered.trim_end(), @r"
    PID  Process                           Read (MB)   Write (MB)   Total (MB)
==============================================================================
   4242  postgres                              10.00         5.00        15.00
     17  kworker/u16:2-events_unbound_…         0.00         1.50         1.50

Stopped after 2.5 of 60 seconds (3 samples)
");
    }

    #[test]
    fn completed_run_footer_uses_window_length() {
        let rendered = render_table(&report(
            vec![row(1, "dd", MB, 0)],
            RunOutcome::Completed,
            AccountingMode::Delta,
        ));
        assert!(rendered.ends_with("Monitored for 60 seconds (3 samples)\n"));
    }

    #[test]
    fn empty_summary_says_so() {
        let rendered = render_table(&report(
            Vec::new(),
            RunOutcome::Completed,
            AccountingMode::Delta,
        ));
        assert!(rendered.contains("No disk I/O recorded."));
    }

    #[test]
    fn cumulative_mode_is_flagged() {
        let rendered = render_table(&report(
            vec![row(1, "dd", MB, 0)],
            RunOutcome::Completed,
            AccountingMode::Cumulative,
        ));
        assert!(rendered.contains("raw cumulative counters"));
    }
}
