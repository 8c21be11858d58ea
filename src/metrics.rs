//! Timing metrics and CLI-friendly summaries for script and spec runs.
//!
//! Shared by the `jsrt` binary (`--timings`) and the benchmark suite.

use crate::harness::SpecReport;
use std::time::Duration;

/// Metrics collected while running a single script
#[derive(Debug, Clone)]
pub struct RunMetrics {
    pub source_bytes: usize,
    pub duration: Duration,
    pub output_lines: usize,
    pub raised: bool,
}

impl RunMetrics {
    /// Format metrics as a table for CLI output
    pub fn format_table(&self) -> String {
        let status = if self.raised { "threw" } else { "completed" };
        let mut output = String::new();
        output.push_str("  ┌────────────────────────┬──────────────┐\n");
        output.push_str("  │ Script                 │ Value        │\n");
        output.push_str("  ├────────────────────────┼──────────────┤\n");
        output.push_str(&format!(
            "  │ Source size            │ {:>9} B  │\n",
            self.source_bytes
        ));
        output.push_str(&format!(
            "  │ Printed lines          │ {:>12} │\n",
            self.output_lines
        ));
        output.push_str(&format!("  │ Status                 │ {:>12} │\n", status));
        output.push_str("  ├────────────────────────┼──────────────┤\n");
        output.push_str(&format!(
            "  │ Total                  │ {:>9.3} ms │\n",
            self.duration.as_secs_f64() * 1000.0
        ));
        output.push_str("  └────────────────────────┴──────────────┘\n");
        output
    }

    /// Source throughput in KB per second
    pub fn throughput_kb_per_sec(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.source_bytes as f64 / 1024.0 / secs
        } else {
            0.0
        }
    }
}

/// Metrics for one spec file run
#[derive(Debug, Clone)]
pub struct SpecMetrics {
    pub file: String,
    pub duration: Duration,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pending: usize,
}

impl SpecMetrics {
    pub fn new(file: impl Into<String>, report: &SpecReport, duration: Duration) -> Self {
        Self {
            file: file.into(),
            duration,
            total: report.total(),
            passed: report.passed(),
            failed: report.failed(),
            pending: report.pending(),
        }
    }

    /// Format as a one-line summary, e.g. `3 specs, 1 failure, 0 pending (1.2ms)`
    pub fn format_summary(&self) -> String {
        format!(
            "{} spec{}, {} failure{}, {} pending ({:.1}ms)",
            self.total,
            if self.total == 1 { "" } else { "s" },
            self.failed,
            if self.failed == 1 { "" } else { "s" },
            self.pending,
            self.duration.as_secs_f64() * 1000.0
        )
    }

    /// Format a table of per-file results for CLI output
    pub fn format_table(runs: &[SpecMetrics]) -> String {
        let mut output = String::new();
        output.push_str("  ┌──────────────────────────────┬────────┬────────┬─────────┬───────────┐\n");
        output.push_str("  │ Spec file                    │ Passed │ Failed │ Pending │ Duration  │\n");
        output.push_str("  ├──────────────────────────────┼────────┼────────┼─────────┼───────────┤\n");
        for run in runs {
            output.push_str(&format!(
                "  │ {:<28} │ {:>6} │ {:>6} │ {:>7} │ {:>6.1} ms │\n",
                truncate(&run.file, 28),
                run.passed,
                run.failed,
                run.pending,
                run.duration.as_secs_f64() * 1000.0
            ));
        }
        output.push_str("  └──────────────────────────────┴────────┴────────┴─────────┴───────────┘\n");
        output
    }
}

/// Keeps the tail of long paths, which is the part that names the file.
fn truncate(s: &str, width: usize) -> String {
    let count = s.chars().count();
    if count <= width {
        return s.to_string();
    }
    let tail: String = s.chars().skip(count - (width - 1)).collect();
    format!("…{}", tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_summary_pluralization() {
        let metrics = SpecMetrics {
            file: "errorHandlingSpec.js".to_string(),
            duration: Duration::from_millis(2),
            total: 1,
            passed: 0,
            failed: 1,
            pending: 0,
        };
        let summary = metrics.format_summary();
        assert!(summary.starts_with("1 spec, 1 failure, 0 pending"));
    }

    #[test]
    fn test_truncate_keeps_file_name() {
        assert_eq!(truncate("short.js", 28), "short.js");
        let long = "a/very/long/directory/structure/specs/errorHandlingSpec.js";
        let cut = truncate(long, 28);
        assert_eq!(cut.chars().count(), 28);
        assert!(cut.ends_with("errorHandlingSpec.js"));
    }

    #[test]
    fn test_throughput_zero_duration() {
        let metrics = RunMetrics {
            source_bytes: 2048,
            duration: Duration::ZERO,
            output_lines: 0,
            raised: false,
        };
        assert_eq!(metrics.throughput_kb_per_sec(), 0.0);
    }
}
