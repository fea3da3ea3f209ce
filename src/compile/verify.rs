use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, instrument, warn};

use super::{
    combine::CombinedUnits,
    log::{group_thousands, ProcessingLog, RULE_WIDTH},
    CompileError,
};
use crate::table::Table;

/// Outcome of reconciling source rows against the master table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Verification {
    Passed,
    Failed { mismatch: usize },
}

impl Verification {
    pub fn check(source_rows: usize, final_rows: usize) -> Self {
        if source_rows == final_rows {
            Verification::Passed
        } else {
            Verification::Failed {
                mismatch: source_rows.abs_diff(final_rows),
            }
        }
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Verification::Passed)
    }
}

impl fmt::Display for Verification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verification::Passed => {
                write!(f, "✅ VERIFICATION PASSED: The row counts match perfectly.")
            }
            Verification::Failed { mismatch } => write!(
                f,
                "❌ VERIFICATION FAILED: Mismatch of {} rows detected.",
                group_thousands(*mismatch)
            ),
        }
    }
}

/// Counters reported at the end of a run that produced a master table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub success_count: usize,
    pub skipped_count: usize,
    pub source_rows: usize,
    pub final_rows: usize,
    pub verification: Verification,
}

impl RunSummary {
    /// The delimited block appended to the processing log.
    pub fn log_lines(&self) -> Vec<String> {
        let heavy = "=".repeat(RULE_WIDTH);
        let light = "-".repeat(RULE_WIDTH);
        vec![
            String::new(),
            heavy.clone(),
            "          PROCESS COMPLETE: SUMMARY".to_string(),
            heavy.clone(),
            format!(
                "Total base names processed successfully: {}",
                self.success_count
            ),
            format!(
                "Total base names skipped or failed:    {}",
                self.skipped_count
            ),
            light.clone(),
            "Data Integrity Verification:".to_string(),
            format!(
                "  - Sum of rows from all source files:  {}",
                group_thousands(self.source_rows)
            ),
            format!(
                "  - Total rows in the final master file:  {}",
                group_thousands(self.final_rows)
            ),
            light,
            self.verification.to_string(),
            heavy,
        ]
    }
}

/// Concatenate the per-unit tables into the master table and reconcile row
/// counts.
///
/// `Ok(None)` means no unit succeeded, which is a normal outcome. The summary
/// block is appended to `log` only when a master table is produced.
#[instrument(level = "info", skip_all, fields(units = units.tables.len()))]
pub fn aggregate(
    units: CombinedUnits,
    log: &mut ProcessingLog,
) -> Result<Option<(Table, RunSummary)>, CompileError> {
    if units.tables.is_empty() {
        log.push("No data was successfully processed, so no master file was created.");
        return Ok(None);
    }

    let rows: usize = units.tables.iter().map(Table::num_rows).sum();
    let master = Table::concat(&units.tables)
        .map_err(|source| CompileError::Aggregation { rows, source })?;

    let final_rows = master.num_rows();
    let verification = Verification::check(units.source_rows, final_rows);
    let summary = RunSummary {
        success_count: units.success_count,
        skipped_count: units.skipped_count,
        source_rows: units.source_rows,
        final_rows,
        verification,
    };

    if verification.is_passed() {
        info!(final_rows, "verification passed");
    } else {
        warn!(
            source_rows = units.source_rows,
            final_rows, "verification failed"
        );
    }

    log.extend(summary.log_lines());
    Ok(Some((master, summary)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::read_csv_bytes;
    use anyhow::Result;

    #[test]
    fn check_reports_absolute_difference() {
        assert_eq!(Verification::check(6, 6), Verification::Passed);
        assert_eq!(
            Verification::check(10, 7),
            Verification::Failed { mismatch: 3 }
        );
        assert_eq!(
            Verification::check(7, 10),
            Verification::Failed { mismatch: 3 }
        );
    }

    #[test]
    fn failed_verdict_line_names_magnitude() {
        let line = Verification::Failed { mismatch: 1200 }.to_string();
        assert!(line.contains("VERIFICATION FAILED"));
        assert!(line.contains("1,200 rows"));
    }

    #[test]
    fn no_tables_means_no_master() -> Result<()> {
        let mut log = ProcessingLog::new();
        let out = aggregate(CombinedUnits::default(), &mut log)?;
        assert!(out.is_none());
        assert!(log.contains("No data was successfully processed"));
        assert!(!log.contains("SUMMARY"));
        Ok(())
    }

    #[test]
    fn mismatched_counter_fails_verification() -> Result<()> {
        let units = CombinedUnits {
            tables: vec![read_csv_bytes(b"a\n1\n2\n")?],
            success_count: 1,
            skipped_count: 0,
            source_rows: 5,
        };
        let mut log = ProcessingLog::new();
        let (_, summary) = aggregate(units, &mut log)?.expect("master table");
        assert_eq!(summary.final_rows, 2);
        assert_eq!(summary.verification, Verification::Failed { mismatch: 3 });
        assert!(log.contains("Mismatch of 3 rows"));
        Ok(())
    }

    #[test]
    fn summary_block_layout() {
        let summary = RunSummary {
            success_count: 2,
            skipped_count: 1,
            source_rows: 1_500,
            final_rows: 1_500,
            verification: Verification::Passed,
        };
        let lines = summary.log_lines();
        assert_eq!(lines[1], "=".repeat(RULE_WIDTH));
        assert!(lines.iter().any(|l| l.ends_with("successfully: 2")));
        assert!(lines.iter().any(|l| l.ends_with("source files:  1,500")));
        assert_eq!(lines.last().map(String::as_str), Some("=".repeat(RULE_WIDTH).as_str()));
    }

    #[test]
    fn summary_serializes_verdict() -> Result<()> {
        let summary = RunSummary {
            success_count: 1,
            skipped_count: 0,
            source_rows: 3,
            final_rows: 2,
            verification: Verification::Failed { mismatch: 1 },
        };
        let json = serde_json::to_value(&summary)?;
        assert_eq!(json["verification"]["status"], "failed");
        assert_eq!(json["verification"]["mismatch"], 1);
        let back: RunSummary = serde_json::from_value(json)?;
        assert_eq!(back, summary);
        Ok(())
    }
}
