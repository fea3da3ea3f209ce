// src/compile/mod.rs
pub mod combine;
pub mod error;
pub mod extract;
pub mod log;
pub mod pairs;
pub mod verify;

#[cfg(test)]
pub(crate) mod testutil;

use std::io::{Read, Seek};
use std::time::Instant;
use tracing::{error, info, instrument};

pub use combine::{combine_pairs, CombinedUnits, SupplementalPolicy};
pub use error::CompileError;
pub use extract::{extract_archive, ExtractedArchive};
pub use log::ProcessingLog;
pub use pairs::{discover_pairs, FilePair, DETAIL_SUFFIX, SUPPLEMENTAL_SUFFIX};
pub use verify::{aggregate, RunSummary, Verification};

use crate::table::Table;

/// Result of one compilation run. The log is always present; `table` and
/// `summary` are `None` when nothing could be compiled.
#[derive(Debug)]
pub struct CompileOutcome {
    pub table: Option<Table>,
    pub summary: Option<RunSummary>,
    pub log: ProcessingLog,
}

impl CompileOutcome {
    fn without_table(log: ProcessingLog) -> Self {
        Self {
            table: None,
            summary: None,
            log,
        }
    }
}

/// Turns a zip of `*_e_detail.csv` / `*_e_sup.csv` files into one master table.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    policy: SupplementalPolicy,
}

impl Compiler {
    pub fn new(policy: SupplementalPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SupplementalPolicy {
        self.policy
    }

    /// Run every stage against `archive`: extract → group → combine →
    /// aggregate → verify. Scratch storage is gone by the time this returns.
    #[instrument(level = "info", skip_all, fields(policy = ?self.policy))]
    pub fn compile<R: Read + Seek>(&self, archive: R) -> CompileOutcome {
        let start = Instant::now();
        let mut log = ProcessingLog::new();

        log.push("✔️ Zip file received. Extracting contents...");
        let extracted = match extract_archive(archive) {
            Ok(x) => x,
            Err(e) => {
                error!("extraction failed: {}", e);
                log.push(format!(
                    "❌ ERROR: Could not extract zip file. Reason: {}",
                    e
                ));
                return CompileOutcome::without_table(log);
            }
        };
        log.push("✔️ Extraction complete.");

        log.section(1, "Finding and Grouping File Pairs");
        let pairs = match discover_pairs(extracted.root()) {
            Ok(p) => p,
            Err(e) => {
                error!("discovery failed: {}", e);
                log.push(format!("❌ ERROR: {}", e));
                return CompileOutcome::without_table(log);
            }
        };
        log.push(format!(
            "Grouping complete. Found {} unique base names to process.",
            pairs.len()
        ));

        log.section(2, "Processing Pairs for Final Compilation");
        if pairs.is_empty() {
            info!("no file pairs found");
            log.push("❌ No file pairs were found to process.");
            return CompileOutcome::without_table(log);
        }
        let units = combine_pairs(&pairs, self.policy, &mut log);

        log.section(3, "Compiling Final Output");
        let outcome = match aggregate(units, &mut log) {
            Ok(Some((table, summary))) => CompileOutcome {
                table: Some(table),
                summary: Some(summary),
                log,
            },
            Ok(None) => CompileOutcome::without_table(log),
            Err(e) => {
                error!("final compilation failed: {}", e);
                log.push(format!(
                    "❌ CRITICAL ERROR during final compilation: {}",
                    e
                ));
                CompileOutcome::without_table(log)
            }
        };

        drop(extracted);
        info!(elapsed = ?start.elapsed(), produced = outcome.table.is_some(), "compile finished");
        outcome
    }
}

/// Compile with the default policy.
pub fn compile_archive<R: Read + Seek>(archive: R) -> CompileOutcome {
    Compiler::default().compile(archive)
}
