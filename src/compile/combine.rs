use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::Path};
use tracing::{debug, info, instrument, warn};

use super::{log::ProcessingLog, pairs::FilePair, CompileError};
use crate::table::{read_csv_path, Table};

/// What to do when a supplemental file is present and non-empty but cannot
/// be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplementalPolicy {
    /// Treat the whole unit as failed, exactly like a bad detail file.
    #[default]
    SkipUnit,
    /// Log a warning and keep the detail rows on their own.
    DetailOnly,
}

/// Per-unit tables in base-name order, plus the counters the verifier needs.
#[derive(Debug, Default)]
pub struct CombinedUnits {
    pub tables: Vec<Table>,
    pub success_count: usize,
    pub skipped_count: usize,
    /// Rows read from every detail file that parsed, plus the supplemental
    /// rows of units that made it into `tables`.
    pub source_rows: usize,
}

/// Combine every pair in ascending base-name order.
///
/// Per-unit failures are logged and counted as skipped; they never stop the run.
#[instrument(level = "info", skip_all, fields(pairs = pairs.len()))]
pub fn combine_pairs(
    pairs: &BTreeMap<String, FilePair>,
    policy: SupplementalPolicy,
    log: &mut ProcessingLog,
) -> CombinedUnits {
    let mut units = CombinedUnits::default();

    for (base, pair) in pairs {
        let Some(detail) = pair.detail.as_deref() else {
            warn!(base = %base, "no detail file");
            log.push(format!(
                "  -> ⚠️ WARNING: Skipping {} (essential detail file is missing).",
                base
            ));
            units.skipped_count += 1;
            continue;
        };

        let detail = match read_member(detail) {
            Ok(table) => table,
            Err(e) => {
                skip_unit(&mut units, base, &e, log);
                continue;
            }
        };
        // stays counted even if the supplemental file sinks the unit
        units.source_rows += detail.num_rows();

        match with_supplemental(base, detail, pair.supplemental.as_deref(), policy, log) {
            Ok((table, sup_rows)) => {
                debug!(base = %base, rows = table.num_rows(), "combined unit");
                units.source_rows += sup_rows;
                units.tables.push(table);
                units.success_count += 1;
                log.push(format!("  -> Processed: {}", base));
            }
            Err(e) => skip_unit(&mut units, base, &e, log),
        }
    }

    info!(
        succeeded = units.success_count,
        skipped = units.skipped_count,
        source_rows = units.source_rows,
        "combined pairs"
    );
    units
}

fn skip_unit(units: &mut CombinedUnits, base: &str, e: &CompileError, log: &mut ProcessingLog) {
    warn!(base = %base, error = %e, "skipping unit");
    log.push(format!("  -> ❌ ERROR processing {}: {}", base, e));
    units.skipped_count += 1;
}

/// Stack the supplemental rows, if any, under `detail`. Returns the unit
/// table and the number of supplemental rows it gained.
fn with_supplemental(
    base: &str,
    detail: Table,
    sup_path: Option<&Path>,
    policy: SupplementalPolicy,
    log: &mut ProcessingLog,
) -> Result<(Table, usize), CompileError> {
    let Some(sup_path) = sup_path else {
        return Ok((detail, 0));
    };

    let sup = match read_member(sup_path) {
        Ok(sup) => sup,
        Err(CompileError::Parse { ref source, .. }) if source.is_empty_data() => {
            debug!(base, "empty supplemental file");
            return Ok((detail, 0));
        }
        Err(e) => match policy {
            SupplementalPolicy::SkipUnit => return Err(e),
            SupplementalPolicy::DetailOnly => {
                warn!(base, error = %e, "unreadable supplemental file, using detail only");
                log.push(format!(
                    "  -> ⚠️ WARNING: Ignoring supplemental data for {}: {}",
                    base, e
                ));
                return Ok((detail, 0));
            }
        },
    };

    if sup.is_empty() {
        return Ok((detail, 0));
    }

    let sup_rows = sup.num_rows();
    let combined = Table::concat([&detail, &sup]).map_err(|source| CompileError::Aggregation {
        rows: detail.num_rows() + sup_rows,
        source,
    })?;
    Ok((combined, sup_rows))
}

fn read_member(path: &Path) -> Result<Table, CompileError> {
    read_csv_path(path).map_err(|source| CompileError::Parse {
        file: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        source,
    })
}
