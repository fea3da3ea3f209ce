// src/output.rs

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, info};

use crate::{
    compile::{CompileOutcome, RunSummary},
    config::CompilerConfig,
    table::{to_csv_bytes, to_xlsx_bytes, write_parquet},
};

/// Contents of `summary.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryRecord {
    pub archive: String,
    pub generated_at: DateTime<Utc>,
    pub columns: usize,
    #[serde(flatten)]
    pub summary: RunSummary,
}

/// Paths of everything a run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenArtifacts {
    pub log: PathBuf,
    pub csv: Option<PathBuf>,
    pub xlsx: Option<PathBuf>,
    pub parquet: Option<PathBuf>,
    pub summary: Option<PathBuf>,
}

/// Write the processing log, and when a master table exists, the CSV,
/// workbook, Parquet and summary files, into `config.output_dir`.
///
/// Dataset files left by an earlier run are removed when this run does not
/// replace them, so the directory never pairs a fresh log with stale data.
pub fn write_artifacts(
    config: &CompilerConfig,
    archive_name: &str,
    outcome: &CompileOutcome,
) -> Result<WrittenArtifacts> {
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating output dir {}", config.output_dir.display()))?;

    let mut written = WrittenArtifacts {
        log: config.log_path(),
        ..Default::default()
    };
    write_atomically(&written.log, |w| {
        w.write_all(outcome.log.to_string().as_bytes())?;
        w.write_all(b"\n")?;
        Ok(())
    })?;

    let (Some(table), Some(summary)) = (&outcome.table, &outcome.summary) else {
        for stale in [
            config.csv_path(),
            config.xlsx_path(),
            config.parquet_path(),
            config.summary_path(),
        ] {
            remove_stale(&stale)?;
        }
        info!(log = %written.log.display(), "no master table, wrote log only");
        return Ok(written);
    };

    let csv_path = config.csv_path();
    let csv = to_csv_bytes(table)?;
    write_atomically(&csv_path, |w| Ok(w.write_all(&csv)?))?;
    info!(path = %csv_path.display(), rows = table.num_rows(), "wrote master csv");
    written.csv = Some(csv_path);

    let xlsx_path = config.xlsx_path();
    let xlsx = to_xlsx_bytes(table)?;
    write_atomically(&xlsx_path, |w| Ok(w.write_all(&xlsx)?))?;
    info!(path = %xlsx_path.display(), "wrote master workbook");
    written.xlsx = Some(xlsx_path);

    if config.write_parquet {
        let parquet_path = config.parquet_path();
        write_atomically(&parquet_path, |w| {
            write_parquet(table, w)?;
            Ok(())
        })?;
        info!(path = %parquet_path.display(), "wrote master parquet");
        written.parquet = Some(parquet_path);
    } else {
        remove_stale(&config.parquet_path())?;
    }

    let record = SummaryRecord {
        archive: archive_name.to_string(),
        generated_at: Utc::now(),
        columns: table.num_columns(),
        summary: summary.clone(),
    };
    let summary_path = config.summary_path();
    write_atomically(&summary_path, |w| {
        serde_json::to_writer_pretty(&mut *w, &record).context("serializing summary")?;
        w.write_all(b"\n")?;
        Ok(())
    })?;
    written.summary = Some(summary_path);

    Ok(written)
}

/// Read a `summary.json` written by [`write_artifacts`].
pub fn read_summary(path: &Path) -> Result<SummaryRecord> {
    let f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    serde_json::from_reader(f).with_context(|| format!("parsing {}", path.display()))
}

fn remove_stale(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "removed stale artifact");
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("removing stale {}", path.display())),
    }
}

/// Write through a hidden temp file next to `path`, then rename over it.
fn write_atomically<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<()>,
{
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .with_context(|| format!("no file name in {}", path.display()))?;
    let tmp_path = dir.join(format!(".{}.tmp", name.to_string_lossy()));

    let file = File::create(&tmp_path)
        .with_context(|| format!("creating {}", tmp_path.display()))?;
    let mut w = BufWriter::new(file);
    let written = fill(&mut w).and_then(|()| w.flush().map_err(Into::into));
    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path);
        return Err(e.context(format!("writing {}", path.display())));
    }
    drop(w);

    fs::rename(&tmp_path, path)
        .with_context(|| format!("renaming {} -> {}", tmp_path.display(), path.display()))
}
