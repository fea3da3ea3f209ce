use csv::ReaderBuilder;
use std::{
    collections::HashSet,
    fs, io,
    path::Path,
};
use thiserror::Error;
use tracing::trace;

use super::{Table, UTF8_BOM};

#[derive(Debug, Error)]
pub enum TableError {
    /// Zero bytes, whitespace only, or no header record.
    #[error("no columns to parse from file")]
    Empty,
    #[error("could not read file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("expected {expected} fields in line {line}, saw {found}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },
}

impl TableError {
    pub fn is_empty_data(&self) -> bool {
        matches!(self, TableError::Empty)
    }
}

/// Read and parse one CSV file from disk.
pub fn read_csv_path(path: &Path) -> Result<Table, TableError> {
    let data = fs::read(path)?;
    read_csv_bytes(&data)
}

/// Parse CSV bytes into a [`Table`].
///
/// - the first record is the header; duplicate names become `name.1`, `name.2`, ...
/// - a leading UTF-8 BOM is ignored
/// - blank lines are skipped
/// - short records are padded with missing values, long records are an error
/// - empty fields are missing values
pub fn read_csv_bytes(data: &[u8]) -> Result<Table, TableError> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    if data.iter().all(u8::is_ascii_whitespace) {
        return Err(TableError::Empty);
    }

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(data);

    let headers = rdr.headers()?.clone();
    if headers.is_empty() {
        return Err(TableError::Empty);
    }
    let mut table = Table::new(dedupe_headers(headers.iter()));

    for result in rdr.records() {
        let record = result?;
        if record.len() > table.num_columns() {
            return Err(TableError::TooManyFields {
                line: record.position().map_or(0, |p| p.line()),
                expected: table.num_columns(),
                found: record.len(),
            });
        }
        table.push_row(
            record
                .iter()
                .map(|field| (!field.is_empty()).then(|| field.to_string()))
                .collect(),
        );
    }

    trace!(
        columns = table.num_columns(),
        rows = table.num_rows(),
        "parsed csv"
    );
    Ok(table)
}

fn dedupe_headers<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();
    for name in raw {
        let mut candidate = name.to_string();
        let mut n = 0;
        while seen.contains(&candidate) {
            n += 1;
            candidate = format!("{}.{}", name, n);
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}
