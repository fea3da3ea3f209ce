use std::{collections::TryReserveError, io, path::PathBuf};
use thiserror::Error;
use zip::result::ZipError;

use crate::table::TableError;

#[derive(Debug, Error)]
pub enum CompileError {
    /// Corrupt, truncated, or not a zip archive at all.
    #[error("{0}")]
    Archive(#[from] ZipError),

    #[error("could not write {path} to scratch storage: {source}")]
    Scratch {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not walk extracted files: {0}")]
    Walk(#[from] glob::PatternError),

    #[error("{file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: TableError,
    },

    #[error("could not allocate {rows} rows for the master table: {source}")]
    Aggregation {
        rows: usize,
        #[source]
        source: TryReserveError,
    },
}

impl CompileError {
    /// True for failures that happen before any file is looked at.
    pub fn is_extraction(&self) -> bool {
        matches!(self, CompileError::Archive(_) | CompileError::Scratch { .. })
    }
}
