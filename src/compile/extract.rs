use std::{
    fs,
    io::{self, Read, Seek},
    path::Path,
};
use tempfile::TempDir;
use tracing::{debug, instrument, warn};
use zip::ZipArchive;

use super::CompileError;

/// Scratch copy of an archive's contents. The directory tree is removed when
/// this value is dropped.
#[derive(Debug)]
pub struct ExtractedArchive {
    dir: TempDir,
    files: usize,
}

impl ExtractedArchive {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Number of regular files written.
    pub fn file_count(&self) -> usize {
        self.files
    }
}

/// Unpack every entry of `archive` into a fresh scratch directory, keeping
/// the directory structure. Entries whose path would escape the scratch root
/// are skipped.
#[instrument(level = "debug", skip(archive))]
pub fn extract_archive<R: Read + Seek>(archive: R) -> Result<ExtractedArchive, CompileError> {
    let mut archive = ZipArchive::new(archive)?;

    let dir = tempfile::Builder::new()
        .prefix("csv-compiler-")
        .tempdir()
        .map_err(|source| CompileError::Scratch {
            path: std::env::temp_dir(),
            source,
        })?;

    let mut files = 0;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let rel = match entry.enclosed_name() {
            Some(p) => p,
            None => {
                warn!(name = entry.name(), "skipping entry with unsafe path");
                continue;
            }
        };
        let out_path = dir.path().join(&rel);
        let scratch = |source: io::Error| CompileError::Scratch {
            path: rel.clone(),
            source,
        };

        if entry.is_dir() {
            fs::create_dir_all(&out_path).map_err(scratch)?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent).map_err(scratch)?;
        }
        // a corrupt stream or checksum surfaces on read, a full disk on write
        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| CompileError::Archive(e.into()))?;
        fs::write(&out_path, &contents).map_err(scratch)?;
        files += 1;
    }

    debug!(files, root = %dir.path().display(), "extracted archive");
    Ok(ExtractedArchive { dir, files })
}
