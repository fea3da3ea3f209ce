// src/fetch/mod.rs
pub mod zips;

use anyhow::{Context, Result};
use reqwest::Client;
use std::{
    fmt,
    io::Cursor,
    path::{Path, PathBuf},
};
use tokio::fs;
use tracing::info;
use url::Url;

/// Where an archive comes from: a file on disk or an http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveSource {
    Local(PathBuf),
    Remote(Url),
}

impl ArchiveSource {
    /// Anything that parses as an `http`/`https` URL is remote; everything
    /// else is treated as a local path.
    pub fn parse(raw: &str) -> Self {
        match Url::parse(raw) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => ArchiveSource::Remote(url),
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map(ArchiveSource::Local)
                .unwrap_or_else(|_| ArchiveSource::Local(PathBuf::from(raw))),
            _ => ArchiveSource::Local(PathBuf::from(raw)),
        }
    }

    /// Short name used in logs and the run summary.
    pub fn name(&self) -> String {
        match self {
            ArchiveSource::Local(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            ArchiveSource::Remote(url) => zips::file_name(url).to_string(),
        }
    }
}

impl fmt::Display for ArchiveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveSource::Local(path) => write!(f, "{}", path.display()),
            ArchiveSource::Remote(url) => write!(f, "{}", url),
        }
    }
}

/// Load the whole archive into memory, ready for the compiler.
pub async fn load_archive(client: &Client, source: &ArchiveSource) -> Result<Cursor<Vec<u8>>> {
    let data = match source {
        ArchiveSource::Local(path) => read_local(path).await?,
        ArchiveSource::Remote(url) => zips::download_zip(client, url).await?,
    };
    info!(source = %source, bytes = data.len(), "archive loaded");
    Ok(Cursor::new(data))
}

async fn read_local(path: &Path) -> Result<Vec<u8>> {
    fs::read(path)
        .await
        .with_context(|| format!("reading archive {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn parse_distinguishes_urls_from_paths() {
        assert!(matches!(
            ArchiveSource::parse("https://example.com/a.zip"),
            ArchiveSource::Remote(_)
        ));
        assert!(matches!(
            ArchiveSource::parse("http://example.com/a.zip"),
            ArchiveSource::Remote(_)
        ));
        assert_eq!(
            ArchiveSource::parse("data/results.zip"),
            ArchiveSource::Local(PathBuf::from("data/results.zip"))
        );
        // a drive letter parses as a URL scheme but is still a path
        assert!(matches!(
            ArchiveSource::parse("C:\\data\\results.zip"),
            ArchiveSource::Local(_)
        ));
        assert_eq!(
            ArchiveSource::parse("file:///tmp/a.zip"),
            ArchiveSource::Local(PathBuf::from("/tmp/a.zip"))
        );
    }

    #[test]
    fn name_is_last_component() {
        assert_eq!(ArchiveSource::parse("/tmp/in/results.zip").name(), "results.zip");
        assert_eq!(
            ArchiveSource::parse("https://example.com/x/y.zip").name(),
            "y.zip"
        );
    }

    #[tokio::test]
    async fn loads_local_file() -> Result<()> {
        let mut tmp = NamedTempFile::new()?;
        tmp.write_all(b"PK\x05\x06")?;
        let source = ArchiveSource::Local(tmp.path().to_path_buf());

        let cursor = load_archive(&Client::new(), &source).await?;
        assert_eq!(cursor.get_ref().as_slice(), b"PK\x05\x06");
        Ok(())
    }

    #[tokio::test]
    async fn missing_local_file_is_an_error() {
        let source = ArchiveSource::Local(PathBuf::from("/definitely/not/here.zip"));
        let err = load_archive(&Client::new(), &source).await.unwrap_err();
        assert!(err.to_string().contains("reading archive"));
    }
}
