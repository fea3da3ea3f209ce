use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::Client;
use tracing::{debug, info};
use url::Url;

/// Download the archive at `url` into memory.
pub async fn download_zip(client: &Client, url: &Url) -> Result<Vec<u8>> {
    let response = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()
        .with_context(|| format!("downloading {}", url))?;

    let mut data = Vec::with_capacity(response.content_length().unwrap_or(0) as usize);
    let mut stream = response.bytes_stream();
    let mut next_report = 10 * 1024 * 1024;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("reading body from {}", url))?;
        data.extend_from_slice(&chunk);

        if data.len() >= next_report {
            debug!("downloaded {} MB", data.len() / (1024 * 1024));
            next_report += 10 * 1024 * 1024;
        }
    }

    info!(url = %url, bytes = data.len(), "download complete");
    Ok(data)
}

/// Last path segment of `url`, or `download.zip` when there is none.
pub fn file_name(url: &Url) -> &str {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("download.zip")
}
