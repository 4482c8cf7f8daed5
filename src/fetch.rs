use crate::config::Config;
use crate::util::sha256_hex;
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct FetchSummary {
    pub url: String,
    pub path: String,
    pub bytes: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    pub downloaded: bool,
}

/// Download the source document. An existing file is left alone so repeated
/// runs are cheap; delete it to force a re-download. Network and HTTP
/// failures are errors; they never produce a partial file on disk.
pub fn fetch(cfg: &Config, url: Option<&str>, output: Option<&Path>) -> Result<FetchSummary> {
    let url = url.unwrap_or(cfg.download.url.as_str());
    let path = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&cfg.download.filename));

    if path.exists() {
        let bytes = std::fs::metadata(&path)
            .with_context(|| format!("stat {}", path.display()))?
            .len();
        info!(
            "file already exists: {} ({bytes} bytes); delete it to re-download",
            path.display()
        );
        return Ok(FetchSummary {
            url: url.to_string(),
            path: path.display().to_string(),
            bytes,
            sha256: None,
            downloaded: false,
        });
    }

    info!("downloading {url}");
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(cfg.download.timeout_seconds))
        .build()
        .with_context(|| "building HTTP client")?;

    let response = client
        .get(url)
        .send()
        .with_context(|| format!("requesting {url}"))?;
    if !response.status().is_success() {
        bail!("download failed: HTTP {}", response.status());
    }

    let body = response
        .bytes()
        .with_context(|| format!("reading response body from {url}"))?;
    std::fs::write(&path, &body).with_context(|| format!("writing {}", path.display()))?;

    let sha256 = sha256_hex(&body);
    info!("downloaded {} bytes sha256={sha256}", body.len());

    Ok(FetchSummary {
        url: url.to_string(),
        path: path.display().to_string(),
        bytes: body.len() as u64,
        sha256: Some(sha256),
        downloaded: true,
    })
}
