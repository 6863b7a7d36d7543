//! IIIF presentation manifests and the page image downloader.

use crate::core::config::DownloadPolicy;
use crate::core::{OCRError, OcrResult};
use crate::utils::progress_bar;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory under the output root that holds one folder per volume.
pub const DOWNLOAD_DIR: &str = "Downloaded";

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub sequences: Vec<Sequence>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sequence {
    #[serde(rename = "@id")]
    pub id: String,
    #[serde(default)]
    pub canvases: Vec<Canvas>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Canvas {
    #[serde(default)]
    pub images: Vec<Annotation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Annotation {
    pub resource: Resource,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Resource {
    #[serde(rename = "@id")]
    pub id: String,
}

impl Manifest {
    fn first_sequence(&self) -> OcrResult<&Sequence> {
        self.sequences
            .first()
            .ok_or_else(|| OCRError::invalid_input("manifest has no sequences"))
    }

    /// Volume identifier: the first sequence id after `bdr:` up to the next `/`.
    pub fn volume_id(&self) -> OcrResult<String> {
        let id = &self.first_sequence()?.id;
        let (_, rest) = id.split_once("bdr:").ok_or_else(|| {
            OCRError::invalid_input(format!("sequence id '{id}' carries no volume identifier"))
        })?;
        let volume = rest.split('/').next().unwrap_or_default();
        if volume.is_empty() {
            return Err(OCRError::invalid_input(format!("empty volume identifier in '{id}'")));
        }
        Ok(volume.to_string())
    }

    /// URL of the first image of every canvas, in canvas order.
    pub fn image_urls(&self) -> OcrResult<Vec<String>> {
        Ok(self
            .first_sequence()?
            .canvases
            .iter()
            .filter_map(|canvas| canvas.images.first())
            .map(|annotation| annotation.resource.id.clone())
            .collect())
    }
}

pub fn parse_manifest(json: &str) -> OcrResult<Manifest> {
    Ok(serde_json::from_str(json)?)
}

/// Local file name (without extension) of a manifest image: the part after
/// `::` up to the first dot, or the stem of the last path segment.
pub fn image_name_from_url(url: &str) -> String {
    if let Some((_, rest)) = url.split_once("::") {
        return rest.split('.').next().unwrap_or_default().to_string();
    }
    let segment = url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or_default();
    segment.split('.').next().unwrap_or_default().to_string()
}

/// Outcome of a manifest download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadSummary {
    pub downloaded: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Volume directory the images were written to.
    pub directory: PathBuf,
}

impl DownloadSummary {
    pub fn total(&self) -> usize {
        self.downloaded + self.skipped + self.failed
    }
}

#[derive(Debug, Clone)]
pub struct ManifestDownloader {
    client: Client,
    output_dir: PathBuf,
    policy: DownloadPolicy,
}

impl ManifestDownloader {
    /// Creates the output directory and an HTTP client with the policy's
    /// request timeout.
    pub fn new(output_dir: impl Into<PathBuf>, policy: DownloadPolicy) -> OcrResult<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(policy.timeout_secs.max(1)))
            .build()
            .map_err(|e| OCRError::config_error(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            output_dir,
            policy,
        })
    }

    pub fn policy(&self) -> &DownloadPolicy {
        &self.policy
    }

    /// Fetches the manifest at `url` and downloads its images into
    /// `<output_dir>/Downloaded/<volume_id>`.
    ///
    /// A manifest that cannot be fetched or parsed is an error; a single image
    /// that cannot be fetched is counted and skipped.
    pub fn download(&self, url: &str) -> OcrResult<DownloadSummary> {
        let body = self.fetch(url)?;
        let manifest: Manifest = serde_json::from_slice(&body)?;
        let volume_id = manifest.volume_id()?;
        let urls = manifest.image_urls()?;
        tracing::info!("manifest volume {} lists {} image(s)", volume_id, urls.len());

        let directory = self.output_dir.join(DOWNLOAD_DIR).join(&volume_id);
        std::fs::create_dir_all(&directory)?;
        let summary = self.fetch_images(&urls, &directory);
        tracing::info!(
            "downloaded {}, skipped {}, failed {} image(s) into {}",
            summary.downloaded,
            summary.skipped,
            summary.failed,
            summary.directory.display()
        );
        Ok(summary)
    }

    /// Downloads up to the policy's file limit of `urls` into `directory`,
    /// leaving files that already exist untouched.
    pub fn fetch_images(&self, urls: &[String], directory: &Path) -> DownloadSummary {
        let limit = self.policy.effective_limit(urls.len());
        let mut summary = DownloadSummary {
            directory: directory.to_path_buf(),
            ..DownloadSummary::default()
        };
        let progress = progress_bar(limit as u64, "downloading", self.policy.show_progress);

        for url in &urls[..limit] {
            let target = directory.join(format!("{}.jpg", image_name_from_url(url)));
            if target.is_file() {
                tracing::debug!("{} exists, skipping", target.display());
                summary.skipped += 1;
            } else {
                match self.fetch(url).and_then(|bytes| Ok(std::fs::write(&target, bytes)?)) {
                    Ok(()) => summary.downloaded += 1,
                    Err(e) => {
                        if self.policy.log_failures {
                            tracing::warn!("failed to download {}: {}", url, e);
                        }
                        summary.failed += 1;
                    }
                }
            }
            progress.inc(1);
        }
        progress.finish_and_clear();
        summary
    }

    /// GETs `url`, retrying failed requests and non-success statuses.
    fn fetch(&self, url: &str) -> OcrResult<Vec<u8>> {
        let mut attempt = 0;
        loop {
            let result = self
                .client
                .get(url)
                .send()
                .and_then(|response| response.error_for_status())
                .and_then(|response| response.bytes());
            match result {
                Ok(bytes) => return Ok(bytes.to_vec()),
                Err(e) if attempt < self.policy.max_retries => {
                    attempt += 1;
                    tracing::debug!("request to {} failed (attempt {}): {}", url, attempt, e);
                    std::thread::sleep(self.policy.retry_backoff(attempt));
                }
                Err(e) => return Err(OCRError::network_error(url, e)),
            }
        }
    }
}

/// Downloads the images of the manifest at `url` below `output_dir`.
pub fn download_manifest(
    url: &str,
    output_dir: &Path,
    policy: &DownloadPolicy,
) -> OcrResult<DownloadSummary> {
    ManifestDownloader::new(output_dir, policy.clone())?.download(url)
}
