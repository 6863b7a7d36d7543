//! Remote page acquisition from IIIF manifests.

pub mod iiif;

pub use iiif::{
    DOWNLOAD_DIR, DownloadSummary, Manifest, ManifestDownloader, download_manifest,
    image_name_from_url, parse_manifest,
};
