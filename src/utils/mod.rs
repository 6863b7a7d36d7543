//! Utility functions: image I/O, natural file ordering, directory listing,
//! progress bars and logging setup.

pub mod image;
pub mod natsort;
pub mod progress;

pub use image::{load_image, load_images, save_image};
pub use natsort::{natural_cmp, natural_path_cmp};
pub use progress::progress_bar;

use crate::core::OcrResult;
use std::path::{Path, PathBuf};

/// Lists the page images (`.jpg`/`.jpeg`, any case) directly inside `dir`,
/// in natural file-name order.
pub fn list_images(dir: &Path) -> OcrResult<Vec<PathBuf>> {
    list_files_with_extensions(dir, &["jpg", "jpeg"])
}

/// Lists files directly inside `dir` whose extension matches one of
/// `extensions` case-insensitively, in natural order.
pub fn list_files_with_extensions(dir: &Path, extensions: &[&str]) -> OcrResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want)));
        if matches {
            files.push(path);
        }
    }
    files.sort_by(|a, b| natural_path_cmp(a, b));
    Ok(files)
}

/// File stem of `path` as an owned string, empty when it has none.
pub fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Initializes the tracing subscriber for logging.
///
/// Sets up a registry with an environment filter read from `RUST_LOG` and a
/// formatting layer.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Like [`init_tracing`], but falls back to `default_directive` when
/// `RUST_LOG` is unset or invalid.
pub fn init_tracing_with_default(default_directive: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_images_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["p10.jpg", "p2.JPG", "p1.jpeg", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.jpg")).unwrap();
        let names: Vec<String> = list_images(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["p1.jpeg", "p2.JPG", "p10.jpg"]);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem(Path::new("/a/b/page_01.jpg")), "page_01");
        assert_eq!(file_stem(Path::new("/")), "");
    }
}
