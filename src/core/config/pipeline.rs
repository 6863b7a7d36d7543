//! Configuration of the segmentation model, the recognizer and a pipeline run.
//!
//! [`PipelineConfig`] can be loaded from JSON; every field has a default so a
//! file only needs to name what it changes.
//!
//! ```rust
//! use tibetan_ocr::core::config::{InferenceMode, PipelineConfig};
//!
//! let config: PipelineConfig = serde_json::from_str(r#"{
//!     "line": { "model_path": "models/lines.onnx" },
//!     "ocr": { "model_path": "models/easter2.onnx", "charset_path": "models/charset.json" },
//!     "run": { "export_formats": ["xml", "text"], "mode": "sequential" }
//! }"#).unwrap();
//! assert_eq!(config.run.mode, InferenceMode::Sequential);
//! assert_eq!(config.line.threshold, 0.6);
//! ```

use super::errors::{ConfigError, ConfigValidator};
use super::onnx::OrtSessionConfig;
use crate::core::constants::*;
use crate::core::errors::OcrResult;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Settings of the line segmentation stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineDetectorConfig {
    pub model_path: PathBuf,
    pub input_name: String,
    pub output_name: String,
    pub input_width: u32,
    pub input_height: u32,
    /// Probability threshold for foreground pixels.
    pub threshold: f32,
    /// Contours need an area strictly greater than this.
    pub min_contour_area: f64,
    pub dilation_kernel: u32,
    pub dilation_iterations: u32,
    pub clahe_clip_limit: f32,
    pub clahe_tile_grid: u32,
    pub ort_session: Option<OrtSessionConfig>,
}

impl Default for LineDetectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            input_name: LINE_MODEL_INPUT_NAME.to_string(),
            output_name: LINE_MODEL_OUTPUT_NAME.to_string(),
            input_width: LINE_MODEL_INPUT_WIDTH,
            input_height: LINE_MODEL_INPUT_HEIGHT,
            threshold: DEFAULT_LINE_THRESHOLD,
            min_contour_area: DEFAULT_MIN_CONTOUR_AREA,
            dilation_kernel: DEFAULT_DILATION_KERNEL,
            dilation_iterations: DEFAULT_DILATION_ITERATIONS,
            clahe_clip_limit: DEFAULT_CLAHE_CLIP_LIMIT,
            clahe_tile_grid: DEFAULT_CLAHE_TILE_GRID,
            ort_session: None,
        }
    }
}

impl LineDetectorConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Self::default()
        }
    }
}

impl ConfigValidator for LineDetectorConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_image_dimensions(self.input_width, self.input_height)?;
        self.validate_unit_interval(f64::from(self.threshold), "threshold")?;
        if self.min_contour_area < 0.0 {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "min_contour_area must be non-negative, got {}",
                    self.min_contour_area
                ),
            });
        }
        if self.dilation_kernel == 0 {
            return Err(ConfigError::InvalidConfig {
                message: "dilation_kernel must be at least 1".to_string(),
            });
        }
        if self.clahe_tile_grid == 0 || self.clahe_clip_limit <= 0.0 {
            return Err(ConfigError::InvalidConfig {
                message: format!(
                    "contrast enhancement needs a positive clip limit and tile grid, got {} and {}",
                    self.clahe_clip_limit, self.clahe_tile_grid
                ),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Settings of the line recognizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrModelConfig {
    pub model_path: PathBuf,
    /// Charset file (JSON or one token per line).
    pub charset_path: PathBuf,
    pub input_name: String,
    /// Output tensor name; the first model output when unset.
    pub output_name: Option<String>,
    pub input_width: u32,
    pub input_height: u32,
    /// SHA-256 the charset must hash to.
    pub charset_fingerprint: Option<String>,
    pub ort_session: Option<OrtSessionConfig>,
}

impl Default for OcrModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            charset_path: PathBuf::new(),
            input_name: OCR_INPUT_NAME.to_string(),
            output_name: None,
            input_width: OCR_INPUT_WIDTH,
            input_height: OCR_INPUT_HEIGHT,
            charset_fingerprint: None,
            ort_session: None,
        }
    }
}

impl OcrModelConfig {
    pub fn new(model_path: impl Into<PathBuf>, charset_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            charset_path: charset_path.into(),
            ..Self::default()
        }
    }
}

impl ConfigValidator for OcrModelConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_image_dimensions(self.input_width, self.input_height)?;
        if self.input_name.is_empty() {
            return Err(ConfigError::InvalidConfig {
                message: "recognizer input name is empty".to_string(),
            });
        }
        Ok(())
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// How line images are fed to the recognizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InferenceMode {
    /// One forward pass for all lines of a page.
    #[default]
    Batched,
    /// One forward pass per line, for memory-constrained hosts.
    Sequential,
}

impl std::str::FromStr for InferenceMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "batched" | "batch" => Ok(Self::Batched),
            "sequential" | "single" => Ok(Self::Sequential),
            other => Err(ConfigError::InvalidConfig {
                message: format!("unknown inference mode '{other}'"),
            }),
        }
    }
}

/// Text encoding of the recognized lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputEncoding {
    /// Convert the transliteration back to Tibetan script.
    #[default]
    Unicode,
    /// Keep the Wylie transliteration the model emits.
    Wylie,
}

impl std::str::FromStr for OutputEncoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unicode" => Ok(Self::Unicode),
            "wylie" | "ewts" => Ok(Self::Wylie),
            other => Err(ConfigError::InvalidConfig {
                message: format!("unknown output encoding '{other}'"),
            }),
        }
    }
}

/// Options of a single pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    /// Export format names (`text`, `xml`, `prodigy`).
    pub export_formats: Vec<String>,
    pub mode: InferenceMode,
    pub encoding: OutputEncoding,
    /// Write the mask overlay of each page to `line_predictions/`.
    pub write_control_image: bool,
    /// Reject unknown export formats instead of skipping them.
    pub strict_formats: bool,
    pub show_progress: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            export_formats: Vec::new(),
            mode: InferenceMode::Batched,
            encoding: OutputEncoding::Unicode,
            write_control_image: false,
            strict_formats: false,
            show_progress: true,
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_export_formats<I, S>(mut self, formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.export_formats = formats.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_mode(mut self, mode: InferenceMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_encoding(mut self, encoding: OutputEncoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_control_image(mut self, enabled: bool) -> Self {
        self.write_control_image = enabled;
        self
    }

    pub fn with_strict_formats(mut self, strict: bool) -> Self {
        self.strict_formats = strict;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }
}

/// Behavior of the manifest downloader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadPolicy {
    /// Maximum images to fetch; zero or negative fetches all.
    pub file_limit: i64,
    /// Extra attempts after a failed request.
    pub max_retries: u32,
    /// Pause between attempts, multiplied by the attempt number.
    pub retry_backoff_ms: u64,
    pub timeout_secs: u64,
    /// Log a warning for each image that could not be fetched.
    pub log_failures: bool,
    pub show_progress: bool,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            file_limit: DEFAULT_FILE_LIMIT,
            max_retries: 2,
            retry_backoff_ms: 500,
            timeout_secs: 60,
            log_failures: true,
            show_progress: true,
        }
    }
}

impl DownloadPolicy {
    pub fn with_file_limit(mut self, limit: i64) -> Self {
        self.file_limit = limit;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn retry_backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(u64::from(attempt)))
    }

    /// Number of images to fetch out of `available`.
    pub fn effective_limit(&self, available: usize) -> usize {
        if self.file_limit <= 0 {
            return available;
        }
        usize::try_from(self.file_limit)
            .map(|limit| limit.min(available))
            .unwrap_or(available)
    }
}

/// Complete configuration of the OCR application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub line: LineDetectorConfig,
    pub ocr: OcrModelConfig,
    pub run: RunOptions,
    pub download: DownloadPolicy,
}

impl PipelineConfig {
    /// Reads a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> OcrResult<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }
}

impl ConfigValidator for PipelineConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.line.validate()?;
        self.ocr.validate()
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_defaults_match_constants() {
        let config = LineDetectorConfig::default();
        assert_eq!(config.input_width, 1024);
        assert_eq!(config.input_height, 192);
        assert_eq!(config.min_contour_area, 2000.0);
        assert_eq!(config.dilation_kernel, 8);
        assert_eq!(config.dilation_iterations, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_line_config_rejects_threshold_out_of_range() {
        let config = LineDetectorConfig {
            threshold: 1.5,
            ..LineDetectorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_mode_and_encoding_parse() {
        assert_eq!("batched".parse::<InferenceMode>().unwrap(), InferenceMode::Batched);
        assert_eq!(
            " Sequential ".parse::<InferenceMode>().unwrap(),
            InferenceMode::Sequential
        );
        assert_eq!("wylie".parse::<OutputEncoding>().unwrap(), OutputEncoding::Wylie);
        assert!("beam".parse::<InferenceMode>().is_err());
    }

    #[test]
    fn test_effective_limit() {
        let policy = DownloadPolicy::default();
        assert_eq!(policy.effective_limit(200), 50);
        assert_eq!(policy.effective_limit(10), 10);
        assert_eq!(policy.clone().with_file_limit(0).effective_limit(200), 200);
        assert_eq!(policy.with_file_limit(-3).effective_limit(7), 7);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"line": {"threshold": 0.5}, "run": {"export_formats": ["text"], "write_control_image": true}}"#,
        )
        .unwrap();
        let config = PipelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.line.threshold, 0.5);
        assert_eq!(config.line.min_contour_area, 2000.0);
        assert_eq!(config.run.export_formats, vec!["text".to_string()]);
        assert!(config.run.write_control_image);
        assert_eq!(config.download.file_limit, 50);
    }
}
