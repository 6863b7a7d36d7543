//! Configuration error types and validation traits.

use thiserror::Error;

/// Errors raised while validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Batch size must be greater than 0.
    #[error("batch size must be greater than 0")]
    InvalidBatchSize,

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// An export format name is not recognized.
    #[error("unknown export format '{name}' (expected one of: text, xml, prodigy)")]
    UnknownExportFormat { name: String },
}

/// Validation shared by all configuration structs.
pub trait ConfigValidator {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Returns the recommended defaults.
    fn get_defaults() -> Self
    where
        Self: Sized;

    /// Checks that a batch size is greater than 0.
    fn validate_batch_size(&self, batch_size: usize) -> Result<(), ConfigError> {
        if batch_size == 0 {
            Err(ConfigError::InvalidBatchSize)
        } else {
            Ok(())
        }
    }

    /// Checks that image dimensions are non-zero.
    fn validate_image_dimensions(&self, width: u32, height: u32) -> Result<(), ConfigError> {
        if width == 0 || height == 0 {
            Err(ConfigError::InvalidConfig {
                message: format!("image dimensions must be non-zero, got {width}x{height}"),
            })
        } else {
            Ok(())
        }
    }

    /// Checks that a value lies in `[0, 1]`.
    fn validate_unit_interval(&self, value: f64, name: &str) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&value) {
            Err(ConfigError::InvalidConfig {
                message: format!("{name} must be in [0, 1], got {value}"),
            })
        } else {
            Ok(())
        }
    }
}
