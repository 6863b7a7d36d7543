//! Argument checks shared by the dataset and model code.
//!
//! All checks fail with [`OCRError::InvalidInput`] naming the offending
//! argument.

use crate::core::{OCRError, OcrResult};
use std::fmt::Display;

fn invalid(name: &str, requirement: impl Display) -> OCRError {
    OCRError::invalid_input(format!("{name} {requirement}"))
}

/// `value` must lie in `[min, max]`.
pub fn validate_range<T: PartialOrd + Display>(value: T, min: T, max: T, name: &str) -> OcrResult<()> {
    if value < min || value > max {
        return Err(invalid(name, format_args!("must be within [{min}, {max}], got {value}")));
    }
    Ok(())
}

/// `value` must be strictly greater than zero.
pub fn validate_positive<T: PartialOrd + Display + Default>(value: T, name: &str) -> OcrResult<()> {
    if value <= T::default() {
        return Err(invalid(name, format_args!("must be greater than 0, got {value}")));
    }
    Ok(())
}

pub fn validate_non_empty<T>(items: &[T], name: &str) -> OcrResult<()> {
    if items.is_empty() {
        return Err(invalid(name, "must not be empty"));
    }
    Ok(())
}

/// Paired inputs, such as images and their labels, must line up one to one.
pub fn validate_same_length<T, U>(left: &[T], right: &[U], left_name: &str, right_name: &str) -> OcrResult<()> {
    if left.len() != right.len() {
        return Err(invalid(
            left_name,
            format_args!("({}) and {right_name} ({}) differ in length", left.len(), right.len()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_bounds_are_inclusive() {
        assert!(validate_range(0.0, 0.0, 1.0, "split_ratio").is_ok());
        assert!(validate_range(1.0, 0.0, 1.0, "split_ratio").is_ok());
        assert!(validate_range(1.2, 0.0, 1.0, "split_ratio").is_err());
    }

    #[test]
    fn test_positive() {
        assert!(validate_positive(4usize, "batch_size").is_ok());
        assert!(validate_positive(0usize, "batch_size").is_err());
    }

    #[test]
    fn test_same_length_names_both_sides() {
        assert!(validate_same_length(&[1, 2], &["a", "b"], "images", "labels").is_ok());
        let err = validate_same_length(&[1], &["a", "b"], "images", "labels").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("images") && message.contains("labels"));
    }

    #[test]
    fn test_non_empty() {
        assert!(validate_non_empty::<u8>(&[], "lines").is_err());
    }
}
