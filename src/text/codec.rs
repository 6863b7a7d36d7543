//! Conversion between Tibetan script and the model's working transliteration.
//!
//! The recognizer is trained on EWTS in which the tsheg, written as a space, is
//! replaced by [`WORD_SEPARATOR`] so that every label character is a single
//! visible token.

use super::{clean, wylie};
use crate::core::constants::WORD_SEPARATOR;
use crate::core::errors::OcrResult;
use std::io::BufRead;
use std::path::Path;

/// Converts Tibetan script to the working transliteration.
pub fn to_transliteration(text: &str) -> String {
    let wylie = wylie::to_wylie(text);
    let separated = wylie.replace(' ', &WORD_SEPARATOR.to_string());
    collapse_underscores(&separated)
}

/// Converts the working transliteration (or plain EWTS) back to Tibetan script.
pub fn to_native_script(text: &str) -> String {
    let wylie = text.replace(WORD_SEPARATOR, " ");
    wylie::to_unicode(&wylie)
}

/// Replaces the separator placeholder with a plain space.
pub fn restore_separators(text: &str) -> String {
    text.replace(WORD_SEPARATOR, " ")
}

fn collapse_underscores(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_underscore = false;
    for c in text.chars() {
        if c == '_' && previous_underscore {
            continue;
        }
        previous_underscore = c == '_';
        out.push(c);
    }
    out
}

/// Reads a transcription file the way training labels are prepared: first
/// line only, cleaned, then transliterated.
pub fn read_label(path: &Path) -> OcrResult<String> {
    let file = std::fs::File::open(path)?;
    let mut line = String::new();
    std::io::BufReader::new(file).read_line(&mut line)?;
    Ok(to_transliteration(&clean::clean(&line)))
}
