//! The ordered token set shared by training and inference.
//!
//! Index 0 is the unknown token (also used to pad labels) and the last index is
//! the CTC blank. The order is fixed once a model has been trained against it,
//! so a SHA-256 fingerprint of the tokens can be stored next to the weights and
//! checked when the recognizer is built.

use crate::core::constants::{BLANK_TOKEN, UNKNOWN_TOKEN};
use crate::core::errors::{OCRError, OcrResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Extension appended to a weights file name for its charset fingerprint.
const FINGERPRINT_SUFFIX: &str = "charset.sha256";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Charset {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CharsetFile {
    Tokens(Vec<String>),
    WithFingerprint {
        tokens: Vec<String>,
        fingerprint: Option<String>,
    },
}

impl Charset {
    /// Creates a charset from an ordered token list.
    ///
    /// The first token must be the unknown token, the last the blank, and no
    /// token may repeat.
    pub fn new(tokens: Vec<String>) -> OcrResult<Self> {
        if tokens.len() < 2 {
            return Err(OCRError::invalid_input(format!(
                "charset needs at least the {UNKNOWN_TOKEN} and {BLANK_TOKEN} tokens, got {}",
                tokens.len()
            )));
        }
        if tokens[0] != UNKNOWN_TOKEN || tokens[tokens.len() - 1] != BLANK_TOKEN {
            return Err(OCRError::invalid_input(format!(
                "charset must start with {UNKNOWN_TOKEN} and end with {BLANK_TOKEN}"
            )));
        }
        let mut index = HashMap::with_capacity(tokens.len());
        for (i, token) in tokens.iter().enumerate() {
            if index.insert(token.clone(), i).is_some() {
                return Err(OCRError::invalid_input(format!(
                    "charset token '{token}' appears more than once"
                )));
            }
        }
        Ok(Self { tokens, index })
    }

    /// Builds a charset from labels: the sorted distinct characters framed by
    /// the unknown and blank tokens.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let chars: BTreeSet<char> = labels
            .into_iter()
            .flat_map(|label| label.as_ref().chars().collect::<Vec<_>>())
            .collect();
        let mut tokens = Vec::with_capacity(chars.len() + 2);
        tokens.push(UNKNOWN_TOKEN.to_string());
        tokens.extend(chars.into_iter().map(String::from));
        tokens.push(BLANK_TOKEN.to_string());
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Self { tokens, index }
    }

    /// Loads a charset from JSON (a token array or `{"tokens": [...]}`) or from
    /// a text file with one token per line.
    pub fn load(path: &Path) -> OcrResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        if !is_json {
            let tokens = content
                .lines()
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect();
            return Self::new(tokens);
        }

        match serde_json::from_str::<CharsetFile>(&content)? {
            CharsetFile::Tokens(tokens) => Self::new(tokens),
            CharsetFile::WithFingerprint {
                tokens,
                fingerprint,
            } => {
                let charset = Self::new(tokens)?;
                if let Some(expected) = fingerprint {
                    charset.verify_fingerprint(&expected)?;
                }
                Ok(charset)
            }
        }
    }

    /// Writes the charset and its fingerprint as JSON.
    pub fn save(&self, path: &Path) -> OcrResult<()> {
        let file = CharsetFile::WithFingerprint {
            tokens: self.tokens.clone(),
            fingerprint: Some(self.fingerprint()),
        };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn token(&self, index: usize) -> Option<&str> {
        self.tokens.get(index).map(String::as_str)
    }

    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Index of the unknown token, also the label pad value.
    pub fn pad_index(&self) -> usize {
        0
    }

    /// Index of the CTC blank.
    pub fn blank_index(&self) -> usize {
        self.tokens.len() - 1
    }

    /// Maps every character of `text` to its index.
    ///
    /// A character missing from the charset is a data integrity error: the
    /// charset is built from the same corpus, so a miss means the two diverged.
    pub fn vectorize(&self, text: &str) -> OcrResult<Vec<usize>> {
        let mut buf = [0u8; 4];
        text.chars()
            .map(|c| {
                self.index
                    .get(c.encode_utf8(&mut buf) as &str)
                    .copied()
                    .ok_or_else(|| {
                        OCRError::data_integrity(
                            "charset lookup",
                            format!("character {c:?} (U+{:04X}) is not in the charset", c as u32),
                        )
                    })
            })
            .collect()
    }

    /// Vectorizes `text` and right-pads it with the pad index to `sequence_length`.
    ///
    /// Labels longer than `sequence_length` are rejected rather than truncated.
    pub fn vectorize_padded(&self, text: &str, sequence_length: usize) -> OcrResult<Vec<usize>> {
        let mut indices = self.vectorize(text)?;
        if indices.len() > sequence_length {
            return Err(OCRError::data_integrity(
                "label padding",
                format!(
                    "label has {} characters but the sequence length is {}",
                    indices.len(),
                    sequence_length
                ),
            ));
        }
        indices.resize(sequence_length, self.pad_index());
        Ok(indices)
    }

    /// Maps indices back to text, skipping the unknown and blank tokens and
    /// anything out of range.
    pub fn decode(&self, indices: &[usize]) -> String {
        let blank = self.blank_index();
        indices
            .iter()
            .filter(|&&i| i != self.pad_index() && i != blank)
            .filter_map(|&i| self.token(i))
            .collect()
    }

    /// SHA-256 of the tokens joined by newlines, as lowercase hex.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.tokens.join("\n").as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }

    /// Fails unless the fingerprint equals `expected` (case-insensitive).
    pub fn verify_fingerprint(&self, expected: &str) -> OcrResult<()> {
        let actual = self.fingerprint();
        if actual.eq_ignore_ascii_case(expected.trim()) {
            Ok(())
        } else {
            Err(OCRError::data_integrity(
                "charset fingerprint",
                format!("expected {}, charset hashes to {}", expected.trim(), actual),
            ))
        }
    }

    /// Path of the fingerprint file kept next to a weights file.
    pub fn fingerprint_path(model_path: &Path) -> PathBuf {
        let mut name = model_path.as_os_str().to_os_string();
        name.push(".");
        name.push(FINGERPRINT_SUFFIX);
        PathBuf::from(name)
    }

    /// Writes the fingerprint file for `model_path`.
    pub fn write_fingerprint_file(&self, model_path: &Path) -> OcrResult<PathBuf> {
        let path = Self::fingerprint_path(model_path);
        std::fs::write(&path, format!("{}\n", self.fingerprint()))?;
        Ok(path)
    }

    /// Checks the fingerprint file for `model_path` if one exists.
    ///
    /// Returns whether a fingerprint file was found.
    pub fn verify_fingerprint_file(&self, model_path: &Path) -> OcrResult<bool> {
        let path = Self::fingerprint_path(model_path);
        if !path.is_file() {
            return Ok(false);
        }
        let expected = std::fs::read_to_string(&path)?;
        self.verify_fingerprint(&expected)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Charset {
        Charset::from_labels(["bkra§shis", "bde§legs"])
    }

    #[test]
    fn test_from_labels_orders_tokens() {
        let charset = sample();
        assert_eq!(charset.token(0), Some(UNKNOWN_TOKEN));
        assert_eq!(charset.token(charset.blank_index()), Some(BLANK_TOKEN));
        let middle: Vec<&str> = charset.tokens()[1..charset.len() - 1]
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(
            middle,
            vec!["a", "b", "d", "e", "g", "h", "i", "k", "l", "r", "s", "§"]
        );
    }

    #[test]
    fn test_vectorize_missing_character_is_fatal() {
        let err = sample().vectorize("bkra§x").unwrap_err();
        assert!(matches!(err, OCRError::DataIntegrity { .. }));
    }

    #[test]
    fn test_vectorize_padded() {
        let charset = sample();
        let padded = charset.vectorize_padded("bde", 6).unwrap();
        assert_eq!(padded.len(), 6);
        assert_eq!(&padded[3..], &[0, 0, 0]);
        assert_eq!(charset.decode(&padded), "bde");
    }

    #[test]
    fn test_decode_drops_unknown_and_blank() {
        let charset = sample();
        let k = charset.index_of("k").unwrap();
        let decoded = charset.decode(&[0, k, charset.blank_index(), charset.len()]);
        assert_eq!(decoded, "k");
        assert!(!decoded.contains(UNKNOWN_TOKEN));
    }

    #[test]
    fn test_vectorize_padded_rejects_overlong_labels() {
        let err = sample().vectorize_padded("bkra§shis", 4).unwrap_err();
        assert!(err.to_string().contains("sequence length is 4"));
    }

    #[test]
    fn test_new_validates_sentinels() {
        assert!(Charset::new(vec!["a".into(), BLANK_TOKEN.into()]).is_err());
        assert!(Charset::new(vec![UNKNOWN_TOKEN.into(), "a".into(), "a".into(), BLANK_TOKEN.into()]).is_err());
        assert!(Charset::new(vec![UNKNOWN_TOKEN.into(), BLANK_TOKEN.into()]).is_ok());
    }

    #[test]
    fn test_save_and_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charset.json");
        let charset = sample();
        charset.save(&path).unwrap();
        assert_eq!(Charset::load(&path).unwrap(), charset);
    }

    #[test]
    fn test_load_rejects_tampered_fingerprint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charset.json");
        std::fs::write(
            &path,
            r#"{"tokens": ["[UNK]", "a", "[BLK]"], "fingerprint": "deadbeef"}"#,
        )
        .unwrap();
        assert!(Charset::load(&path).is_err());
    }

    #[test]
    fn test_load_plain_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("charset.txt");
        std::fs::write(&path, "[UNK]\nk\na\n§\n[BLK]\n").unwrap();
        let charset = Charset::load(&path).unwrap();
        assert_eq!(charset.len(), 5);
        assert_eq!(charset.index_of("§"), Some(3));
    }

    #[test]
    fn test_fingerprint_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let model = dir.path().join("easter2.onnx");
        let charset = sample();
        assert!(!charset.verify_fingerprint_file(&model).unwrap());
        let written = charset.write_fingerprint_file(&model).unwrap();
        assert!(written.ends_with("easter2.onnx.charset.sha256"));
        assert!(charset.verify_fingerprint_file(&model).unwrap());

        let other = Charset::from_labels(["xyz"]);
        assert!(other.verify_fingerprint_file(&model).is_err());
    }
}
