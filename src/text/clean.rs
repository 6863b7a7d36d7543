//! Normalization of raw transcription text.

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_VARIANTS: Lazy<Regex> =
    Lazy::new(|| Regex::new("[\u{a0}\t\u{f8f0}]").expect("valid whitespace pattern"));

static NOISE: Lazy<Regex> = Lazy::new(|| {
    Regex::new("[＠@\u{fffd}■\n\r\u{3000}\u{f038}\u{f037}\u{feff}|~0-9a-z]")
        .expect("valid noise pattern")
});

static ANNOTATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\[(].*?[\])]").expect("valid annotation pattern"));

/// Cleans one line of transcription.
///
/// Maps the non-breaking tsheg to the ordinary one, turns whitespace variants
/// into plain spaces, drops control and placeholder characters together with
/// ASCII digits and lowercase Latin letters, then removes bracketed
/// annotations such as `[illegible]` or `(2)`.
pub fn clean(raw: &str) -> String {
    let text = raw.replace('\u{0F0C}', "\u{0F0B}");
    let text = WHITESPACE_VARIANTS.replace_all(&text, " ");
    let text = NOISE.replace_all(&text, "");
    ANNOTATIONS.replace_all(&text, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_breaking_tsheg_is_canonicalized() {
        assert_eq!(clean("ཀ༌ཁ"), "ཀ་ཁ");
    }

    #[test]
    fn test_noise_is_removed() {
        assert_eq!(clean("ཀ་ཁ་\r\n"), "ཀ་ཁ་");
        assert_eq!(clean("ཀ12abc་ཁ"), "ཀ་ཁ");
        assert_eq!(clean("\u{feff}ཀ|~"), "ཀ");
    }

    #[test]
    fn test_whitespace_variants_become_spaces() {
        assert_eq!(clean("ཀ\u{a0}ཁ\tག"), "ཀ ཁ ག");
    }

    #[test]
    fn test_annotations_are_removed() {
        // digits and letters go first, so the annotation is matched on what remains
        assert_eq!(clean("ཀ་[note]ཁ"), "ཀ་ཁ");
        assert_eq!(clean("ཀ(ཁ)ག"), "ཀག");
        assert_eq!(clean("ཀ[ཁ)ག"), "ཀག");
    }

    #[test]
    fn test_uppercase_latin_is_kept() {
        assert_eq!(clean("ཀX"), "ཀX");
    }
}
