//! Natural ordering of file names, so `page2.jpg` sorts before `page10.jpg`.

use std::cmp::Ordering;
use std::path::Path;

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Text(&'a str),
    Number(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;
    for (i, c) in s.char_indices() {
        let digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != digit => {
                out.push(make_chunk(&s[start..i], prev));
                start = i;
            }
            _ => {}
        }
        in_digits = Some(digit);
    }
    if let Some(digit) = in_digits {
        out.push(make_chunk(&s[start..], digit));
    }
    out
}

fn make_chunk(s: &str, digit: bool) -> Chunk<'_> {
    if digit { Chunk::Number(s) } else { Chunk::Text(s) }
}

fn compare_numbers(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}

/// Compares two strings treating digit runs as numbers. Text runs compare
/// case-insensitively, with the raw strings as the final tie-breaker.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ca, cb) = (chunks(a), chunks(b));
    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Number(x), Chunk::Number(y)) => compare_numbers(x, y),
            (Chunk::Text(x), Chunk::Text(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
            (Chunk::Number(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Number(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len()).then_with(|| a.cmp(b))
}

/// Natural ordering on the file-name component of two paths.
pub fn natural_path_cmp(a: &Path, b: &Path) -> Ordering {
    let name = |p: &Path| {
        p.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    natural_cmp(&name(a), &name(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_sort_by_value() {
        let mut names = vec!["page10.jpg", "page2.jpg", "page1.jpg", "page02b.jpg"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["page1.jpg", "page2.jpg", "page02b.jpg", "page10.jpg"]);
    }

    #[test]
    fn test_text_prefix_and_case() {
        assert_eq!(natural_cmp("Alpha", "alpha2"), Ordering::Less);
        assert_eq!(natural_cmp("b1", "a9"), Ordering::Greater);
        assert_eq!(natural_cmp("x", "x"), Ordering::Equal);
    }

    #[test]
    fn test_leading_zeros_tie_break() {
        assert_eq!(natural_cmp("img1", "img001"), Ordering::Less);
        assert_eq!(natural_cmp("img001", "img2"), Ordering::Less);
    }
}
