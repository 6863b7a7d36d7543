//! Extended Wylie (EWTS) transliteration of Tibetan script.
//!
//! Covers the letters, vowel signs, nasal and visarga marks, digits and the
//! common punctuation of classical Tibetan. Anything outside those tables is
//! copied through unchanged in both directions, so conversion never fails.
//!
//! The writer inserts `.` and `+` wherever a plain concatenation would be read
//! back as a different stack, which makes [`to_unicode`] the exact inverse of
//! [`to_wylie`] for text made of the supported characters.
//!
//! ```rust
//! use tibetan_ocr::text::wylie::{to_unicode, to_wylie};
//!
//! assert_eq!(to_wylie("བཀྲ་ཤིས"), "bkra shis");
//! assert_eq!(to_unicode("bkra shis"), "བཀྲ་ཤིས");
//! ```

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Offset from a base consonant to its subjoined form.
const SUBJOIN_OFFSET: u32 = 0x50;

/// The vowel carrier letter.
const ACHEN: char = '\u{0F68}';

const CONSONANTS: &[(&str, char)] = &[
    ("k", '\u{0F40}'),
    ("kh", '\u{0F41}'),
    ("g", '\u{0F42}'),
    ("ng", '\u{0F44}'),
    ("c", '\u{0F45}'),
    ("ch", '\u{0F46}'),
    ("j", '\u{0F47}'),
    ("ny", '\u{0F49}'),
    ("T", '\u{0F4A}'),
    ("Th", '\u{0F4B}'),
    ("D", '\u{0F4C}'),
    ("N", '\u{0F4E}'),
    ("t", '\u{0F4F}'),
    ("th", '\u{0F50}'),
    ("d", '\u{0F51}'),
    ("n", '\u{0F53}'),
    ("p", '\u{0F54}'),
    ("ph", '\u{0F55}'),
    ("b", '\u{0F56}'),
    ("m", '\u{0F58}'),
    ("ts", '\u{0F59}'),
    ("tsh", '\u{0F5A}'),
    ("dz", '\u{0F5B}'),
    ("w", '\u{0F5D}'),
    ("zh", '\u{0F5E}'),
    ("z", '\u{0F5F}'),
    ("'", '\u{0F60}'),
    ("y", '\u{0F61}'),
    ("r", '\u{0F62}'),
    ("l", '\u{0F63}'),
    ("sh", '\u{0F64}'),
    ("Sh", '\u{0F65}'),
    ("s", '\u{0F66}'),
    ("h", '\u{0F67}'),
];

/// Vowel spellings and the signs they stand for. `a` is the inherent vowel.
const VOWELS: &[(&str, &[char])] = &[
    ("a", &[]),
    ("A", &['\u{0F71}']),
    ("i", &['\u{0F72}']),
    ("I", &['\u{0F71}', '\u{0F72}']),
    ("u", &['\u{0F74}']),
    ("U", &['\u{0F71}', '\u{0F74}']),
    ("e", &['\u{0F7A}']),
    ("ai", &['\u{0F7B}']),
    ("o", &['\u{0F7C}']),
    ("au", &['\u{0F7D}']),
    ("-i", &['\u{0F80}']),
    ("-I", &['\u{0F71}', '\u{0F80}']),
];

const MARKS: &[(&str, char)] = &[
    ("M", '\u{0F7E}'),
    ("H", '\u{0F7F}'),
    ("~M`", '\u{0F82}'),
    ("~M", '\u{0F83}'),
];

const SYMBOLS: &[(&str, char)] = &[
    (" ", '\u{0F0B}'),
    ("*", '\u{0F0C}'),
    ("_", ' '),
    ("/", '\u{0F0D}'),
    (";", '\u{0F0F}'),
    ("|", '\u{0F11}'),
    ("!", '\u{0F08}'),
    (":", '\u{0F14}'),
    ("@", '\u{0F04}'),
    ("#", '\u{0F05}'),
    ("$", '\u{0F06}'),
    ("%", '\u{0F07}'),
    ("=", '\u{0F12}'),
    ("<", '\u{0F3A}'),
    (">", '\u{0F3B}'),
    ("(", '\u{0F3C}'),
    (")", '\u{0F3D}'),
    ("0", '\u{0F20}'),
    ("1", '\u{0F21}'),
    ("2", '\u{0F22}'),
    ("3", '\u{0F23}'),
    ("4", '\u{0F24}'),
    ("5", '\u{0F25}'),
    ("6", '\u{0F26}'),
    ("7", '\u{0F27}'),
    ("8", '\u{0F28}'),
    ("9", '\u{0F29}'),
];

/// Stacks written without `+`.
const STANDARD_STACKS: &[&str] = &[
    // ra, la and sa headed
    "rk", "rg", "rng", "rj", "rny", "rt", "rd", "rn", "rb", "rm", "rts", "rdz", "rky", "rgy",
    "rmy", "rgw", "rtsw", "lk", "lg", "lng", "lc", "lj", "lt", "ld", "lp", "lb", "lh", "sk",
    "sg", "sng", "sny", "st", "sd", "sn", "sp", "sb", "sm", "sts", "sky", "sgy", "spy", "sby",
    "smy", "skr", "sgr", "snr", "spr", "sbr", "smr",
    // ya and ra subjoined
    "ky", "khy", "gy", "py", "phy", "by", "my", "hy", "kr", "khr", "gr", "tr", "thr", "dr", "pr",
    "phr", "br", "mr", "shr", "sr", "hr",
    // la subjoined
    "kl", "gl", "bl", "zl", "rl", "sl",
    // wa subjoined
    "kw", "khw", "gw", "cw", "nyw", "tw", "dw", "tsw", "tshw", "zhw", "zw", "rw", "lw", "shw",
    "sw", "hw", "grw", "phyw",
];

/// Letters that may precede the root letter.
const PREFIXES: &[&str] = &["g", "d", "b", "m", "'"];

/// Letters that may follow the root letter.
const SUFFIXES: &[&str] = &["g", "ng", "d", "n", "b", "m", "'", "r", "l", "s"];

static BASE_BY_CHAR: Lazy<HashMap<char, &'static str>> =
    Lazy::new(|| CONSONANTS.iter().map(|&(w, c)| (c, w)).collect());

static SUBJOINED_BY_CHAR: Lazy<HashMap<char, &'static str>> = Lazy::new(|| {
    CONSONANTS
        .iter()
        .filter_map(|&(w, c)| char::from_u32(c as u32 + SUBJOIN_OFFSET).map(|s| (s, w)))
        .collect()
});

static CHAR_BY_CONSONANT: Lazy<HashMap<&'static str, char>> =
    Lazy::new(|| CONSONANTS.iter().copied().collect());

static SYMBOL_BY_CHAR: Lazy<HashMap<char, &'static str>> =
    Lazy::new(|| SYMBOLS.iter().map(|&(w, c)| (c, w)).collect());

static MARK_BY_CHAR: Lazy<HashMap<char, &'static str>> =
    Lazy::new(|| MARKS.iter().map(|&(w, c)| (c, w)).collect());

/// Consonant spellings, longest first, for greedy tokenizing.
static CONSONANT_TOKENS: Lazy<Vec<&'static str>> = Lazy::new(|| {
    let mut tokens: Vec<&'static str> = CONSONANTS.iter().map(|&(w, _)| w).collect();
    tokens.sort_by_key(|t| std::cmp::Reverse(t.chars().count()));
    tokens
});

static VOWEL_TOKENS: Lazy<Vec<(&'static str, &'static [char])>> = Lazy::new(|| {
    let mut tokens = VOWELS.to_vec();
    tokens.sort_by_key(|(w, _)| std::cmp::Reverse(w.chars().count()));
    tokens
});

static MARK_TOKENS: Lazy<Vec<(&'static str, char)>> = Lazy::new(|| {
    let mut tokens = MARKS.to_vec();
    tokens.sort_by_key(|(w, _)| std::cmp::Reverse(w.chars().count()));
    tokens
});

static STACK_SET: Lazy<HashSet<Vec<&'static str>>> = Lazy::new(|| {
    STANDARD_STACKS
        .iter()
        .filter_map(|s| tokenize_consonants(s))
        .collect()
});

fn is_vowel_sign(c: char) -> bool {
    matches!(
        c,
        '\u{0F71}' | '\u{0F72}' | '\u{0F74}' | '\u{0F7A}'..='\u{0F7D}' | '\u{0F80}'
    )
}

fn is_standard_stack(letters: &[&'static str]) -> bool {
    letters.len() == 1 || STACK_SET.contains(letters)
}

/// Splits a run of consonant spellings greedily, longest match first.
fn tokenize_consonants(text: &str) -> Option<Vec<&'static str>> {
    let mut rest = text;
    let mut tokens = Vec::new();
    while !rest.is_empty() {
        let token = CONSONANT_TOKENS.iter().find(|t| rest.starts_with(**t))?;
        tokens.push(*token);
        rest = &rest[token.len()..];
    }
    Some(tokens)
}

/// Length of the longest stack a reader would form at the end of `run`.
fn longest_stack_suffix(run: &[&'static str]) -> usize {
    (1..=run.len())
        .rev()
        .find(|&k| is_standard_stack(&run[run.len() - k..]))
        .unwrap_or(1)
}

/// One consonant stack read from Tibetan script.
#[derive(Debug, Default)]
struct Stack {
    letters: Vec<&'static str>,
    vowel: Option<&'static str>,
    marks: Vec<&'static str>,
    /// Signs that have no spelling in this position, copied through.
    trailing: String,
    source: String,
}

impl Stack {
    fn is_achen(&self) -> bool {
        self.letters.first() == Some(&"a")
    }

    fn has_vowel(&self) -> bool {
        self.vowel.is_some() || !self.marks.is_empty()
    }
}

enum Segment {
    Syllable(Vec<Stack>),
    Text(String),
}

/// Converts Tibetan script to EWTS.
pub fn to_wylie(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in segment_unicode(text) {
        match segment {
            Segment::Syllable(stacks) => write_syllable(&stacks, &mut out),
            Segment::Text(t) => out.push_str(&t),
        }
    }
    out
}

fn segment_unicode(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut syllable: Vec<Stack> = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        let base = if c == ACHEN {
            Some("a")
        } else {
            BASE_BY_CHAR.get(&c).copied()
        };
        let Some(base) = base else {
            if !syllable.is_empty() {
                segments.push(Segment::Syllable(std::mem::take(&mut syllable)));
            }
            let mapped = SYMBOL_BY_CHAR
                .get(&c)
                .map(|s| s.to_string())
                .unwrap_or_else(|| c.to_string());
            segments.push(Segment::Text(mapped));
            continue;
        };

        let mut stack = Stack {
            letters: vec![base],
            source: c.to_string(),
            ..Stack::default()
        };
        while let Some(&next) = chars.peek() {
            let Some(sub) = SUBJOINED_BY_CHAR.get(&next) else {
                break;
            };
            stack.letters.push(*sub);
            stack.source.push(next);
            chars.next();
        }

        let mut signs = Vec::new();
        while let Some(&next) = chars.peek() {
            if !is_vowel_sign(next) {
                break;
            }
            signs.push(next);
            stack.source.push(next);
            chars.next();
        }
        if !signs.is_empty() {
            let matched = VOWEL_TOKENS
                .iter()
                .filter(|(_, s)| !s.is_empty() && signs.starts_with(s))
                .max_by_key(|(_, s)| s.len());
            match matched {
                Some((spelling, s)) => {
                    stack.vowel = Some(*spelling);
                    stack.trailing.extend(&signs[s.len()..]);
                }
                None => stack.trailing.extend(&signs),
            }
        }

        while let Some(&next) = chars.peek() {
            let Some(mark) = MARK_BY_CHAR.get(&next) else {
                break;
            };
            if stack.trailing.is_empty() {
                stack.marks.push(*mark);
            } else {
                stack.trailing.push(next);
            }
            stack.source.push(next);
            chars.next();
        }

        syllable.push(stack);
    }
    if !syllable.is_empty() {
        segments.push(Segment::Syllable(syllable));
    }
    segments
}

/// Index of the stack that takes an explicit `a` because the syllable has no
/// written vowel on its root letter.
fn root_index(stacks: &[Stack]) -> Option<usize> {
    let voweled: Vec<usize> = (0..stacks.len()).filter(|&i| stacks[i].has_vowel()).collect();
    match voweled.as_slice() {
        [] if !stacks.is_empty() => Some(implicit_root(stacks)),
        // genitive and similar endings: the vowel sits on a final 'a-chung
        [last]
            if *last == stacks.len() - 1
                && *last > 0
                && stacks[*last].letters.as_slice() == ["'"] =>
        {
            Some(implicit_root(&stacks[..*last]))
        }
        _ => None,
    }
}

fn implicit_root(stacks: &[Stack]) -> usize {
    let single = |i: usize| stacks[i].letters.len() == 1;
    let letter = |i: usize| stacks[i].letters[0];
    let prefixed = single(0) && PREFIXES.contains(&letter(0));
    match stacks.len() {
        0 | 1 => 0,
        2 => {
            if !single(1) || (prefixed && !SUFFIXES.contains(&letter(1))) {
                1
            } else {
                0
            }
        }
        3 => {
            if !single(1) || (prefixed && single(2) && SUFFIXES.contains(&letter(2))) {
                1
            } else {
                0
            }
        }
        _ => {
            if prefixed || !single(1) {
                1
            } else {
                0
            }
        }
    }
}

fn write_syllable(stacks: &[Stack], out: &mut String) {
    let root = root_index(stacks);
    // consonants written since the last vowel or separator
    let mut run: Vec<&'static str> = Vec::new();

    for (i, stack) in stacks.iter().enumerate() {
        if stack.is_achen() {
            if stack.letters.len() > 1 {
                out.push_str(&stack.source);
                run.clear();
                continue;
            }
            if i > 0 {
                out.push('.');
            }
            out.push_str(stack.vowel.unwrap_or("a"));
            stack.marks.iter().for_each(|m| out.push_str(m));
            out.push_str(&stack.trailing);
            run.clear();
            continue;
        }

        let carries_vowel = stack.has_vowel() || stack.letters.len() > 1 || root == Some(i);
        let standard = is_standard_stack(&stack.letters);

        if !run.is_empty() {
            let mut expected = run.clone();
            expected.extend(stack.letters.iter().copied());
            let joined: String = expected.concat();
            let merges = tokenize_consonants(&joined).as_ref() != Some(&expected);
            let absorbs =
                carries_vowel && standard && longest_stack_suffix(&expected) > stack.letters.len();
            if merges || absorbs {
                out.push('.');
                run.clear();
            }
        }

        if standard {
            out.push_str(&stack.letters.concat());
        } else {
            out.push_str(&stack.letters.join("+"));
        }

        if carries_vowel {
            out.push_str(stack.vowel.unwrap_or("a"));
            stack.marks.iter().for_each(|m| out.push_str(m));
            run.clear();
        } else {
            run.extend(stack.letters.iter().copied());
        }

        if !stack.trailing.is_empty() {
            out.push_str(&stack.trailing);
            run.clear();
        }
    }
}

/// A group of consonants read from EWTS before its vowel is known.
struct Group {
    letters: Vec<&'static str>,
    forced: bool,
}

/// Converts EWTS to Tibetan script.
pub fn to_unicode(text: &str) -> String {
    let mut out = String::with_capacity(text.len() * 3);
    let mut run: Vec<Group> = Vec::new();
    let mut join_next = false;
    let mut rest = text;

    while let Some(c) = rest.chars().next() {
        if let Some(token) = CONSONANT_TOKENS.iter().find(|t| rest.starts_with(**t)) {
            match run.last_mut() {
                Some(group) if join_next => {
                    group.letters.push(*token);
                    group.forced = true;
                }
                _ => run.push(Group {
                    letters: vec![*token],
                    forced: false,
                }),
            }
            join_next = false;
            rest = &rest[token.len()..];
            continue;
        }
        join_next = false;

        if c == '+' {
            join_next = !run.is_empty();
            rest = &rest[1..];
            continue;
        }

        if let Some((spelling, signs)) = VOWEL_TOKENS.iter().find(|(w, _)| rest.starts_with(*w)) {
            write_vowel_stack(&mut run, signs, &mut out);
            rest = &rest[spelling.len()..];
            continue;
        }

        flush_run(&mut run, &mut out);

        if let Some((spelling, mark)) = MARK_TOKENS.iter().find(|(w, _)| rest.starts_with(*w)) {
            out.push(*mark);
            rest = &rest[spelling.len()..];
            continue;
        }

        if c == '.' {
            rest = &rest[1..];
            continue;
        }

        if let Some((spelling, symbol)) = SYMBOLS.iter().find(|(w, _)| rest.starts_with(*w)) {
            out.push(*symbol);
            rest = &rest[spelling.len()..];
            continue;
        }

        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    flush_run(&mut run, &mut out);
    out
}

fn push_stack(letters: &[&'static str], out: &mut String) {
    for (i, letter) in letters.iter().enumerate() {
        let Some(&base) = CHAR_BY_CONSONANT.get(letter) else {
            continue;
        };
        if i == 0 {
            out.push(base);
        } else if let Some(sub) = char::from_u32(base as u32 + SUBJOIN_OFFSET) {
            out.push(sub);
        }
    }
}

fn flush_run(run: &mut Vec<Group>, out: &mut String) {
    for group in run.drain(..) {
        push_stack(&group.letters, out);
    }
}

fn write_vowel_stack(run: &mut Vec<Group>, signs: &[char], out: &mut String) {
    if run.is_empty() {
        out.push(ACHEN);
        out.extend(signs);
        return;
    }

    let forced_tail = run.last().is_some_and(|g| g.forced);
    let head: Vec<Group> = if forced_tail {
        let tail_start = run.len() - 1;
        run.drain(..tail_start).collect()
    } else {
        let singles_start = run
            .iter()
            .rposition(|g| g.forced)
            .map(|p| p + 1)
            .unwrap_or(0);
        let singles: Vec<&'static str> = run[singles_start..]
            .iter()
            .map(|g| g.letters[0])
            .collect();
        let take = longest_stack_suffix(&singles);
        let tail_start = run.len() - take;
        let head: Vec<Group> = run.drain(..tail_start).collect();
        let letters: Vec<&'static str> = run.drain(..).flat_map(|g| g.letters).collect();
        run.push(Group {
            letters,
            forced: false,
        });
        head
    };

    for group in &head {
        push_stack(&group.letters, out);
    }
    for group in run.drain(..) {
        push_stack(&group.letters, out);
    }
    out.extend(signs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_syllables() {
        assert_eq!(to_wylie("བཀྲ་ཤིས"), "bkra shis");
        assert_eq!(to_wylie("བདེ་ལེགས།"), "bde legs/");
        assert_eq!(to_wylie("སྒྲུབ"), "sgrub");
        assert_eq!(to_wylie("ཀ"), "ka");
        assert_eq!(to_wylie("པའི"), "pa'i");
        assert_eq!(to_wylie("དཔལ"), "dpal");
        assert_eq!(to_wylie("བརྒྱད"), "brgyad");
    }

    #[test]
    fn test_prefix_ambiguity_uses_dot() {
        assert_eq!(to_wylie("གཡ"), "g.ya");
        assert_eq!(to_unicode("g.ya"), "གཡ");
        assert_eq!(to_unicode("gya"), "གྱ");
    }

    #[test]
    fn test_achen_vowels_and_marks() {
        assert_eq!(to_wylie("ཨོཾ"), "oM");
        assert_eq!(to_unicode("oM"), "ཨོཾ");
        assert_eq!(to_wylie("ཧཱུྃ"), "hU~M");
    }

    #[test]
    fn test_non_standard_stack_uses_plus() {
        let text = "པདྨེ";
        let wylie = to_wylie(text);
        assert!(wylie.contains('+'), "{wylie}");
        assert_eq!(to_unicode(&wylie), text);
    }

    #[test]
    fn test_digits_and_spaces() {
        assert_eq!(to_wylie("༡༢ ཀ"), "12_ka");
        assert_eq!(to_unicode("12_ka"), "༡༢ ཀ");
    }

    #[test]
    fn test_unknown_characters_pass_through() {
        assert_eq!(to_unicode("ka?"), "ཀ?");
        assert_eq!(to_wylie("ཀ?"), "ka?");
    }

    #[test]
    fn test_round_trip_sentences() {
        let samples = [
            "བཀྲ་ཤིས་བདེ་ལེགས།",
            "བསྒྲུབས་པའི་ཆོས་ཀྱི་རྒྱལ་པོ།",
            "ཨོཾ་མ་ཎི་པདྨེ་ཧཱུྃ།",
            "དཔལ་ལྡན་བླ་མ་དམ་པ།",
            "བརྒྱད་བསྟན་འགྲོ་གཡུ་",
            "མངའ་རིས་དབུས་གཙང་",
            "ཀྱེ་རྡོ་རྗེ་སེམས་དཔའ་",
            "ཐུགས་རྗེ་ཆེན་པོ་ཨ་ཨི་",
        ];
        for sample in samples {
            let wylie = to_wylie(sample);
            assert_eq!(to_unicode(&wylie), sample, "via {wylie}");
        }
    }

    #[test]
    fn test_merging_consonants_are_separated() {
        // ས followed by ཧ must not read back as ཤ
        let text = "གསཧི";
        let wylie = to_wylie(text);
        assert_eq!(wylie, "gs.hi");
        assert_eq!(to_unicode(&wylie), text);
        let text = "ནག";
        assert_eq!(to_unicode(&to_wylie(text)), text);
    }
}
