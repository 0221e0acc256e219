//! 0–100 string similarity used for country name matching.
//!
//! The score is a weighted ratio in the style of classic fuzzy-matching
//! libraries: a plain edit-distance ratio, a best-window partial ratio for
//! strings of very different lengths, and token sort / token set ratios so
//! that word order ("Korea, Republic of" vs "Republic of Korea") and extra
//! words are tolerated. The underlying ratio is normalized Levenshtein
//! similarity from `strsim`.

use std::collections::BTreeSet;
use strsim::normalized_levenshtein;

/// Lowercase, replace every non-alphanumeric character by a space and
/// collapse whitespace.
pub fn process(s: &str) -> String {
    let cleaned: String = s
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn round_score(v: f64) -> u8 {
    v.round().clamp(0.0, 100.0) as u8
}

/// Plain edit-distance ratio of two already-processed strings.
pub fn ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    round_score(100.0 * normalized_levenshtein(a, b))
}

/// Best ratio of the shorter string against every equal-length window of the
/// longer one.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let (short, long) = if a.chars().count() <= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let long_chars: Vec<char> = long.chars().collect();
    let width = short.chars().count();

    let mut best = 0;
    for window in long_chars.windows(width) {
        let candidate: String = window.iter().collect();
        best = best.max(ratio(short, &candidate));
        if best == 100 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn scorer(partial: bool) -> fn(&str, &str) -> u8 {
    if partial {
        partial_ratio
    } else {
        ratio
    }
}

pub fn token_sort_ratio(a: &str, b: &str, partial: bool) -> u8 {
    scorer(partial)(&sorted_tokens(a), &sorted_tokens(b))
}

/// Compares the shared tokens with each side's shared-plus-remaining tokens,
/// so a label that is a word subset of a candidate still scores high.
pub fn token_set_ratio(a: &str, b: &str, partial: bool) -> u8 {
    let ta: BTreeSet<&str> = a.split_whitespace().collect();
    let tb: BTreeSet<&str> = b.split_whitespace().collect();

    let join = |set: Vec<&str>| set.join(" ");
    let sect = join(ta.intersection(&tb).copied().collect());
    let only_a = join(ta.difference(&tb).copied().collect());
    let only_b = join(tb.difference(&ta).copied().collect());

    let combined_a = format!("{} {}", sect, only_a).trim().to_string();
    let combined_b = format!("{} {}", sect, only_b).trim().to_string();

    let f = scorer(partial);
    f(&sect, &combined_a)
        .max(f(&sect, &combined_b))
        .max(f(&combined_a, &combined_b))
}

/// Weighted similarity of two raw strings, 0–100.
pub fn score(a: &str, b: &str) -> u8 {
    let p1 = process(a);
    let p2 = process(b);
    if p1.is_empty() || p2.is_empty() {
        return 0;
    }

    let base = ratio(&p1, &p2) as f64;
    let (l1, l2) = (p1.chars().count() as f64, p2.chars().count() as f64);
    let len_ratio = l1.max(l2) / l1.min(l2);

    if len_ratio < 1.5 {
        let tsor = token_sort_ratio(&p1, &p2, false) as f64 * 0.95;
        let tser = token_set_ratio(&p1, &p2, false) as f64 * 0.95;
        return round_score(base.max(tsor).max(tser));
    }

    let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
    let partial = partial_ratio(&p1, &p2) as f64 * partial_scale;
    let ptsor = token_sort_ratio(&p1, &p2, true) as f64 * 0.95 * partial_scale;
    let ptser = token_set_ratio(&p1, &p2, true) as f64 * 0.95 * partial_scale;
    round_score(base.max(partial).max(ptsor).max(ptser))
}
