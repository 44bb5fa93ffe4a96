//! Normalized edit-distance similarity between two lines.
//!
//! This is the HOT PATH of alignment: the aligner scores every candidate
//! pair through `similarity`, so the distance computation avoids allocating
//! a full matrix.

/// Levenshtein distance counted in `char`s (insert, delete, substitute = 1).
pub fn levenshtein(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    // Shared prefix and suffix never contribute edits
    let prefix = a_chars
        .iter()
        .zip(b_chars.iter())
        .take_while(|(x, y)| x == y)
        .count();
    let a_rest = &a_chars[prefix..];
    let b_rest = &b_chars[prefix..];
    let suffix = a_rest
        .iter()
        .rev()
        .zip(b_rest.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let a_core = &a_rest[..a_rest.len() - suffix];
    let b_core = &b_rest[..b_rest.len() - suffix];

    edit_distance(a_core, b_core)
}

/// Two-row Levenshtein DP over char slices.
#[inline]
fn edit_distance(a: &[char], b: &[char]) -> usize {
    // Keep the row on the shorter side
    let (long, short) = if a.len() >= b.len() { (a, b) } else { (b, a) };
    let n = short.len();

    if n == 0 {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for (i, &lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        for j in 1..=n {
            let cost = if lc == short[j - 1] { 0 } else { 1 };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Similarity ratio in [0, 1]: `(len(a) + len(b) - distance) / (len(a) + len(b))`.
///
/// Two empty strings are identical (1.0). Only a comparison against the
/// empty string scores 0; disjoint strings of equal length score 0.5.
#[inline]
pub fn similarity(a: &str, b: &str) -> f64 {
    let total = a.chars().count() + b.chars().count();
    if total == 0 {
        return 1.0;
    }
    let distance = levenshtein(a, b);
    (total - distance) as f64 / total as f64
}
