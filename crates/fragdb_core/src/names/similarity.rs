//! Bigram similarity between fragment names.
//!
//! Scores are distances: `0.0` means identical, `1.0` means nothing in
//! common (or not comparable). Only the multiset variant of the Dice
//! coefficient exists here; repeated bigrams count as often as they occur.

/// Dice distance over sorted lowercase bigram multisets.
///
/// - Inputs shorter than two characters cannot be compared and score `1.0`.
/// - Case-insensitive equality scores `0.0`.
/// - Otherwise `1 - 2 * matches / (bigrams(a) + bigrams(b))`, rounded to
///   six decimals.
pub fn dice_coefficient_sorted(a: &str, b: &str) -> f64 {
    let a = a.to_lowercase();
    let b = b.to_lowercase();

    let a_bigrams = sorted_bigrams(&a);
    let b_bigrams = sorted_bigrams(&b);
    if a_bigrams.is_empty() || b_bigrams.is_empty() {
        return 1.0;
    }
    if a == b {
        return 0.0;
    }

    let matches = count_common(&a_bigrams, &b_bigrams);
    let total = (a_bigrams.len() + b_bigrams.len()) as f64;
    round6(1.0 - 2.0 * matches as f64 / total)
}

fn sorted_bigrams(text: &str) -> Vec<(char, char)> {
    let chars = text.chars().collect::<Vec<_>>();
    let mut bigrams = chars
        .windows(2)
        .map(|pair| (pair[0], pair[1]))
        .collect::<Vec<_>>();
    bigrams.sort_unstable();
    bigrams
}

fn count_common(a: &[(char, char)], b: &[(char, char)]) -> usize {
    let (mut i, mut j, mut matches) = (0, 0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Equal => {
                matches += 1;
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    matches
}

fn round6(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}
