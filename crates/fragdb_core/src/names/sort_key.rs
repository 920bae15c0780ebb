//! Sort and search keys for chemical fragment names.
//!
//! Names look like `"1,2-Dichlorobenzene, C6H4Cl2"` or
//! `"tert-Butyl, C4H9"`. Locants and organic prefixes would scatter related
//! names across an alphabetical listing, so the key orders by the bare
//! first word and keeps the locant digits as a secondary key.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static LEADING_LOCANT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9,'()\[\]{}\-+]+").expect("valid locant regex"));

/// Longest first, so `tert-` wins over `t-`.
const ORGANIC_PREFIXES: &[&str] = &[
    "n,n,n-", "tert-", "tris-", "mono-", "n,n-", "sec-", "iso-", "bis-", "n-", "o-", "m-", "p-",
    "t-", "i-",
];

/// Normalized key of a fragment name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SortKey {
    /// Bare lowercase first word; with `searchkey` also the rest of the name.
    pub text: String,
    /// Digits of the first word, e.g. `"12"` for `1,2-...`.
    pub digits: String,
}

impl SortKey {
    /// String the search score is computed against.
    pub fn search_text(&self) -> String {
        format!("{}{}", self.text, self.digits)
    }
}

/// Builds the ordering key of `full_name`.
///
/// With `searchkey = true` the remainder of the name (sum formula, tags) is
/// appended after one space so queries can match it as well.
pub fn make_sort_key(full_name: &str, searchkey: bool) -> SortKey {
    let lowered = full_name.trim().to_lowercase();
    let (lead, rest) = match lowered.split_once(char::is_whitespace) {
        Some((lead, rest)) => (lead, rest.trim()),
        None => (lowered.as_str(), ""),
    };

    let digits = lead.chars().filter(char::is_ascii_digit).collect::<String>();
    let without_locant = LEADING_LOCANT_RE.replace(lead, "");
    let without_prefix = strip_organic_prefix(&without_locant);
    let mut text = without_prefix
        .chars()
        .filter(|c| c.is_alphabetic())
        .collect::<String>();

    if searchkey && !rest.is_empty() {
        text.push(' ');
        text.push_str(rest);
    }

    SortKey { text, digits }
}

fn strip_organic_prefix(word: &str) -> &str {
    ORGANIC_PREFIXES
        .iter()
        .find_map(|prefix| word.strip_prefix(*prefix))
        .unwrap_or(word)
}
