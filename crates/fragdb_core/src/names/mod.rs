//! Fragment name matching.
//!
//! # Responsibility
//! - Score how similar a query is to a stored fragment name.
//! - Derive the normalized keys used for listing order and search ranking.

pub mod similarity;
pub mod sort_key;

pub use similarity::dice_coefficient_sorted;
pub use sort_key::{make_sort_key, SortKey};

/// Search distance of `query` to `full_name` plus its numeric tie-break.
///
/// Lower scores rank first.
pub fn search_score(query: &str, full_name: &str) -> (f64, String) {
    let key = make_sort_key(full_name, true);
    let score = dice_coefficient_sorted(query, &key.search_text());
    (score, key.digits)
}
