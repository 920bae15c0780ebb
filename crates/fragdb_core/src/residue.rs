//! Residue class and residue number helpers.

/// Longest residue class SHELX accepts.
pub const MAX_RESIDUE_CLASS_LEN: usize = 4;

/// Coerces user input into a residue class.
///
/// Input that does not start with a letter becomes empty; longer input is
/// cut to four characters.
pub fn normalize_residue_class(input: &str) -> String {
    let trimmed = input.trim();
    match trimmed.chars().next() {
        Some(first) if first.is_ascii_alphabetic() => {
            trimmed.chars().take(MAX_RESIDUE_CLASS_LEN).collect()
        }
        _ => String::new(),
    }
}

/// `true` for one to four ASCII alphanumerics starting with a letter.
pub fn is_valid_residue_class(class: &str) -> bool {
    let mut chars = class.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    first.is_ascii_alphabetic()
        && class.chars().count() <= MAX_RESIDUE_CLASS_LEN
        && chars.all(|c| c.is_ascii_alphanumeric())
}

/// First residue number not used in `used`.
///
/// Fills the first gap in `1..`, otherwise continues after the highest
/// number. Residue 0 (no residue) is ignored.
pub fn next_free_residue_number(used: &[u32]) -> u32 {
    let mut numbers = used.iter().copied().filter(|n| *n > 0).collect::<Vec<_>>();
    numbers.sort_unstable();
    numbers.dedup();

    let mut expected = 1;
    for number in numbers {
        if number != expected {
            return expected;
        }
        expected += 1;
    }
    expected
}
