//! Range shorthand expansion.
//!
//! `C1 > C4` means every atom from `C1` up to `C4` in declaration order;
//! `C4 < C1` counts the same stretch downwards. Endpoints stay where they
//! are and only the operator token is replaced.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Range operator that cannot be expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeError {
    /// Operator at `position` has no atom token on one side.
    DanglingOperator { position: usize, operator: String },
    /// Endpoint is not an atom of the fragment.
    UnknownEndpoint { name: String },
}

impl Display for RangeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingOperator { position, operator } => write!(
                f,
                "range operator `{operator}` at token {} needs an atom on both sides",
                position + 1
            ),
            Self::UnknownEndpoint { name } => {
                write!(f, "range endpoint `{name}` is not an atom of this fragment")
            }
        }
    }
}

impl Error for RangeError {}

/// Expands every `>` and `<` in `tokens` against `atom_order`.
///
/// Each operator is resolved against the original token list, so several
/// ranges in one line do not influence each other. Endpoint lookup ignores
/// case; expanded names use the spelling of `atom_order`. Endpoints in the
/// wrong order for their operator expand to nothing between them.
pub fn resolve_ranges(tokens: &[String], atom_order: &[String]) -> Result<Vec<String>, RangeError> {
    let mut resolved = Vec::with_capacity(tokens.len());

    for (position, token) in tokens.iter().enumerate() {
        let forward = match token.as_str() {
            ">" => true,
            "<" => false,
            _ => {
                resolved.push(token.clone());
                continue;
            }
        };

        let dangling = || RangeError::DanglingOperator {
            position,
            operator: token.clone(),
        };
        let before = position
            .checked_sub(1)
            .and_then(|index| tokens.get(index))
            .filter(|name| is_atom_token(name))
            .ok_or_else(dangling)?;
        let after = tokens
            .get(position + 1)
            .filter(|name| is_atom_token(name))
            .ok_or_else(dangling)?;

        let before_index = index_of(atom_order, before)?;
        let after_index = index_of(atom_order, after)?;

        if forward {
            if before_index < after_index {
                resolved.extend_from_slice(&atom_order[before_index + 1..after_index]);
            }
        } else if after_index < before_index {
            resolved.extend(atom_order[after_index + 1..before_index].iter().rev().cloned());
        }
    }

    Ok(resolved)
}

fn is_atom_token(token: &str) -> bool {
    token != ">" && token != "<" && token.parse::<f64>().is_err()
}

fn index_of(atom_order: &[String], name: &str) -> Result<usize, RangeError> {
    atom_order
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(name))
        .ok_or_else(|| RangeError::UnknownEndpoint {
            name: name.to_string(),
        })
}
