//! Parsing of user-supplied text: fragment ids, unit cells and atom lines.
//!
//! # Invariants
//! - Errors carry the 1-based line and field that failed.
//! - Parsed atoms keep their input order.

use crate::geometry::UnitCell;
use crate::model::fragment::FragmentAtom;
use crate::model::id::{FragmentId, IdError};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fields kept of an atom line: name, SFAC number, x, y, z.
const ATOM_FIELDS: usize = 5;

pub type InputResult<T> = Result<T, InputError>;

#[derive(Debug, Clone, PartialEq)]
pub enum InputError {
    InvalidId(String),
    Id(IdError),
    CellFieldCount { found: usize },
    CellValue { field: usize, value: String },
    AtomFieldCount { line: usize, found: usize },
    AtomName { line: usize, value: String },
    AtomCoordinate { line: usize, field: usize, value: String },
}

impl Display for InputError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(value) => write!(f, "`{value}` is not a fragment id"),
            Self::Id(err) => write!(f, "{err}"),
            Self::CellFieldCount { found } => {
                write!(f, "unit cell needs 6 parameters, found {found}")
            }
            Self::CellValue { field, value } => {
                write!(f, "unit cell parameter {field} is invalid: `{value}`")
            }
            Self::AtomFieldCount { line, found } => write!(
                f,
                "line {line}: atom needs {ATOM_FIELDS} fields (name sfac x y z), found {found}"
            ),
            Self::AtomName { line, value } => {
                write!(f, "line {line}: atom name `{value}` must start with a letter")
            }
            Self::AtomCoordinate { line, field, value } => {
                write!(f, "line {line}: field {field} is not a number: `{value}`")
            }
        }
    }
}

impl Error for InputError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Id(err) => Some(err),
            _ => None,
        }
    }
}

impl From<IdError> for InputError {
    fn from(value: IdError) -> Self {
        Self::Id(value)
    }
}

/// Parses a public fragment id such as `"17"` or `"1000003"`.
pub fn parse_fragment_id(input: &str) -> InputResult<FragmentId> {
    let trimmed = input.trim();
    let public = trimmed
        .parse::<i64>()
        .map_err(|_| InputError::InvalidId(trimmed.to_string()))?;
    Ok(FragmentId::from_public(public)?)
}

/// Parses `a b c alpha beta gamma`, separated by whitespace or commas.
pub fn parse_unit_cell(input: &str) -> InputResult<UnitCell> {
    let fields = input
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|field| !field.is_empty())
        .collect::<Vec<_>>();
    if fields.len() != 6 {
        return Err(InputError::CellFieldCount {
            found: fields.len(),
        });
    }

    let mut values = [0.0; 6];
    for (index, field) in fields.iter().enumerate() {
        let invalid = || InputError::CellValue {
            field: index + 1,
            value: field.to_string(),
        };
        let value = field.parse::<f64>().map_err(|_| invalid())?;
        let plausible = if index < 3 {
            value > 0.0
        } else {
            value > 0.0 && value < 180.0
        };
        if !value.is_finite() || !plausible {
            return Err(invalid());
        }
        values[index] = value;
    }
    Ok(UnitCell::from_array(values))
}

/// Parses SHELX atom lines `Name SFAC x y z [occ U...]`.
///
/// A line ending in `=` continues on the next line. Only the first five
/// fields are kept; the SFAC field becomes [`FragmentAtom::element`].
/// Coordinates are returned as written, fractional or cartesian.
pub fn parse_atom_lines(input: &str) -> InputResult<Vec<FragmentAtom>> {
    let mut atoms = Vec::new();
    for (line, fields) in logical_lines(input) {
        if fields.is_empty() {
            continue;
        }
        if fields.len() < ATOM_FIELDS {
            return Err(InputError::AtomFieldCount {
                line,
                found: fields.len(),
            });
        }

        let name = fields[0];
        if !name.starts_with(|c: char| c.is_alphabetic()) {
            return Err(InputError::AtomName {
                line,
                value: name.to_string(),
            });
        }

        let mut position = [0.0; 3];
        for (axis, field) in fields[2..ATOM_FIELDS].iter().enumerate() {
            position[axis] = field
                .parse::<f64>()
                .ok()
                .filter(|value| value.is_finite())
                .ok_or_else(|| InputError::AtomCoordinate {
                    line,
                    field: axis + 3,
                    value: field.to_string(),
                })?;
        }
        atoms.push(FragmentAtom::new(name, fields[1], position));
    }
    Ok(atoms)
}

/// Joins `=` continuations. Yields the first physical line number with the
/// fields of the logical line.
fn logical_lines(input: &str) -> Vec<(usize, Vec<&str>)> {
    let mut lines = Vec::new();
    let mut current: Option<(usize, Vec<&str>)> = None;

    for (index, raw) in input.lines().enumerate() {
        let trimmed = raw.trim_end();
        let (body, continues) = match trimmed.strip_suffix('=') {
            Some(body) => (body, true),
            None => (trimmed, false),
        };

        let entry = current.get_or_insert_with(|| (index + 1, Vec::new()));
        entry.1.extend(body.split_whitespace());
        if !continues {
            lines.extend(current.take());
        }
    }
    lines.extend(current);
    lines
}
