//! Fragment domain records.
//!
//! # Responsibility
//! - Define the fragment, atom and restraint shapes shared by the store,
//!   the restraint checks and the query facade.
//! - Validate write-side invariants before anything reaches SQL.
//!
//! # Invariants
//! - A fragment exclusively owns its atoms and restraints.
//! - Atom coordinates are cartesian Å in the fragment-local frame.
//! - `name` is never empty; `residue_class` is empty or at most four
//!   alphanumeric characters starting with a letter.

use crate::model::id::FragmentId;
use crate::residue::is_valid_residue_class;
use crate::restraints::RestraintLine;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One atom row of a fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentAtom {
    /// Atom label, e.g. `C1`.
    pub name: String,
    /// Element as stored: atomic number or symbol, depending on the source.
    pub element: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl FragmentAtom {
    pub fn new(name: impl Into<String>, element: impl Into<String>, position: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            element: element.into(),
            x: position[0],
            y: position[1],
            z: position[2],
        }
    }

    pub fn position(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

/// Stored restraint row: keyword plus the free-text atom list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestraintRecord {
    pub card: String,
    pub atom_spec: String,
}

impl RestraintRecord {
    pub fn new(card: impl Into<String>, atom_spec: impl Into<String>) -> Self {
        Self {
            card: card.into(),
            atom_spec: atom_spec.into(),
        }
    }

    /// Reassembles the restraint as one instruction line.
    pub fn to_line(&self) -> String {
        if self.atom_spec.trim().is_empty() {
            self.card.clone()
        } else {
            format!("{} {}", self.card, self.atom_spec)
        }
    }
}

/// Fragment row without child collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentMeta {
    pub id: FragmentId,
    pub name: String,
    pub residue_class: String,
    pub reference: Option<String>,
    pub comment: Option<String>,
}

/// Fully loaded fragment as returned by the query facade.
#[derive(Debug, Clone, PartialEq)]
pub struct FragmentRecord {
    pub meta: FragmentMeta,
    pub atoms: Vec<FragmentAtom>,
    pub restraints: Vec<RestraintRecord>,
}

impl FragmentRecord {
    /// Atom labels in declaration order.
    pub fn atom_names(&self) -> Vec<String> {
        self.atoms.iter().map(|atom| atom.name.clone()).collect()
    }
}

/// Write model for a fragment that does not exist yet.
///
/// Coordinates must already be cartesian; fractional input is converted by
/// the query facade before a `NewFragment` is built.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewFragment {
    pub name: String,
    pub atoms: Vec<FragmentAtom>,
    pub residue_class: String,
    pub restraints: Vec<RestraintLine>,
    pub reference: Option<String>,
    pub comment: Option<String>,
    pub picture: Option<Vec<u8>>,
}

/// Write-side invariant violation of a [`NewFragment`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentValidationError {
    EmptyName,
    InvalidResidueClass(String),
}

impl Display for FragmentValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => f.write_str("fragment name must not be empty"),
            Self::InvalidResidueClass(value) => write!(
                f,
                "invalid residue class `{value}`: expected up to 4 alphanumeric characters starting with a letter"
            ),
        }
    }
}

impl Error for FragmentValidationError {}

impl NewFragment {
    pub fn new(name: impl Into<String>, atoms: Vec<FragmentAtom>) -> Self {
        Self {
            name: name.into(),
            atoms,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), FragmentValidationError> {
        if self.name.trim().is_empty() {
            return Err(FragmentValidationError::EmptyName);
        }
        if !self.residue_class.is_empty() && !is_valid_residue_class(&self.residue_class) {
            return Err(FragmentValidationError::InvalidResidueClass(
                self.residue_class.clone(),
            ));
        }
        Ok(())
    }

    /// Restraints in their stored `(card, atom_spec)` form.
    pub fn restraint_records(&self) -> Vec<RestraintRecord> {
        self.restraints.iter().map(RestraintLine::to_record).collect()
    }
}
