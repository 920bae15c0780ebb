//! Structural validation of restraint lines against a fragment.
//!
//! # Responsibility
//! - Reject lines whose keyword is not a known instruction card.
//! - Check that geometric restraints only name atoms of the fragment.
//! - Report duplicate atom labels of the fragment itself.
//!
//! # Invariants
//! - Line numbers in diagnostics are 1-based positions in the input list.
//! - Atom names compare case-insensitively.
//! - An empty restraint list is valid.

use crate::model::fragment::FragmentAtom;
use crate::restraints::grammar::{RestraintLine, RestraintParseError};
use crate::restraints::range::RangeError;
use log::warn;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// One finding of [`validate_restraints`].
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    UnknownCard { line: usize, text: String },
    UnknownAtom { line: usize, atom: String },
    InvalidRange { line: usize, error: RangeError },
    DuplicateAtom { name: String },
}

impl Diagnostic {
    /// Duplicate labels are a warning; everything else blocks storage.
    pub fn is_error(&self) -> bool {
        !matches!(self, Self::DuplicateAtom { .. })
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownCard { line, text } => {
                write!(f, "line {line}: unknown restraint card in `{text}`")
            }
            Self::UnknownAtom { line, atom } => {
                write!(f, "line {line}: atom `{atom}` is not part of the fragment")
            }
            Self::InvalidRange { line, error } => write!(f, "line {line}: {error}"),
            Self::DuplicateAtom { name } => write!(f, "duplicate atom name `{name}`"),
        }
    }
}

/// Outcome of validating one fragment's restraints.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    pub fragment_name: String,
    pub diagnostics: Vec<Diagnostic>,
    /// Lines that parsed, in input order. Blank lines are skipped.
    pub lines: Vec<RestraintLine>,
}

impl ValidationReport {
    /// `false` when any card or atom error was found.
    pub fn is_valid(&self) -> bool {
        !self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn has_duplicates(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| matches!(diagnostic, Diagnostic::DuplicateAtom { .. }))
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|diagnostic| diagnostic.is_error())
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "restraints of `{}` have {} problem(s)",
            self.fragment_name,
            self.diagnostics.len()
        )?;
        for diagnostic in &self.diagnostics {
            write!(f, "\n  {diagnostic}")?;
        }
        Ok(())
    }
}

impl Error for ValidationReport {}

/// Validates raw restraint lines against the atoms of `fragment_name`.
pub fn validate_restraints<S: AsRef<str>>(
    lines: &[S],
    atoms: &[FragmentAtom],
    fragment_name: &str,
) -> ValidationReport {
    let atom_order = atoms.iter().map(|atom| atom.name.clone()).collect::<Vec<_>>();
    let known = atom_order
        .iter()
        .map(|name| name.to_uppercase())
        .collect::<HashSet<_>>();

    let mut report = ValidationReport {
        fragment_name: fragment_name.to_string(),
        ..ValidationReport::default()
    };

    for (index, raw) in lines.iter().enumerate() {
        let line_no = index + 1;
        let text = raw.as_ref().trim();
        let parsed = match RestraintLine::parse(text) {
            Ok(parsed) => parsed,
            Err(RestraintParseError::Empty) => continue,
            Err(RestraintParseError::UnknownCard(_)) => {
                report.diagnostics.push(Diagnostic::UnknownCard {
                    line: line_no,
                    text: text.to_string(),
                });
                continue;
            }
        };

        if parsed.card.is_restraint() {
            check_atoms(&parsed, line_no, &known, &mut report.diagnostics);
            if let Err(error) = parsed.resolve_ranges(&atom_order) {
                // unknown endpoints are already reported as unknown atoms
                if matches!(error, RangeError::DanglingOperator { .. }) {
                    report.diagnostics.push(Diagnostic::InvalidRange {
                        line: line_no,
                        error,
                    });
                }
            }
        }
        report.lines.push(parsed);
    }

    report
        .diagnostics
        .extend(duplicate_atoms(&atom_order).into_iter().map(|name| Diagnostic::DuplicateAtom { name }));

    if !report.diagnostics.is_empty() {
        warn!(
            "event=restraint_validate module=restraints status=error lines={} errors={} duplicates={}",
            lines.len(),
            report.errors().count(),
            report.has_duplicates()
        );
    }
    report
}

fn check_atoms(
    line: &RestraintLine,
    line_no: usize,
    known: &HashSet<String>,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut reported = HashSet::new();
    for atom in line.atom_names() {
        let key = atom.to_uppercase();
        if !known.contains(&key) && reported.insert(key) {
            diagnostics.push(Diagnostic::UnknownAtom {
                line: line_no,
                atom: atom.to_string(),
            });
        }
    }
}

/// Atom labels occurring more than once, each reported once with the
/// spelling of its first repeat.
fn duplicate_atoms(atom_order: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();
    for name in atom_order {
        let key = name.to_uppercase();
        if !seen.insert(key.clone()) && reported.insert(key) {
            duplicates.push(name.clone());
        }
    }
    duplicates
}
