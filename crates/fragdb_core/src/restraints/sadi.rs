//! Advisory distance check for SADI restraints.
//!
//! A SADI line asks the refinement to keep all listed atom pairs at the
//! same distance. Pairs whose stored geometry already disagrees strongly
//! usually mean a mistyped atom name, so they are reported. Findings never
//! block storage.

use crate::geometry::{atomic_distance, nalimov_outliers, std_dev, UnitCell};
use crate::model::fragment::FragmentAtom;
use crate::restraints::cards::RestraintCard;
use crate::restraints::grammar::RestraintLine;
use log::{debug, warn};
use std::fmt::{Display, Formatter};

/// Standard uncertainty of a SADI line that states none.
pub const DEFAULT_SADI_SIGMA: f64 = 0.02;
/// Spread in Å above which outlier pairs are reported.
pub const SADI_SPREAD_LIMIT: f64 = 0.065;
/// Multiple of the line's sigma above which the spread is reported.
const SIGMA_FACTOR: f64 = 2.5;

/// One SADI line whose restrained distances disagree.
#[derive(Debug, Clone, PartialEq)]
pub struct SadiFinding {
    pub fragment: String,
    /// 1-based position of the line in the checked list.
    pub line: usize,
    pub restraint: String,
    pub distances: Vec<f64>,
    pub std_dev: f64,
    pub sigma: f64,
    /// Pairs the Nalimov test singled out.
    pub outlier_pairs: Vec<(String, String)>,
    /// Spread exceeds `2.5 * sigma`.
    pub exceeds_sigma: bool,
}

impl Display for SadiFinding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "`{}` line {}: `{}` has distance spread {:.4} (sigma {})",
            self.fragment, self.line, self.restraint, self.std_dev, self.sigma
        )?;
        if !self.outlier_pairs.is_empty() {
            let pairs = self
                .outlier_pairs
                .iter()
                .map(|(a, b)| format!("{a}-{b}"))
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, "; suspicious pairs: {pairs}")?;
        }
        Ok(())
    }
}

/// Checks every SADI line of a fragment.
///
/// Atom coordinates are interpreted in `cell`; pass
/// [`UnitCell::cartesian`] for stored fragments. Lines with unresolvable
/// ranges or unknown atoms are skipped here, validation reports those.
pub fn check_sadi_consistency(
    atoms: &[FragmentAtom],
    lines: &[RestraintLine],
    cell: &UnitCell,
    fragment_name: &str,
) -> Vec<SadiFinding> {
    let atom_order = atoms.iter().map(|atom| atom.name.clone()).collect::<Vec<_>>();
    let mut findings = Vec::new();

    for (index, line) in lines.iter().enumerate() {
        if line.card != RestraintCard::Sadi {
            continue;
        }
        let line_no = index + 1;
        let resolved = match line.resolve_ranges(&atom_order) {
            Ok(resolved) => resolved,
            Err(err) => {
                debug!("event=sadi_check module=restraints status=skipped line={line_no} reason={err}");
                continue;
            }
        };

        let Some(pairs) = measure_pairs(&resolved, atoms, cell) else {
            debug!("event=sadi_check module=restraints status=skipped line={line_no} reason=unknown_atom");
            continue;
        };
        if let Some(finding) = assess_line(fragment_name, line_no, &resolved, &pairs) {
            findings.push(finding);
        }
    }

    for finding in &findings {
        warn!(
            "event=sadi_check module=restraints status=warning line={} std_dev={:.4} outliers={} exceeds_sigma={}",
            finding.line,
            finding.std_dev,
            finding.outlier_pairs.len(),
            finding.exceeds_sigma
        );
    }
    findings
}

struct MeasuredPair<'a> {
    first: &'a str,
    second: &'a str,
    distance: f64,
}

/// Consecutive non-overlapping pairs with their distances. An odd trailing
/// atom is ignored. `None` when a name is not in the fragment.
fn measure_pairs<'a>(
    line: &'a RestraintLine,
    atoms: &[FragmentAtom],
    cell: &UnitCell,
) -> Option<Vec<MeasuredPair<'a>>> {
    let names = line.atom_names().collect::<Vec<_>>();
    names
        .chunks_exact(2)
        .map(|pair| {
            let first = find_atom(atoms, pair[0])?;
            let second = find_atom(atoms, pair[1])?;
            Some(MeasuredPair {
                first: pair[0],
                second: pair[1],
                distance: atomic_distance(first.position(), second.position(), cell),
            })
        })
        .collect()
}

fn find_atom<'a>(atoms: &'a [FragmentAtom], name: &str) -> Option<&'a FragmentAtom> {
    atoms
        .iter()
        .find(|atom| atom.name.eq_ignore_ascii_case(name))
}

fn assess_line(
    fragment_name: &str,
    line_no: usize,
    line: &RestraintLine,
    pairs: &[MeasuredPair<'_>],
) -> Option<SadiFinding> {
    let distances = pairs.iter().map(|pair| pair.distance).collect::<Vec<_>>();
    let spread = std_dev(&distances);
    let sigma = line.first_number().unwrap_or(DEFAULT_SADI_SIGMA);

    let outlier_pairs = if spread > SADI_SPREAD_LIMIT {
        nalimov_outliers(&distances)
            .into_iter()
            .map(|index| {
                (
                    pairs[index].first.to_string(),
                    pairs[index].second.to_string(),
                )
            })
            .collect::<Vec<_>>()
    } else {
        Vec::new()
    };
    let exceeds_sigma = spread > SIGMA_FACTOR * sigma;

    if outlier_pairs.is_empty() && !exceeds_sigma {
        return None;
    }
    Some(SadiFinding {
        fragment: fragment_name.to_string(),
        line: line_no,
        restraint: line.to_string(),
        distances,
        std_dev: spread,
        sigma,
        outlier_pairs,
        exceeds_sigma,
    })
}
