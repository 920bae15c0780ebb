//! Disagreeable restraints of a SHELXL `.lst` listing.
//!
//! SHELXL prints a table of the worst-fitting restraints after each cycle.
//! Only the last table before `Summary of restraints` describes the final
//! model, so earlier tables are discarded.

use log::debug;
use serde::Serialize;

const TABLE_START: &str = " Disagreeable restraints";
const TABLE_END: &str = " Summary of restraints";
const WARNING_SIGMAS: f64 = 2.5;
const CRITICAL_SIGMAS: f64 = 3.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Normal,
    /// Error above 2.5 sigma.
    Warning,
    /// Error above 3.5 sigma.
    Critical,
}

/// One row of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisagreeableRestraint {
    /// `None` for relative restraints (SADI, SIMU, ...), which print no
    /// observed or target value.
    pub observed: Option<f64>,
    pub target: Option<f64>,
    pub error: f64,
    pub sigma: f64,
    /// Restraint text as printed, e.g. `SADI C1 F1 C1 F2`.
    pub restraint: String,
}

impl DisagreeableRestraint {
    pub fn is_relative(&self) -> bool {
        self.observed.is_none()
    }

    pub fn severity(&self) -> Severity {
        let deviation = self.error.abs();
        if deviation > CRITICAL_SIGMAS * self.sigma {
            Severity::Critical
        } else if deviation > WARNING_SIGMAS * self.sigma {
            Severity::Warning
        } else {
            Severity::Normal
        }
    }
}

/// Rows of the final disagreeable-restraints table in `listing`.
pub fn parse_disagreeable_restraints(listing: &str) -> Vec<DisagreeableRestraint> {
    let mut rows = Vec::new();
    let mut in_table = false;

    for line in listing.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with(TABLE_START) {
            rows.clear();
            in_table = true;
            continue;
        }
        if line.starts_with(TABLE_END) {
            in_table = false;
            continue;
        }
        if in_table {
            if let Some(row) = parse_row(line) {
                rows.push(row);
            }
        }
    }

    debug!(
        "event=lst_parse module=listing status=ok rows={}",
        rows.len()
    );
    rows
}

fn parse_row(line: &str) -> Option<DisagreeableRestraint> {
    let fields = line.split_whitespace().collect::<Vec<_>>();
    let text_start = fields
        .iter()
        .position(|field| field.starts_with(|c: char| c.is_alphabetic()))?;
    if fields[0].starts_with("Observed") {
        return None;
    }

    let numbers = fields[..text_start]
        .iter()
        .map(|field| field.parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    let restraint = fields[text_start..].join(" ");

    match numbers.as_slice() {
        [observed, target, error, sigma] => Some(DisagreeableRestraint {
            observed: Some(*observed),
            target: Some(*target),
            error: *error,
            sigma: *sigma,
            restraint,
        }),
        [error, sigma] => Some(DisagreeableRestraint {
            observed: None,
            target: None,
            error: *error,
            sigma: *sigma,
            restraint,
        }),
        _ => None,
    }
}
