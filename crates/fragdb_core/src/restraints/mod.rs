//! Restraint grammar and checks.
//!
//! # Responsibility
//! - Know the SHELX instruction vocabulary.
//! - Parse restraint lines into typed terms and expand range shorthand.
//! - Validate restraints against a fragment and flag inconsistent SADI
//!   geometry.

pub mod cards;
pub mod grammar;
pub mod range;
pub mod sadi;
pub mod validate;

pub use cards::RestraintCard;
pub use grammar::{Direction, RestraintLine, RestraintParseError, Term};
pub use range::{resolve_ranges, RangeError};
pub use sadi::{check_sadi_consistency, SadiFinding, DEFAULT_SADI_SIGMA};
pub use validate::{validate_restraints, Diagnostic, ValidationReport};
