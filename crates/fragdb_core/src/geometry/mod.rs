//! Geometry and statistics helpers.
//!
//! # Responsibility
//! - Convert between fractional and cartesian coordinates.
//! - Measure distances under general triclinic cell metrics.
//! - Provide the statistics behind the SADI outlier check.

pub mod cell;
pub mod stats;

pub use cell::{atomic_distance, fractional_to_cartesian, tetrahedron_volume, UnitCell};
pub use stats::{mean, median, nalimov_outliers, std_dev};
