//! Repository layer over a single fragment source.
//!
//! # Responsibility
//! - Define the data access contract used by the two-source store.
//! - Isolate SQLite query details from store and service orchestration.
//!
//! # Invariants
//! - Repository writes enforce `NewFragment::validate()` before persistence.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod fragment_repo;
