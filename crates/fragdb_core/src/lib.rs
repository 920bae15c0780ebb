//! Core library of the fragment database.
//!
//! Reads molecular fragments from a shipped primary database and a
//! writable user database, offers fuzzy name search, and checks SHELX
//! restraints against fragment atoms.

pub mod config;
pub mod db;
pub mod geometry;
pub mod input;
pub mod listing;
pub mod logging;
pub mod model;
pub mod names;
pub mod repo;
pub mod residue;
pub mod restraints;
pub mod service;
pub mod store;

pub use config::{DuplicateAtomPolicy, LogSettings, StoreConfig};
pub use db::{DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::fragment::{
    FragmentAtom, FragmentMeta, FragmentRecord, FragmentValidationError, NewFragment,
    RestraintRecord,
};
pub use model::id::{FragmentId, IdError, Source, USER_ID_OFFSET};
pub use repo::fragment_repo::{
    FragmentRepository, RepoError, RepoResult, SqliteFragmentRepository,
};
pub use restraints::{
    check_sadi_consistency, validate_restraints, Diagnostic, RestraintCard, RestraintLine,
    SadiFinding, ValidationReport,
};
pub use service::fragment_service::{
    FragmentDraft, FragmentService, ServiceError, ServiceResult, StoreReport,
};
pub use store::{
    Catalog, CatalogEntry, DeleteOutcome, FragmentStore, NamePresence, SearchHit, StoreError,
    StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
