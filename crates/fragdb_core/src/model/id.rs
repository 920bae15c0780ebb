//! Fragment identity across the primary and user sources.
//!
//! # Responsibility
//! - Model fragment ids as a tagged union over the two sources.
//! - Own the only translation to and from the legacy flat integer id.
//!
//! # Invariants
//! - Public ids `< USER_ID_OFFSET` address the primary source.
//! - User row `k` is published as `k + USER_ID_OFFSET`.
//! - A primary row id never reaches `USER_ID_OFFSET`, so both ranges stay
//!   disjoint.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Boundary between primary ids and offset-translated user ids.
pub const USER_ID_OFFSET: i64 = 1_000_000;

/// Storage source that owns a fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Built-in, read-mostly reference collection.
    Primary,
    /// Mutable collection written by the user.
    User,
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::User => f.write_str("user"),
        }
    }
}

/// Source-qualified fragment id. The payload is the SQLite row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FragmentId {
    Primary(u32),
    User(u32),
}

/// Rejected public or row id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdError {
    /// Ids must be strictly positive.
    NotPositive(i64),
    /// Id does not fit the row id range of its source.
    OutOfRange(i64),
    /// Primary row id would collide with the user id space.
    PrimaryCollision(i64),
}

impl Display for IdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotPositive(id) => write!(f, "fragment id must be positive, got {id}"),
            Self::OutOfRange(id) => write!(f, "fragment id {id} is out of range"),
            Self::PrimaryCollision(id) => write!(
                f,
                "primary fragment id {id} reaches the user id offset {USER_ID_OFFSET}"
            ),
        }
    }
}

impl Error for IdError {}

impl FragmentId {
    /// Translates a flat public id into a source-qualified id.
    pub fn from_public(public: i64) -> Result<Self, IdError> {
        if public <= 0 {
            return Err(IdError::NotPositive(public));
        }
        if public < USER_ID_OFFSET {
            return u32::try_from(public)
                .map(Self::Primary)
                .map_err(|_| IdError::OutOfRange(public));
        }
        u32::try_from(public - USER_ID_OFFSET)
            .ok()
            .filter(|row| *row > 0)
            .map(Self::User)
            .ok_or(IdError::OutOfRange(public))
    }

    /// Builds an id from a row id read out of `source`.
    pub fn from_row(source: Source, row_id: i64) -> Result<Self, IdError> {
        if row_id <= 0 {
            return Err(IdError::NotPositive(row_id));
        }
        match source {
            Source::Primary if row_id >= USER_ID_OFFSET => Err(IdError::PrimaryCollision(row_id)),
            Source::Primary => u32::try_from(row_id)
                .map(Self::Primary)
                .map_err(|_| IdError::OutOfRange(row_id)),
            Source::User => u32::try_from(row_id)
                .map(Self::User)
                .map_err(|_| IdError::OutOfRange(row_id)),
        }
    }

    /// Flat integer id understood by external callers.
    pub fn to_public(self) -> i64 {
        match self {
            Self::Primary(row) => i64::from(row),
            Self::User(row) => i64::from(row) + USER_ID_OFFSET,
        }
    }

    pub fn source(self) -> Source {
        match self {
            Self::Primary(_) => Source::Primary,
            Self::User(_) => Source::User,
        }
    }

    /// Row id inside the owning source.
    pub fn row_id(self) -> i64 {
        match self {
            Self::Primary(row) | Self::User(row) => i64::from(row),
        }
    }
}

impl Display for FragmentId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_public())
    }
}
