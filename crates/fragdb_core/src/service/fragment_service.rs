//! Fragment query facade.
//!
//! # Responsibility
//! - Offer the list, search, fetch, store, update and delete use cases.
//! - Run restraint validation and the SADI advisory check before storing.
//!
//! # Invariants
//! - Nothing is written when validation reports a card or atom error.
//! - Duplicate atom labels block storing only under
//!   `DuplicateAtomPolicy::Reject`.
//! - Fractional draft coordinates are converted to cartesian exactly once,
//!   before validation results are stored.
//! - Update is delete plus store; the returned id is new.

use crate::config::{DuplicateAtomPolicy, StoreConfig, DEFAULT_SEARCH_LIMIT};
use crate::geometry::{fractional_to_cartesian, UnitCell};
use crate::input::{parse_atom_lines, parse_unit_cell, InputError};
use crate::model::fragment::{FragmentAtom, FragmentRecord, NewFragment};
use crate::model::id::{FragmentId, Source};
use crate::residue::normalize_residue_class;
use crate::restraints::{
    check_sadi_consistency, validate_restraints, Diagnostic, RangeError, RestraintLine,
    RestraintParseError, SadiFinding, ValidationReport,
};
use crate::store::{Catalog, CatalogEntry, DeleteOutcome, FragmentStore, SearchHit, StoreError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    Input(InputError),
    /// Restraints or atoms failed validation; nothing was written.
    Validation(ValidationReport),
    Range(RangeError),
    Restraint(RestraintParseError),
    /// Primary fragments cannot be replaced.
    PrimaryReadOnly(FragmentId),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Input(err) => write!(f, "{err}"),
            Self::Validation(report) => write!(f, "{report}"),
            Self::Range(err) => write!(f, "{err}"),
            Self::Restraint(err) => write!(f, "{err}"),
            Self::PrimaryReadOnly(id) => {
                write!(f, "fragment {id} belongs to the primary database and is read-only")
            }
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Input(err) => Some(err),
            Self::Validation(report) => Some(report),
            Self::Range(err) => Some(err),
            Self::Restraint(err) => Some(err),
            Self::PrimaryReadOnly(_) => None,
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<InputError> for ServiceError {
    fn from(value: InputError) -> Self {
        Self::Input(value)
    }
}

impl From<RangeError> for ServiceError {
    fn from(value: RangeError) -> Self {
        Self::Range(value)
    }
}

impl From<RestraintParseError> for ServiceError {
    fn from(value: RestraintParseError) -> Self {
        Self::Restraint(value)
    }
}

/// User input for a new fragment.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FragmentDraft {
    pub name: String,
    pub atoms: Vec<FragmentAtom>,
    /// When set, atom coordinates are fractional in this cell.
    pub cell: Option<UnitCell>,
    pub residue_class: String,
    /// Raw restraint lines, e.g. `SADI C1 C2 C1 C3`.
    pub restraints: Vec<String>,
    pub reference: Option<String>,
    pub comment: Option<String>,
    pub picture: Option<Vec<u8>>,
}

impl FragmentDraft {
    pub fn new(name: impl Into<String>, atoms: Vec<FragmentAtom>) -> Self {
        Self {
            name: name.into(),
            atoms,
            ..Self::default()
        }
    }

    /// Builds a draft from SHELX atom lines and an optional cell line.
    pub fn from_shelx_text(
        name: impl Into<String>,
        atom_lines: &str,
        cell: Option<&str>,
    ) -> ServiceResult<Self> {
        let atoms = parse_atom_lines(atom_lines)?;
        let cell = cell.map(parse_unit_cell).transpose()?;
        Ok(Self {
            cell,
            ..Self::new(name, atoms)
        })
    }

    pub fn with_restraints<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.restraints = lines.into_iter().map(Into::into).collect();
        self
    }

    /// Atoms in cartesian Å.
    fn cartesian_atoms(&self) -> Vec<FragmentAtom> {
        match &self.cell {
            Some(cell) => self
                .atoms
                .iter()
                .map(|atom| {
                    FragmentAtom::new(
                        atom.name.clone(),
                        atom.element.clone(),
                        fractional_to_cartesian(atom.position(), cell),
                    )
                })
                .collect(),
            None => self.atoms.clone(),
        }
    }
}

/// Outcome of a successful store or update.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreReport {
    pub id: FragmentId,
    /// SADI lines with inconsistent geometry. Advisory only.
    pub findings: Vec<SadiFinding>,
    /// Non-blocking diagnostics such as duplicate atom names.
    pub diagnostics: Vec<Diagnostic>,
}

/// Use-case facade over a [`FragmentStore`].
pub struct FragmentService {
    store: FragmentStore,
    duplicate_atoms: DuplicateAtomPolicy,
    search_limit: usize,
}

impl FragmentService {
    pub fn new(store: FragmentStore) -> Self {
        Self {
            store,
            duplicate_atoms: DuplicateAtomPolicy::default(),
            search_limit: DEFAULT_SEARCH_LIMIT,
        }
    }

    /// Opens the store described by `config` and adopts its policies.
    pub fn open(config: &StoreConfig) -> ServiceResult<Self> {
        let store = FragmentStore::open(config)?;
        Ok(Self {
            store,
            duplicate_atoms: config.duplicate_atoms,
            search_limit: config.search_limit,
        })
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicateAtomPolicy) -> Self {
        self.duplicate_atoms = policy;
        self
    }

    pub fn store_ref(&self) -> &FragmentStore {
        &self.store
    }

    pub fn catalog(&self) -> ServiceResult<Catalog> {
        Ok(self.store.catalog()?)
    }

    /// All fragments in listing order.
    pub fn list(&self) -> ServiceResult<Vec<CatalogEntry>> {
        Ok(self.store.catalog()?.iter().cloned().collect())
    }

    /// Best matches for `query`; `None` uses the configured limit.
    pub fn search(&self, query: &str, limit: Option<usize>) -> ServiceResult<Vec<SearchHit>> {
        let limit = limit.unwrap_or(self.search_limit);
        Ok(self.store.find_by_name(query, limit)?)
    }

    pub fn fragment(&self, id: i64) -> ServiceResult<FragmentRecord> {
        let id = FragmentId::from_public(id).map_err(StoreError::from)?;
        let meta = self.store.meta(id)?.ok_or(StoreError::NotFound(id))?;
        Ok(FragmentRecord {
            meta,
            atoms: self.store.atoms(id)?.unwrap_or_default(),
            restraints: self.store.get_restraints(id)?,
        })
    }

    pub fn atoms(&self, id: i64) -> ServiceResult<Vec<FragmentAtom>> {
        let fragment_id = FragmentId::from_public(id).map_err(StoreError::from)?;
        Ok(self
            .store
            .get(id)?
            .ok_or(StoreError::NotFound(fragment_id))?)
    }

    pub fn picture(&self, id: i64) -> ServiceResult<Option<Vec<u8>>> {
        let id = FragmentId::from_public(id).map_err(StoreError::from)?;
        Ok(self.store.get_picture(id)?)
    }

    pub fn delete(&mut self, id: i64) -> ServiceResult<DeleteOutcome> {
        Ok(self.store.delete(id)?)
    }

    /// Validates, converts and stores `draft` in the user database.
    pub fn store(&mut self, draft: &FragmentDraft) -> ServiceResult<StoreReport> {
        let (fragment, findings, diagnostics) = self.prepare(draft)?;
        let id = self.store.store(&fragment)?;
        info!(
            "event=service_store module=service status=ok id={} findings={} diagnostics={}",
            id,
            findings.len(),
            diagnostics.len()
        );
        Ok(StoreReport {
            id,
            findings,
            diagnostics,
        })
    }

    /// Replaces user fragment `id` with `draft`.
    ///
    /// The draft is validated before anything is deleted.
    pub fn update(&mut self, id: i64, draft: &FragmentDraft) -> ServiceResult<StoreReport> {
        let old_id = FragmentId::from_public(id).map_err(StoreError::from)?;
        if old_id.source() == Source::Primary {
            warn!("event=service_update module=service status=refused id={old_id} source=primary");
            return Err(ServiceError::PrimaryReadOnly(old_id));
        }
        if !self.store.contains_id(old_id)? {
            return Err(StoreError::NotFound(old_id).into());
        }

        let (fragment, findings, diagnostics) = self.prepare(draft)?;
        self.store.delete_id(old_id)?;
        let new_id = self.store.store(&fragment)?;
        info!("event=service_update module=service status=ok old_id={old_id} new_id={new_id}");
        Ok(StoreReport {
            id: new_id,
            findings,
            diagnostics,
        })
    }

    /// Stored restraints of `id` with range shorthand expanded.
    pub fn resolved_restraints(&self, id: i64) -> ServiceResult<Vec<RestraintLine>> {
        let record = self.fragment(id)?;
        let atom_order = record.atom_names();
        record
            .restraints
            .iter()
            .map(|stored| -> ServiceResult<RestraintLine> {
                let line = RestraintLine::from_record(stored)?;
                Ok(line.resolve_ranges(&atom_order)?)
            })
            .collect()
    }

    /// Closes the underlying store.
    pub fn close(self) -> ServiceResult<()> {
        Ok(self.store.close()?)
    }

    fn prepare(
        &self,
        draft: &FragmentDraft,
    ) -> ServiceResult<(NewFragment, Vec<SadiFinding>, Vec<Diagnostic>)> {
        let atoms = draft.cartesian_atoms();
        let report = validate_restraints(&draft.restraints, &atoms, &draft.name);

        let rejected_duplicates =
            report.has_duplicates() && self.duplicate_atoms == DuplicateAtomPolicy::Reject;
        if !report.is_valid() || rejected_duplicates {
            warn!(
                "event=service_store module=service status=refused errors={} duplicates={}",
                report.errors().count(),
                report.has_duplicates()
            );
            return Err(ServiceError::Validation(report));
        }

        let findings =
            check_sadi_consistency(&atoms, &report.lines, &UnitCell::cartesian(), &draft.name);

        let fragment = NewFragment {
            name: draft.name.trim().to_string(),
            atoms,
            residue_class: normalize_residue_class(&draft.residue_class),
            restraints: report.lines,
            reference: draft.reference.clone(),
            comment: draft.comment.clone(),
            picture: draft.picture.clone(),
        };
        Ok((fragment, findings, report.diagnostics))
    }
}
