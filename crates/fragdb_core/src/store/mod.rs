//! Two-source fragment store.
//!
//! # Responsibility
//! - Own the primary and user connections and dispatch by [`FragmentId`].
//! - Publish one flat id space over both sources.
//! - Snapshot the combined, ordered fragment list as a [`Catalog`].
//!
//! # Invariants
//! - Writes only ever reach the user source.
//! - Primary row ids stay below `USER_ID_OFFSET`; opening fails otherwise.
//! - Every successful `store`/`delete` bumps the generation, which makes
//!   earlier catalogs stale.
//! - Name lookups report a user hit before a primary hit.

pub mod catalog;

use crate::config::StoreConfig;
use crate::db::{open_db, open_db_in_memory, open_db_read_only, prepare_user_db, DbError};
use crate::model::fragment::{
    FragmentAtom, FragmentMeta, FragmentValidationError, NewFragment, RestraintRecord,
};
use crate::model::id::{FragmentId, IdError, Source, USER_ID_OFFSET};
use crate::repo::fragment_repo::{FragmentRepository, RepoError, SqliteFragmentRepository};
use log::{error, info, warn};
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub use catalog::{Catalog, CatalogEntry, SearchHit, USER_MARKER};

/// Returned by [`FragmentStore::get_reference`] when there is none.
pub const NO_REFERENCE: &str = "no reference found";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    InvalidId(IdError),
    NotFound(FragmentId),
    Validation(FragmentValidationError),
    Repo(RepoError),
    Db(DbError),
    StaleCatalog { catalog: u64, current: u64 },
    PrimaryIdOutOfRange(i64),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidId(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "fragment not found: {id}"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::StaleCatalog { catalog, current } => write!(
                f,
                "catalog from generation {catalog} is stale; store is at generation {current}"
            ),
            Self::PrimaryIdOutOfRange(id) => write!(
                f,
                "primary database contains fragment id {id}, at or above the user offset {USER_ID_OFFSET}"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidId(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::StaleCatalog { .. } | Self::PrimaryIdOutOfRange(_) => None,
        }
    }
}

impl From<IdError> for StoreError {
    fn from(value: IdError) -> Self {
        Self::InvalidId(value)
    }
}

impl From<FragmentValidationError> for StoreError {
    fn from(value: FragmentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

/// Which source a name lookup matched first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamePresence {
    Absent,
    Primary,
    /// Found in the user source; wins over a primary hit.
    User,
}

impl NamePresence {
    pub fn is_present(self) -> bool {
        self != Self::Absent
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// Primary fragments cannot be deleted.
    RefusedPrimary,
}

/// Fragment store over a primary and a user SQLite source.
pub struct FragmentStore {
    primary: Connection,
    user: Connection,
    generation: u64,
}

impl FragmentStore {
    /// Opens both sources as described by `config`.
    ///
    /// A missing or uninitialized user file is created with the schema.
    pub fn open(config: &StoreConfig) -> StoreResult<Self> {
        let primary = if config.primary_read_only {
            open_db_read_only(&config.primary_path)?
        } else {
            open_db(&config.primary_path)?
        };
        prepare_user_db(&config.user_path, config.user_db_min_bytes)?;
        let user = open_db(&config.user_path)?;
        Self::from_connections(primary, user)
    }

    /// Two empty in-memory sources.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connections(open_db_in_memory()?, open_db_in_memory()?)
    }

    /// Wraps already opened connections after checking the id ranges.
    pub fn from_connections(primary: Connection, user: Connection) -> StoreResult<Self> {
        let store = Self {
            primary,
            user,
            generation: 0,
        };
        if let Some(max) = store.repo(Source::Primary).max_row_id()? {
            if max >= USER_ID_OFFSET {
                error!(
                    "event=store_open module=store status=error error_code=primary_id_range max_id={max}"
                );
                return Err(StoreError::PrimaryIdOutOfRange(max));
            }
        }
        info!(
            "event=store_open module=store status=ok primary_len={} user_len={}",
            store.repo(Source::Primary).count()?,
            store.repo(Source::User).count()?
        );
        Ok(store)
    }

    fn repo(&self, source: Source) -> SqliteFragmentRepository<'_> {
        match source {
            Source::Primary => SqliteFragmentRepository::new(&self.primary, Source::Primary),
            Source::User => SqliteFragmentRepository::new(&self.user, Source::User),
        }
    }

    fn repo_for(&self, id: FragmentId) -> SqliteFragmentRepository<'_> {
        self.repo(id.source())
    }

    /// Generation counter, bumped by every mutation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Atoms of fragment `id`, `None` when no such fragment exists.
    ///
    /// # Errors
    /// - `InvalidId` for ids `<= 0`.
    pub fn get(&self, id: i64) -> StoreResult<Option<Vec<FragmentAtom>>> {
        let id = FragmentId::from_public(id)?;
        self.atoms(id)
    }

    pub fn atoms(&self, id: FragmentId) -> StoreResult<Option<Vec<FragmentAtom>>> {
        let repo = self.repo_for(id);
        if !repo.exists(id.row_id())? {
            return Ok(None);
        }
        Ok(Some(repo.get_atoms(id.row_id())?))
    }

    /// `false` for ids that cannot exist, including non-positive ones.
    pub fn contains(&self, id: i64) -> StoreResult<bool> {
        match FragmentId::from_public(id) {
            Ok(id) => self.contains_id(id),
            Err(_) => Ok(false),
        }
    }

    pub fn contains_id(&self, id: FragmentId) -> StoreResult<bool> {
        Ok(self.repo_for(id).exists(id.row_id())?)
    }

    /// Fragments in both sources together.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.repo(Source::Primary).count()? + self.repo(Source::User).count()?)
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Every id, primary ids first, each source in row order.
    pub fn all_ids(&self) -> StoreResult<Vec<FragmentId>> {
        let mut ids = Vec::new();
        for source in [Source::Primary, Source::User] {
            ids.extend(
                self.repo(source)
                    .list_names()?
                    .into_iter()
                    .map(|(id, _)| id),
            );
        }
        Ok(ids)
    }

    pub fn meta(&self, id: FragmentId) -> StoreResult<Option<FragmentMeta>> {
        Ok(self.repo_for(id).get_meta(id.row_id())?)
    }

    pub fn fragment_name(&self, id: FragmentId) -> StoreResult<Option<String>> {
        Ok(self.meta(id)?.map(|meta| meta.name))
    }

    pub fn get_picture(&self, id: FragmentId) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.repo_for(id).get_picture(id.row_id())?)
    }

    /// Reference text, or [`NO_REFERENCE`] when the fragment has none.
    pub fn get_reference(&self, id: FragmentId) -> StoreResult<String> {
        let reference = self
            .meta(id)?
            .and_then(|meta| meta.reference)
            .filter(|reference| !reference.trim().is_empty());
        Ok(reference.unwrap_or_else(|| NO_REFERENCE.to_string()))
    }

    /// Residue class, empty when unset or when the fragment is missing.
    pub fn get_residue_class(&self, id: FragmentId) -> StoreResult<String> {
        Ok(self
            .meta(id)?
            .map(|meta| meta.residue_class)
            .unwrap_or_default())
    }

    pub fn get_restraints(&self, id: FragmentId) -> StoreResult<Vec<RestraintRecord>> {
        Ok(self.repo_for(id).get_restraints(id.row_id())?)
    }

    /// Case-sensitive full-name lookup over both sources.
    pub fn has_exact_name(&self, name: &str) -> StoreResult<NamePresence> {
        self.presence(|repo| repo.has_exact_name(name))
    }

    /// Case-insensitive partial-name lookup over both sources.
    pub fn has_name(&self, part: &str) -> StoreResult<NamePresence> {
        self.presence(|repo| repo.has_name_like(part))
    }

    pub fn has_residue_class(&self, class: &str) -> StoreResult<bool> {
        Ok(self.repo(Source::User).has_residue_class(class)?
            || self.repo(Source::Primary).has_residue_class(class)?)
    }

    fn presence<F>(&self, lookup: F) -> StoreResult<NamePresence>
    where
        F: Fn(&SqliteFragmentRepository<'_>) -> Result<bool, RepoError>,
    {
        if lookup(&self.repo(Source::User))? {
            return Ok(NamePresence::User);
        }
        if lookup(&self.repo(Source::Primary))? {
            return Ok(NamePresence::Primary);
        }
        Ok(NamePresence::Absent)
    }

    /// Stores `fragment` in the user source and returns its id.
    ///
    /// Fragment row, atoms and restraints commit together or not at all.
    pub fn store(&mut self, fragment: &NewFragment) -> StoreResult<FragmentId> {
        let started_at = Instant::now();
        fragment.validate()?;

        match self.repo(Source::User).insert_fragment(fragment) {
            Ok(id) => {
                self.generation += 1;
                info!(
                    "event=fragment_store module=store status=ok id={} atoms={} restraints={} duration_ms={}",
                    id,
                    fragment.atoms.len(),
                    fragment.restraints.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(id)
            }
            Err(err) => {
                error!(
                    "event=fragment_store module=store status=error atoms={} restraints={} error={}",
                    fragment.atoms.len(),
                    fragment.restraints.len(),
                    err
                );
                Err(err.into())
            }
        }
    }

    /// Deletes a user fragment together with its atoms and restraints.
    ///
    /// # Errors
    /// - `InvalidId` for ids `<= 0`.
    pub fn delete(&mut self, id: i64) -> StoreResult<DeleteOutcome> {
        let id = FragmentId::from_public(id)?;
        self.delete_id(id)
    }

    pub fn delete_id(&mut self, id: FragmentId) -> StoreResult<DeleteOutcome> {
        if id.source() == Source::Primary {
            warn!("event=fragment_delete module=store status=refused id={id} source=primary");
            return Ok(DeleteOutcome::RefusedPrimary);
        }

        match self.repo(Source::User).delete_fragment(id.row_id()) {
            Ok(()) => {
                self.generation += 1;
                info!("event=fragment_delete module=store status=ok id={id}");
                Ok(DeleteOutcome::Deleted)
            }
            Err(RepoError::NotFound(_)) => {
                info!("event=fragment_delete module=store status=ok id={id} result=not_found");
                Ok(DeleteOutcome::NotFound)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Snapshot of every fragment of both sources in sort-key order.
    pub fn catalog(&self) -> StoreResult<Catalog> {
        let mut entries = Vec::new();
        for source in [Source::Primary, Source::User] {
            entries.extend(
                self.repo(source)
                    .list_names()?
                    .into_iter()
                    .map(|(id, name)| CatalogEntry::new(id, name)),
            );
        }
        Ok(Catalog::new(self.generation, entries))
    }

    /// Fails with `StaleCatalog` when `catalog` predates a mutation.
    pub fn ensure_current(&self, catalog: &Catalog) -> StoreResult<()> {
        if catalog.generation() != self.generation {
            return Err(StoreError::StaleCatalog {
                catalog: catalog.generation(),
                current: self.generation,
            });
        }
        Ok(())
    }

    /// Ranks a fresh snapshot against `query`.
    pub fn find_by_name(&self, query: &str, limit: usize) -> StoreResult<Vec<SearchHit>> {
        Ok(self.catalog()?.find_by_name(query, limit))
    }

    /// Closes both connections, reporting the first failure.
    pub fn close(self) -> StoreResult<()> {
        let primary = self.primary.close();
        let user = self.user.close();
        let mut result = Ok(());
        for (source, outcome) in [(Source::Primary, primary), (Source::User, user)] {
            if let Err((_, err)) = outcome {
                error!("event=store_close module=store status=error source={source} error={err}");
                if result.is_ok() {
                    result = Err(StoreError::Db(DbError::Sqlite(err)));
                }
            }
        }
        if result.is_ok() {
            info!("event=store_close module=store status=ok");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::{DeleteOutcome, FragmentStore, NamePresence, StoreError, NO_REFERENCE};
    use crate::db::open_db_in_memory;
    use crate::model::fragment::{FragmentAtom, NewFragment};
    use crate::model::id::{FragmentId, IdError, Source, USER_ID_OFFSET};
    use crate::repo::fragment_repo::{FragmentRepository, SqliteFragmentRepository};

    fn water() -> NewFragment {
        NewFragment::new(
            "Water, H2O",
            vec![
                FragmentAtom::new("O1", "8", [0.0, 0.0, 0.0]),
                FragmentAtom::new("H1", "1", [0.96, 0.0, 0.0]),
            ],
        )
    }

    fn store_with_primary(names: &[&str]) -> FragmentStore {
        let primary = open_db_in_memory().unwrap();
        {
            let repo = SqliteFragmentRepository::new(&primary, Source::Primary);
            for name in names {
                repo.insert_fragment(&NewFragment::new(*name, Vec::new()))
                    .unwrap();
            }
        }
        FragmentStore::from_connections(primary, open_db_in_memory().unwrap()).unwrap()
    }

    #[test]
    fn stored_ids_are_offset_user_rows() {
        let mut store = FragmentStore::open_in_memory().unwrap();
        let first = store.store(&water()).unwrap();
        let second = store.store(&water()).unwrap();
        assert_eq!(first.to_public(), USER_ID_OFFSET + 1);
        assert_eq!(second.to_public(), USER_ID_OFFSET + 2);
        assert_eq!(store.get(first.to_public()).unwrap().unwrap().len(), 2);
    }

    #[test]
    fn primary_ids_never_touch_user_source() {
        let mut store = store_with_primary(&["Benzene, C6H6"]);
        store.store(&water()).unwrap();
        let atoms = store.get(1).unwrap().unwrap();
        assert!(atoms.is_empty());
        assert_eq!(store.fragment_name(FragmentId::Primary(1)).unwrap().unwrap(), "Benzene, C6H6");
        assert_eq!(
            store.fragment_name(FragmentId::User(1)).unwrap().unwrap(),
            "Water, H2O"
        );
    }

    #[test]
    fn get_rejects_non_positive_ids() {
        let store = FragmentStore::open_in_memory().unwrap();
        assert!(matches!(
            store.get(0),
            Err(StoreError::InvalidId(IdError::NotPositive(0)))
        ));
        assert!(!store.contains(-1).unwrap());
        assert_eq!(store.get(42).unwrap(), None);
    }

    #[test]
    fn delete_is_refused_for_primary_and_cascades_for_user() {
        let mut store = store_with_primary(&["Benzene, C6H6"]);
        let id = store.store(&water()).unwrap();

        assert_eq!(store.delete(1).unwrap(), DeleteOutcome::RefusedPrimary);
        assert!(store.contains(1).unwrap());

        assert_eq!(store.delete(id.to_public()).unwrap(), DeleteOutcome::Deleted);
        assert_eq!(store.get(id.to_public()).unwrap(), None);
        assert_eq!(store.delete(id.to_public()).unwrap(), DeleteOutcome::NotFound);
    }

    #[test]
    fn user_hits_shadow_primary_hits() {
        let mut store = store_with_primary(&["Water, H2O", "Benzene, C6H6"]);
        assert_eq!(store.has_exact_name("Water, H2O").unwrap(), NamePresence::Primary);
        store.store(&water()).unwrap();
        assert_eq!(store.has_exact_name("Water, H2O").unwrap(), NamePresence::User);
        assert_eq!(store.has_name("benz").unwrap(), NamePresence::Primary);
        assert_eq!(store.has_name("ether").unwrap(), NamePresence::Absent);
    }

    #[test]
    fn sentinels_for_missing_metadata() {
        let mut store = FragmentStore::open_in_memory().unwrap();
        let id = store.store(&water()).unwrap();
        assert_eq!(store.get_reference(id).unwrap(), NO_REFERENCE);
        assert_eq!(store.get_residue_class(id).unwrap(), "");
        assert_eq!(store.get_reference(FragmentId::User(99)).unwrap(), NO_REFERENCE);
        assert_eq!(store.get_picture(id).unwrap(), None);
    }

    #[test]
    fn mutations_make_catalogs_stale() {
        let mut store = FragmentStore::open_in_memory().unwrap();
        let before = store.catalog().unwrap();
        store.ensure_current(&before).unwrap();

        let id = store.store(&water()).unwrap();
        assert!(matches!(
            store.ensure_current(&before),
            Err(StoreError::StaleCatalog {
                catalog: 0,
                current: 1
            })
        ));

        let after = store.catalog().unwrap();
        assert_eq!(after.len(), 1);
        store.delete_id(id).unwrap();
        assert!(store.ensure_current(&after).is_err());
    }

    #[test]
    fn store_validates_before_writing() {
        let mut store = FragmentStore::open_in_memory().unwrap();
        let err = store.store(&NewFragment::new(" ", Vec::new())).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(store.is_empty().unwrap());
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn primary_ids_at_offset_are_rejected() {
        let primary = open_db_in_memory().unwrap();
        primary
            .execute(
                "INSERT INTO Fragment (Id, Name) VALUES (?1, 'Too high');",
                [USER_ID_OFFSET],
            )
            .unwrap();
        let result = FragmentStore::from_connections(primary, open_db_in_memory().unwrap());
        assert!(matches!(
            result,
            Err(StoreError::PrimaryIdOutOfRange(USER_ID_OFFSET))
        ));
    }

    #[test]
    fn close_releases_both_sources() {
        let store = FragmentStore::open_in_memory().unwrap();
        store.close().unwrap();
    }
}
