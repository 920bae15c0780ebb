//! Fragment repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide row-level access to one fragment source.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Writes call `NewFragment::validate()` before any SQL runs.
//! - A fragment row, its atoms and its restraints are inserted in one
//!   transaction; a failure leaves no partial rows behind.
//! - Row ids are local to the repository's source; returned ids are
//!   source-qualified [`FragmentId`]s.
//! - Atoms and restraints are read back in insertion order.

use crate::db::DbError;
use crate::model::fragment::{
    FragmentAtom, FragmentMeta, FragmentValidationError, NewFragment, RestraintRecord,
};
use crate::model::id::{FragmentId, Source};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const META_SELECT_SQL: &str = "SELECT Id, Name, class, Reference, comment FROM Fragment";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for fragment persistence and lookups.
#[derive(Debug)]
pub enum RepoError {
    Validation(FragmentValidationError),
    Db(DbError),
    NotFound(FragmentId),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "fragment not found: {id}"),
            Self::InvalidData(message) => {
                write!(f, "invalid persisted fragment data: {message}")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<FragmentValidationError> for RepoError {
    fn from(value: FragmentValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Data access for one fragment source.
pub trait FragmentRepository {
    fn source(&self) -> Source;
    fn insert_fragment(&self, fragment: &NewFragment) -> RepoResult<FragmentId>;
    fn get_atoms(&self, row_id: i64) -> RepoResult<Vec<FragmentAtom>>;
    fn get_meta(&self, row_id: i64) -> RepoResult<Option<FragmentMeta>>;
    fn get_picture(&self, row_id: i64) -> RepoResult<Option<Vec<u8>>>;
    fn get_restraints(&self, row_id: i64) -> RepoResult<Vec<RestraintRecord>>;
    /// `(id, name)` of every fragment ordered by row id.
    fn list_names(&self) -> RepoResult<Vec<(FragmentId, String)>>;
    fn count(&self) -> RepoResult<usize>;
    fn exists(&self, row_id: i64) -> RepoResult<bool>;
    fn delete_fragment(&self, row_id: i64) -> RepoResult<()>;
    /// Case-sensitive full-name match.
    fn has_exact_name(&self, name: &str) -> RepoResult<bool>;
    /// Case-insensitive substring match.
    fn has_name_like(&self, part: &str) -> RepoResult<bool>;
    fn has_residue_class(&self, class: &str) -> RepoResult<bool>;
    fn max_row_id(&self) -> RepoResult<Option<i64>>;
}

/// SQLite-backed fragment repository.
pub struct SqliteFragmentRepository<'conn> {
    conn: &'conn Connection,
    source: Source,
}

impl<'conn> SqliteFragmentRepository<'conn> {
    pub fn new(conn: &'conn Connection, source: Source) -> Self {
        Self { conn, source }
    }

    fn fragment_id(&self, row_id: i64) -> RepoResult<FragmentId> {
        FragmentId::from_row(self.source, row_id).map_err(|err| {
            RepoError::InvalidData(format!("Fragment.Id {row_id} in {} source: {err}", self.source))
        })
    }

    fn exists_where(&self, sql: &str, value: &str) -> RepoResult<bool> {
        let exists: i64 = self
            .conn
            .query_row(&format!("SELECT EXISTS({sql});"), [value], |row| row.get(0))?;
        Ok(exists == 1)
    }
}

impl FragmentRepository for SqliteFragmentRepository<'_> {
    fn source(&self) -> Source {
        self.source
    }

    fn insert_fragment(&self, fragment: &NewFragment) -> RepoResult<FragmentId> {
        fragment.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO Fragment (class, Name, Reference, comment, picture)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                fragment.residue_class.as_str(),
                fragment.name.trim(),
                fragment.reference.as_deref(),
                fragment.comment.as_deref(),
                fragment.picture.as_deref(),
            ],
        )?;
        let row_id = tx.last_insert_rowid();

        {
            let mut insert_atom = tx.prepare(
                "INSERT INTO Atoms (FragmentId, Name, element, x, y, z)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            )?;
            for atom in &fragment.atoms {
                insert_atom.execute(params![
                    row_id,
                    atom.name.as_str(),
                    atom.element.as_str(),
                    atom.x,
                    atom.y,
                    atom.z,
                ])?;
            }

            let mut insert_restraint = tx.prepare(
                "INSERT INTO Restraints (FragmentId, ShelxName, Atoms)
                 VALUES (?1, ?2, ?3);",
            )?;
            for record in fragment.restraint_records() {
                insert_restraint.execute(params![
                    row_id,
                    record.card.as_str(),
                    record.atom_spec.as_str(),
                ])?;
            }
        }

        let id = self.fragment_id(row_id)?;
        tx.commit()?;
        Ok(id)
    }

    fn get_atoms(&self, row_id: i64) -> RepoResult<Vec<FragmentAtom>> {
        let mut stmt = self.conn.prepare(
            "SELECT Name, element, x, y, z
             FROM Atoms
             WHERE FragmentId = ?1
             ORDER BY Id ASC;",
        )?;
        let mut rows = stmt.query([row_id])?;
        let mut atoms = Vec::new();
        while let Some(row) = rows.next()? {
            atoms.push(parse_atom_row(row)?);
        }
        Ok(atoms)
    }

    fn get_meta(&self, row_id: i64) -> RepoResult<Option<FragmentMeta>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{META_SELECT_SQL} WHERE Id = ?1;"))?;
        let mut rows = stmt.query([row_id])?;
        match rows.next()? {
            Some(row) => Ok(Some(self.parse_meta_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_picture(&self, row_id: i64) -> RepoResult<Option<Vec<u8>>> {
        let picture = self
            .conn
            .query_row(
                "SELECT picture FROM Fragment WHERE Id = ?1;",
                [row_id],
                |row| row.get::<_, Option<Vec<u8>>>(0),
            )
            .optional()?;
        Ok(picture.flatten())
    }

    fn get_restraints(&self, row_id: i64) -> RepoResult<Vec<RestraintRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT ShelxName, Atoms
             FROM Restraints
             WHERE FragmentId = ?1
             ORDER BY Id ASC;",
        )?;
        let records = stmt
            .query_map([row_id], |row| {
                Ok(RestraintRecord::new(
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    fn list_names(&self) -> RepoResult<Vec<(FragmentId, String)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT Id, Name FROM Fragment ORDER BY Id ASC;")?;
        let mut rows = stmt.query([])?;
        let mut names = Vec::new();
        while let Some(row) = rows.next()? {
            let id = self.fragment_id(row.get(0)?)?;
            names.push((id, row.get(1)?));
        }
        Ok(names)
    }

    fn count(&self) -> RepoResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM Fragment;", [], |row| row.get(0))?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative fragment count {count}")))
    }

    fn exists(&self, row_id: i64) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM Fragment WHERE Id = ?1);",
            [row_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn delete_fragment(&self, row_id: i64) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM Fragment WHERE Id = ?1;", [row_id])?;
        if changed == 0 {
            return Err(RepoError::NotFound(self.fragment_id(row_id)?));
        }
        Ok(())
    }

    fn has_exact_name(&self, name: &str) -> RepoResult<bool> {
        self.exists_where("SELECT 1 FROM Fragment WHERE Name = ?1", name)
    }

    fn has_name_like(&self, part: &str) -> RepoResult<bool> {
        let pattern = format!("%{}%", escape_like(part));
        self.exists_where(
            "SELECT 1 FROM Fragment WHERE Name LIKE ?1 ESCAPE '\\'",
            &pattern,
        )
    }

    fn has_residue_class(&self, class: &str) -> RepoResult<bool> {
        self.exists_where("SELECT 1 FROM Fragment WHERE class = ?1", class)
    }

    fn max_row_id(&self) -> RepoResult<Option<i64>> {
        let max = self
            .conn
            .query_row("SELECT MAX(Id) FROM Fragment;", [], |row| {
                row.get::<_, Option<i64>>(0)
            })?;
        Ok(max)
    }
}

impl SqliteFragmentRepository<'_> {
    fn parse_meta_row(&self, row: &Row<'_>) -> RepoResult<FragmentMeta> {
        Ok(FragmentMeta {
            id: self.fragment_id(row.get("Id")?)?,
            name: row.get("Name")?,
            residue_class: row.get::<_, Option<String>>("class")?.unwrap_or_default(),
            reference: row.get("Reference")?,
            comment: row.get("comment")?,
        })
    }
}

fn parse_atom_row(row: &Row<'_>) -> RepoResult<FragmentAtom> {
    let element = match row.get::<_, Value>("element")? {
        Value::Text(text) => text,
        Value::Integer(number) => number.to_string(),
        Value::Real(number) => number.to_string(),
        Value::Null => String::new(),
        Value::Blob(_) => {
            return Err(RepoError::InvalidData(
                "blob value in Atoms.element".to_string(),
            ));
        }
    };

    Ok(FragmentAtom {
        name: row.get("Name")?,
        element,
        x: row.get("x")?,
        y: row.get("y")?,
        z: row.get("z")?,
    })
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::{escape_like, FragmentRepository, RepoError, SqliteFragmentRepository};
    use crate::db::open_db_in_memory;
    use crate::model::fragment::{FragmentAtom, NewFragment, RestraintRecord};
    use crate::model::id::{FragmentId, Source};
    use crate::restraints::RestraintLine;

    fn toluene() -> NewFragment {
        let mut fragment = NewFragment::new(
            "Toluene, C7H8",
            vec![
                FragmentAtom::new("C1", "6", [0.0, 0.0, 0.0]),
                FragmentAtom::new("C2", "6", [1.39, 0.0, 0.0]),
                FragmentAtom::new("C7", "6", [-1.5, 0.0, 0.0]),
            ],
        );
        fragment.residue_class = "TOL".to_string();
        fragment.reference = Some("CSD average".to_string());
        fragment.restraints = vec![RestraintLine::parse("SADI C1 C2 C1 C7").unwrap()];
        fragment
    }

    #[test]
    fn insert_and_read_back() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteFragmentRepository::new(&conn, Source::User);

        let id = repo.insert_fragment(&toluene()).unwrap();
        assert_eq!(id, FragmentId::User(1));

        let atoms = repo.get_atoms(1).unwrap();
        assert_eq!(atoms.len(), 3);
        assert_eq!(atoms[2].name, "C7");

        let meta = repo.get_meta(1).unwrap().unwrap();
        assert_eq!(meta.id, id);
        assert_eq!(meta.residue_class, "TOL");
        assert_eq!(meta.reference.as_deref(), Some("CSD average"));
        assert_eq!(meta.comment, None);

        assert_eq!(
            repo.get_restraints(1).unwrap(),
            vec![RestraintRecord::new("SADI", "C1 C2 C1 C7")]
        );
        assert_eq!(repo.get_picture(1).unwrap(), None);
        assert_eq!(repo.count().unwrap(), 1);
        assert_eq!(repo.max_row_id().unwrap(), Some(1));
    }

    #[test]
    fn insert_rejects_invalid_fragment_before_sql() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteFragmentRepository::new(&conn, Source::User);
        let err = repo
            .insert_fragment(&NewFragment::new("", Vec::new()))
            .unwrap_err();
        assert!(matches!(err, RepoError::Validation(_)));
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn delete_cascades_and_reports_missing_rows() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteFragmentRepository::new(&conn, Source::User);
        repo.insert_fragment(&toluene()).unwrap();

        repo.delete_fragment(1).unwrap();
        assert!(!repo.exists(1).unwrap());
        assert!(repo.get_atoms(1).unwrap().is_empty());
        let orphans: i64 = conn
            .query_row("SELECT COUNT(*) FROM Restraints;", [], |row| row.get(0))
            .unwrap();
        assert_eq!(orphans, 0);

        assert!(matches!(
            repo.delete_fragment(1),
            Err(RepoError::NotFound(FragmentId::User(1)))
        ));
    }

    #[test]
    fn name_and_class_lookups() {
        let conn = open_db_in_memory().unwrap();
        let repo = SqliteFragmentRepository::new(&conn, Source::Primary);
        repo.insert_fragment(&toluene()).unwrap();

        assert!(repo.has_exact_name("Toluene, C7H8").unwrap());
        assert!(!repo.has_exact_name("toluene, c7h8").unwrap());
        assert!(repo.has_name_like("toluene").unwrap());
        assert!(!repo.has_name_like("tol%").unwrap());
        assert!(repo.has_residue_class("TOL").unwrap());
        assert!(!repo.has_residue_class("BENZ").unwrap());
        assert_eq!(
            repo.list_names().unwrap(),
            vec![(FragmentId::Primary(1), "Toluene, C7H8".to_string())]
        );
    }

    #[test]
    fn numeric_elements_from_legacy_rows_become_text() {
        let conn = open_db_in_memory().unwrap();
        conn.execute_batch(
            "INSERT INTO Fragment (Id, Name) VALUES (7, 'Water');
             INSERT INTO Atoms (FragmentId, Name, element, x, y, z)
             VALUES (7, 'O1', 8, 0.0, 0.0, 0.0);",
        )
        .unwrap();
        let repo = SqliteFragmentRepository::new(&conn, Source::Primary);
        let atoms = repo.get_atoms(7).unwrap();
        assert_eq!(atoms[0].element, "8");
        assert_eq!(repo.get_meta(7).unwrap().unwrap().residue_class, "");
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(escape_like("50%_a\\b"), "50\\%\\_a\\\\b");
    }
}
