//! Connection bootstrap utilities for fragment sources.
//!
//! # Responsibility
//! - Open file, read-only file, or in-memory SQLite connections.
//! - Configure connection pragmas required by cascade deletes.
//! - Migrate writable connections, verify schema on read-only ones.
//! - Recreate an uninitialised user database file before first use.

use super::migrations::apply_migrations;
use super::{DbError, DbResult, REQUIRED_TABLES};
use log::{error, info, warn};
use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::{Duration, Instant};

/// Opens a writable fragment database file and applies pending migrations.
///
/// The file is created when it does not exist yet.
///
/// # Side effects
/// - Emits `db_open` logging events with duration and status.
pub fn open_db(path: impl AsRef<Path>) -> DbResult<Connection> {
    open_logged("file", || Connection::open(path), |conn| {
        configure(conn)?;
        apply_migrations(conn)
    })
}

/// Opens an in-memory fragment database with the full schema.
pub fn open_db_in_memory() -> DbResult<Connection> {
    open_logged("memory", Connection::open_in_memory, |conn| {
        configure(conn)?;
        apply_migrations(conn)
    })
}

/// Opens an existing fragment database without write access.
///
/// No migration runs here; the three fragment tables must already exist.
pub fn open_db_read_only(path: impl AsRef<Path>) -> DbResult<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_ONLY
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    open_logged(
        "read_only",
        || Connection::open_with_flags(path, flags),
        |conn| {
            configure(conn)?;
            ensure_schema_present(conn)
        },
    )
}

/// Prepares the user database location before it is opened.
///
/// A file smaller than `min_bytes` was never initialised with the fragment
/// schema and is removed, so the following [`open_db`] creates it fresh.
/// Returns `true` when the database will be created on open.
pub fn prepare_user_db(path: impl AsRef<Path>, min_bytes: u64) -> DbResult<bool> {
    let path = path.as_ref();
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            info!("event=user_db_prepare module=db status=ok action=create");
            return Ok(true);
        }
        Err(err) => return Err(err.into()),
    };

    if metadata.len() >= min_bytes {
        return Ok(false);
    }

    warn!(
        "event=user_db_prepare module=db status=ok action=recreate size_bytes={} min_bytes={}",
        metadata.len(),
        min_bytes
    );
    std::fs::remove_file(path)?;
    Ok(true)
}

fn open_logged<O, B>(mode: &str, opener: O, bootstrap: B) -> DbResult<Connection>
where
    O: FnOnce() -> rusqlite::Result<Connection>,
    B: FnOnce(&mut Connection) -> DbResult<()>,
{
    let started_at = Instant::now();
    info!("event=db_open module=db status=start mode={mode}");

    let mut conn = match opener() {
        Ok(conn) => conn,
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_open_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }
    };

    match bootstrap(&mut conn) {
        Ok(()) => {
            info!(
                "event=db_open module=db status=ok mode={} duration_ms={}",
                mode,
                started_at.elapsed().as_millis()
            );
            Ok(conn)
        }
        Err(err) => {
            error!(
                "event=db_open module=db status=error mode={} duration_ms={} error_code=db_bootstrap_failed error={}",
                mode,
                started_at.elapsed().as_millis(),
                err
            );
            Err(err)
        }
    }
}

fn configure(conn: &Connection) -> DbResult<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_secs(5))?;
    Ok(())
}

fn ensure_schema_present(conn: &Connection) -> DbResult<()> {
    for table in REQUIRED_TABLES {
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM sqlite_master
                WHERE type = 'table' AND name = ?1 COLLATE NOCASE
            );",
            [table],
            |row| row.get(0),
        )?;
        if exists != 1 {
            return Err(DbError::MissingTable(table));
        }
    }
    Ok(())
}
