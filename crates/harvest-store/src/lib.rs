//! Harvest Storage Layer
//!
//! Implements the [`RowStore`] trait on a single SQLite file per run.
//!
//! # Layout
//!
//! - `descriptors`: assigned identifier to origin descriptor
//! - `tokens`: one row per token, keyed to the identifier by convention
//! - `metadata`: one row per emitted record
//!
//! The file is written under a temporary name and renamed by
//! [`finalize`](RowStore::finalize) to embed the minimum and maximum
//! identifier it contains.
//!
//! # Connections
//!
//! Every write opens its own connection, commits and closes it again, so
//! a process killed between records leaves the file consistent up to the
//! last committed record.
//!
//! # Examples
//!
//! ```no_run
//! use harvest_store::SqliteRowStore;
//! use harvest_domain::traits::RowStore;
//!
//! let store = SqliteRowStore::create("output", "fulltext").unwrap();
//! let path = store.finalize().unwrap();
//! println!("{}", path.display());
//! ```

#![warn(missing_docs)]

use harvest_domain::traits::RowStore;
use harvest_domain::{AssignedId, RowStoreRecord, TokenRecord};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A file already occupies a path this store needs
    #[error("Refusing to overwrite existing file: {0}")]
    AlreadyExists(PathBuf),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

/// SQLite-backed row store for one run
///
/// Holds only paths; connections are scoped to each operation.
#[derive(Debug)]
pub struct SqliteRowStore {
    dir: PathBuf,
    prefix: String,
    working_path: PathBuf,
}

impl SqliteRowStore {
    /// Create the working file for a new run in `dir`
    ///
    /// The working file is named `<prefix>.in-progress.sqlite`. A leftover
    /// working file from an interrupted run is never reused.
    pub fn create<P: AsRef<Path>>(dir: P, prefix: &str) -> Result<Self, StoreError> {
        let dir = dir.as_ref().to_path_buf();
        let working_path = dir.join(format!("{}.in-progress.sqlite", prefix));
        if working_path.exists() {
            return Err(StoreError::AlreadyExists(working_path));
        }

        let conn = Connection::open(&working_path)?;
        conn.execute_batch(include_str!("schema.sql"))?;
        drop(conn);

        info!("Row store opened at {}", working_path.display());
        Ok(Self {
            dir,
            prefix: prefix.to_string(),
            working_path,
        })
    }

    /// Path of the not-yet-finalized file
    pub fn working_path(&self) -> &Path {
        &self.working_path
    }

    /// Minimum and maximum identifier in the metadata table
    pub fn id_range(&self) -> Result<Option<(AssignedId, AssignedId)>, StoreError> {
        let conn = Connection::open(&self.working_path)?;
        id_range(&conn)
    }

    /// File name the store will be renamed to
    fn finalized_path(&self, range: Option<(AssignedId, AssignedId)>) -> PathBuf {
        let name = match range {
            Some((min, max)) => format!("{}_{}_{}.sqlite", self.prefix, min, max),
            None => format!("{}_empty.sqlite", self.prefix),
        };
        self.dir.join(name)
    }
}

impl RowStore for SqliteRowStore {
    type Error = StoreError;

    fn insert_record(
        &mut self,
        record: &RowStoreRecord,
        tokens: &[TokenRecord],
    ) -> Result<(), Self::Error> {
        let mut conn = Connection::open(&self.working_path)?;
        let tx = conn.transaction()?;
        let id = to_sql_id(record.assigned_id)?;

        tx.execute(
            "INSERT INTO descriptors (assigned_id, descriptor) VALUES (?1, ?2)",
            params![id, &record.descriptor],
        )?;

        tx.execute(
            "INSERT INTO metadata (assigned_id, content_hash, title, domain, responsible_editor,
                                   place, county, source_record_id, origin_path, timestamp, uri)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                id,
                &record.content_hash,
                &record.title,
                &record.domain,
                record.responsible_editor,
                &record.place,
                &record.county,
                &record.source_record_id,
                &record.origin_path,
                &record.timestamp,
                &record.uri,
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO tokens (assigned_id, token, seq, para) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for token in tokens {
                stmt.execute(params![
                    id,
                    &token.token,
                    token.sequence as i64,
                    token.paragraph as i64,
                ])?;
            }
        }

        tx.commit()?;
        debug!(
            "Committed record {} with {} tokens",
            record.assigned_id,
            tokens.len()
        );
        Ok(())
    }

    fn finalize(self) -> Result<PathBuf, Self::Error> {
        let range = self.id_range()?;
        let destination = self.finalized_path(range);
        if destination.exists() {
            return Err(StoreError::AlreadyExists(destination));
        }

        std::fs::rename(&self.working_path, &destination)?;
        info!("Row store finalized as {}", destination.display());
        Ok(destination)
    }
}

fn to_sql_id(id: AssignedId) -> Result<i64, StoreError> {
    i64::try_from(id.value())
        .map_err(|_| StoreError::InvalidData(format!("Identifier {} exceeds i64", id)))
}

fn id_range(conn: &Connection) -> Result<Option<(AssignedId, AssignedId)>, StoreError> {
    let (min, max): (Option<i64>, Option<i64>) = conn.query_row(
        "SELECT MIN(assigned_id), MAX(assigned_id) FROM metadata",
        [],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    match (min, max) {
        (Some(min), Some(max)) => Ok(Some((
            AssignedId::from_value(min as u64),
            AssignedId::from_value(max as u64),
        ))),
        _ => Ok(None),
    }
}

/// Read-only view of a row-store file, finalized or not
///
/// Used to reconcile the row store against the record log.
pub struct RowStoreReader {
    conn: Connection,
}

impl RowStoreReader {
    /// Open an existing row-store file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        )?;
        Ok(Self { conn })
    }

    /// Minimum and maximum identifier in the metadata table
    pub fn id_range(&self) -> Result<Option<(AssignedId, AssignedId)>, StoreError> {
        id_range(&self.conn)
    }

    /// Identifiers present in the metadata table, ascending
    pub fn assigned_ids(&self) -> Result<Vec<AssignedId>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT assigned_id FROM metadata ORDER BY assigned_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids
            .into_iter()
            .map(|id| AssignedId::from_value(id as u64))
            .collect())
    }

    /// Descriptors mapped to an identifier, in insertion order
    pub fn descriptors(&self, id: AssignedId) -> Result<Vec<String>, StoreError> {
        let sql_id = to_sql_id(id)?;
        let mut stmt = self.conn.prepare(
            "SELECT descriptor FROM descriptors WHERE assigned_id = ?1 ORDER BY rowid",
        )?;
        let descriptors = stmt
            .query_map(params![sql_id], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(descriptors)
    }

    /// Metadata rows for an identifier, in insertion order
    ///
    /// Descriptor and metadata rows are written in the same transaction,
    /// so the n-th descriptor of an identifier belongs to its n-th
    /// metadata row.
    pub fn metadata(&self, id: AssignedId) -> Result<Vec<RowStoreRecord>, StoreError> {
        let sql_id = to_sql_id(id)?;
        let descriptors = self.descriptors(id)?;
        let mut stmt = self.conn.prepare(
            "SELECT content_hash, title, domain, responsible_editor, place, county,
                    source_record_id, origin_path, timestamp, uri
             FROM metadata
             WHERE assigned_id = ?1
             ORDER BY rowid",
        )?;

        let rows = stmt
            .query_map(params![sql_id], |row| {
                Ok(RowStoreRecord {
                    assigned_id: id,
                    descriptor: String::new(),
                    content_hash: row.get(0)?,
                    title: row.get(1)?,
                    domain: row.get(2)?,
                    responsible_editor: row.get(3)?,
                    place: row.get(4)?,
                    county: row.get(5)?,
                    source_record_id: row.get(6)?,
                    origin_path: row.get(7)?,
                    timestamp: row.get(8)?,
                    uri: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if rows.len() != descriptors.len() {
            return Err(StoreError::InvalidData(format!(
                "Identifier {} has {} metadata rows but {} descriptors",
                id,
                rows.len(),
                descriptors.len()
            )));
        }

        Ok(rows
            .into_iter()
            .zip(descriptors)
            .map(|(row, descriptor)| RowStoreRecord { descriptor, ..row })
            .collect())
    }

    /// Tokens for an identifier in sequence order
    pub fn tokens(&self, id: AssignedId) -> Result<Vec<TokenRecord>, StoreError> {
        let sql_id = to_sql_id(id)?;
        let mut stmt = self.conn.prepare(
            "SELECT token, seq, para FROM tokens WHERE assigned_id = ?1 ORDER BY seq",
        )?;
        let tokens = stmt
            .query_map(params![sql_id], |row| {
                Ok(TokenRecord {
                    token: row.get(0)?,
                    sequence: row.get::<_, i64>(1)? as u64,
                    paragraph: row.get::<_, i64>(2)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tokens)
    }

    /// Number of rows in the metadata table
    pub fn record_count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM metadata", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}
