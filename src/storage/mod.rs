//! SQLite storage layer for the page analyzer
//!
//! This module handles persistent storage of:
//! - Registered sites, unique by normalized name
//! - The append-only check history of each site
//!
//! Uniqueness and referential integrity are enforced by the schema, not by
//! read-then-write logic, so concurrent writers cannot produce duplicates or
//! orphaned checks.

mod models;
mod schema;

pub use models::{Check, DatabaseStats, NewCheck, Site, SiteSummary};
pub use schema::{PRAGMAS, SCHEMA};

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use rusqlite::{ffi, params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// How long a writer waits for another connection's write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

type Result<T> = std::result::Result<T, StoreError>;

/// Database connection wrapper
///
/// The handle is `Send + Sync`; statements are serialized on one connection.
/// Several handles may point at the same file and rely on SQLite locking.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database from a connection string.
    ///
    /// Accepts a plain file path, a `sqlite://` URL, or `:memory:`.
    pub fn connect(url: &str) -> Result<Self> {
        let path = url.strip_prefix("sqlite://").unwrap_or(url);
        if path == ":memory:" {
            Self::open_in_memory()
        } else {
            Self::open(path)
        }
    }

    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;
        Self::initialize(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(conn)
    }

    /// Apply connection settings and the schema
    fn initialize(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch(PRAGMAS)?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    // ==================== Sites ====================

    /// Find a site by its exact normalized name
    pub fn find_site_by_name(&self, name: &str) -> Result<Option<Site>> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, created_at FROM sites WHERE name = ?1",
                params![name],
                SiteRow::from_row,
            )
            .optional()?;

        row.map(SiteRow::into_site).transpose()
    }

    /// Insert a new site.
    ///
    /// Fails with [`StoreError::Duplicate`] when the unique index on `name`
    /// rejects the row.
    pub fn create_site(&self, name: &str) -> Result<Site> {
        self.insert_site(name, Utc::now())
    }

    fn insert_site(&self, name: &str, created_at: DateTime<Utc>) -> Result<Site> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = tx.execute(
            "INSERT INTO sites (name, created_at) VALUES (?1, ?2)",
            params![name, format_timestamp(&created_at)],
        );
        if let Err(e) = inserted {
            return Err(match constraint_code(&e) {
                Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => StoreError::Duplicate {
                    name: name.to_string(),
                },
                _ => e.into(),
            });
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(site_id = id, name, "site created");

        Ok(Site {
            id,
            name: name.to_string(),
            created_at: truncate_to_stored(created_at),
        })
    }

    /// Get a site by ID
    pub fn get_site(&self, id: i64) -> Result<Site> {
        let conn = self.conn()?;
        let row = conn
            .query_row(
                "SELECT id, name, created_at FROM sites WHERE id = ?1",
                params![id],
                SiteRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => row.into_site(),
            None => Err(StoreError::NotFound { id }),
        }
    }

    /// List every site with its latest check, newest site first.
    ///
    /// The latest check is the one with the greatest `created_at`, ties broken
    /// by the greatest `id`. Runs as a single query.
    pub fn list_sites_with_latest_check(&self) -> Result<Vec<SiteSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT s.id, s.name, s.created_at,
                   c.id, c.site_id, c.status_code, c.h1, c.title, c.description, c.created_at
            FROM sites s
            LEFT JOIN checks c ON c.id = (
                SELECT latest.id FROM checks latest
                WHERE latest.site_id = s.id
                ORDER BY latest.created_at DESC, latest.id DESC
                LIMIT 1
            )
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            let site = SiteRow::from_row(row)?;
            let check_id: Option<i64> = row.get(3)?;
            let check = match check_id {
                Some(id) => Some(CheckRow {
                    id,
                    site_id: row.get(4)?,
                    status_code: row.get(5)?,
                    h1: row.get(6)?,
                    title: row.get(7)?,
                    description: row.get(8)?,
                    created_at: row.get(9)?,
                }),
                None => None,
            };
            Ok((site, check))
        })?;

        let mut summaries = Vec::new();
        for row in rows {
            let (site, check) = row?;
            summaries.push(SiteSummary {
                site: site.into_site()?,
                latest_check: check.map(CheckRow::into_check).transpose()?,
            });
        }

        Ok(summaries)
    }

    /// Delete a site; its checks go with it through the cascade
    pub fn delete_site(&self, id: i64) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let count = tx.execute("DELETE FROM sites WHERE id = ?1", params![id])?;
        if count == 0 {
            return Err(StoreError::NotFound { id });
        }
        tx.commit()?;

        tracing::debug!(site_id = id, "site deleted");
        Ok(())
    }

    // ==================== Checks ====================

    /// Get all checks for a site, newest first
    pub fn list_checks(&self, site_id: i64) -> Result<Vec<Check>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, site_id, status_code, h1, title, description, created_at
            FROM checks WHERE site_id = ?1
            ORDER BY created_at DESC, id DESC
            "#,
        )?;

        let rows = stmt.query_map(params![site_id], CheckRow::from_row)?;

        let mut checks = Vec::new();
        for row in rows {
            checks.push(row?.into_check()?);
        }

        Ok(checks)
    }

    /// Append a check to a site's history.
    ///
    /// Fails with [`StoreError::NotFound`] when the foreign key rejects the row.
    pub fn create_check(&self, site_id: i64, check: &NewCheck) -> Result<Check> {
        self.insert_check(site_id, check, Utc::now())
    }

    fn insert_check(
        &self,
        site_id: i64,
        check: &NewCheck,
        created_at: DateTime<Utc>,
    ) -> Result<Check> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let inserted = tx.execute(
            r#"
            INSERT INTO checks (site_id, status_code, h1, title, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                site_id,
                check.status_code.map(i64::from),
                check.h1,
                check.title,
                check.description,
                format_timestamp(&created_at),
            ],
        );
        if let Err(e) = inserted {
            return Err(match constraint_code(&e) {
                Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => StoreError::NotFound { id: site_id },
                _ => e.into(),
            });
        }

        let id = tx.last_insert_rowid();
        tx.commit()?;

        tracing::debug!(check_id = id, site_id, status = ?check.status_code, "check recorded");

        Ok(Check {
            id,
            site_id,
            status_code: check.status_code,
            h1: check.h1.clone(),
            title: check.title.clone(),
            description: check.description.clone(),
            created_at: truncate_to_stored(created_at),
        })
    }

    // ==================== Statistics ====================

    /// Get database statistics
    pub fn stats(&self) -> Result<DatabaseStats> {
        let conn = self.conn()?;
        let sites: i64 = conn.query_row("SELECT COUNT(*) FROM sites", [], |row| row.get(0))?;
        let checks: i64 = conn.query_row("SELECT COUNT(*) FROM checks", [], |row| row.get(0))?;

        Ok(DatabaseStats {
            sites: sites as usize,
            checks: checks as usize,
        })
    }
}

/// Extended result code of a constraint violation, if `err` is one
fn constraint_code(err: &rusqlite::Error) -> Option<i32> {
    match err {
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation => {
            Some(e.extended_code)
        }
        _ => None,
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(column: usize, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| {
            StoreError::Database(rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            ))
        })
}

/// The timestamp as it reads back after a round trip through the store
fn truncate_to_stored(ts: DateTime<Utc>) -> DateTime<Utc> {
    parse_timestamp(0, &format_timestamp(&ts)).unwrap_or(ts)
}

// Internal row types for database mapping

struct SiteRow {
    id: i64,
    name: String,
    created_at: String,
}

impl SiteRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            created_at: row.get(2)?,
        })
    }

    fn into_site(self) -> Result<Site> {
        Ok(Site {
            id: self.id,
            name: self.name,
            created_at: parse_timestamp(2, &self.created_at)?,
        })
    }
}

struct CheckRow {
    id: i64,
    site_id: i64,
    status_code: Option<i64>,
    h1: Option<String>,
    title: Option<String>,
    description: Option<String>,
    created_at: String,
}

impl CheckRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            site_id: row.get(1)?,
            status_code: row.get(2)?,
            h1: row.get(3)?,
            title: row.get(4)?,
            description: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_check(self) -> Result<Check> {
        Ok(Check {
            id: self.id,
            site_id: self.site_id,
            status_code: self.status_code.and_then(|code| u16::try_from(code).ok()),
            h1: self.h1.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            created_at: parse_timestamp(6, &self.created_at)?,
        })
    }
}
