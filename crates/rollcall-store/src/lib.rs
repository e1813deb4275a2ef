//! rollcall-store: SQLite persistence for employees and attendance.
//!
//! Two tables: `employees` and `attendance`, joined on the employee name
//! with a cascading foreign key. The [`desk`] module layers the presence
//! tracker over the recorder.

pub mod attendance;
pub mod desk;
pub mod employees;
mod schema;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

pub use attendance::{AttendanceRecord, DailyStats, Recorded};
pub use desk::{Desk, FaceEvent};
pub use employees::{DuplicateField, Employee, NewEmployee};
pub use schema::SCHEMA;

/// Date format of `attendance.date`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Time format of `attendance.time_in` / `time_out`.
pub const TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("cannot create database directory {path}: {source}")]
    CreateDir {
        path: String,
        source: std::io::Error,
    },
    #[error("{0}")]
    Duplicate(DuplicateField),
    #[error("integrity error: {0}")]
    Integrity(String),
    #[error("stored encoding for {name} is corrupt: {source}")]
    Encoding {
        name: String,
        source: rollcall_core::types::EncodingError,
    },
    #[error("no employee named {0}")]
    NotFound(String),
}

/// Handle to the attendance database.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|source| StoreError::CreateDir {
                path: dir.display().to_string(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        tracing::debug!(path = %path.display(), "opened attendance database");
        Self::init(conn)
    }

    /// Private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        // per-connection; required for ON DELETE CASCADE
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }
}
