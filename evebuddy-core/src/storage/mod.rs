// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Persistent Storage Module
//!
//! SQLite-backed persistence of section update statuses.

mod error;
pub mod migration;
mod section_status;

pub use error::StorageError;

use std::path::Path;

use parking_lot::Mutex;
use rusqlite::Connection;

/// SQLite-based storage implementation.
///
/// The connection is guarded by a mutex, so one `Storage` can be shared
/// between threads behind an `Arc`.
pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    /// Opens or creates a storage database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Creates an in-memory storage (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StorageError> {
        migration::MigrationRunner::run(&conn, &migration::all_migrations())?;
        Ok(Storage {
            conn: Mutex::new(conn),
        })
    }

    /// Returns the current schema version.
    pub fn schema_version(&self) -> Result<u32, StorageError> {
        migration::MigrationRunner::current_version(&self.conn.lock())
    }
}
