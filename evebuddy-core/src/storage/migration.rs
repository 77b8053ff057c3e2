// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Database Schema Migration Framework
//!
//! Provides versioned schema migrations with transactional safety.
//! The runner tracks applied versions in a `schema_version` table and runs
//! pending migrations in order within a single transaction.

use rusqlite::Connection;

use super::StorageError;

/// A single schema migration step.
pub struct Migration {
    /// Monotonically increasing version number (starting at 1).
    pub version: u32,
    /// Human-readable name for this migration.
    pub name: &'static str,
    /// SQL executed as one batch.
    pub sql: &'static str,
}

/// Runs schema migrations against a database connection.
pub struct MigrationRunner;

impl MigrationRunner {
    /// Runs all pending migrations in a transaction.
    ///
    /// Creates the `schema_version` table if it doesn't exist, then applies
    /// any migrations whose version is greater than the current schema version.
    /// If any migration fails, all changes are rolled back.
    pub fn run(conn: &Connection, migrations: &[Migration]) -> Result<(), StorageError> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at INTEGER NOT NULL
            );",
        )?;

        let current_version = Self::current_version(conn)?;

        let pending: Vec<&Migration> = migrations
            .iter()
            .filter(|m| m.version > current_version)
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        for window in pending.windows(2) {
            if window[0].version >= window[1].version {
                return Err(StorageError::Migration(format!(
                    "Migrations are not in order: v{} before v{}",
                    window[0].version, window[1].version
                )));
            }
        }

        conn.execute_batch("BEGIN EXCLUSIVE TRANSACTION;")?;

        for migration in &pending {
            if let Err(e) = conn.execute_batch(migration.sql) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StorageError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e
                )));
            }

            let now = crate::clock::to_unix_millis(std::time::SystemTime::now()) / 1000;

            if let Err(e) = conn.execute(
                "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                rusqlite::params![migration.version, now],
            ) {
                conn.execute_batch("ROLLBACK;")?;
                return Err(StorageError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e
                )));
            }
        }

        conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    /// Returns the current schema version, or 0 if no migrations have been applied.
    pub fn current_version(conn: &Connection) -> Result<u32, StorageError> {
        let table_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name='schema_version'",
            [],
            |row| row.get(0),
        )?;

        if !table_exists {
            return Ok(0);
        }

        let version: Option<u32> =
            conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get(0)
            })?;

        Ok(version.unwrap_or(0))
    }
}

/// Returns all registered migrations in version order.
///
/// This is the single source of truth for the database schema.
/// New migrations are appended to the end of this list.
pub fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            name: "section_status",
            sql: MIGRATION_V1_SECTION_STATUS,
        },
        Migration {
            version: 2,
            name: "section_status_entity_index",
            sql: MIGRATION_V2_ENTITY_INDEX,
        },
    ]
}

/// Migration v1: one row per `(entity, scope, section)`.
///
/// Timestamps are milliseconds since the UNIX epoch.
const MIGRATION_V1_SECTION_STATUS: &str = "
    CREATE TABLE IF NOT EXISTS section_status (
        entity_id INTEGER NOT NULL,
        scope TEXT NOT NULL,
        section TEXT NOT NULL,
        started_at INTEGER,
        completed_at INTEGER,
        content_hash TEXT NOT NULL DEFAULT '',
        error_message TEXT NOT NULL DEFAULT '',
        updated_at INTEGER NOT NULL,
        PRIMARY KEY (entity_id, scope, section)
    );
";

/// Migration v2: entity listing and cascade deletes go by `(scope, entity_id)`.
const MIGRATION_V2_ENTITY_INDEX: &str = "
    CREATE INDEX IF NOT EXISTS idx_section_status_scope_entity
        ON section_status (scope, entity_id);
";
