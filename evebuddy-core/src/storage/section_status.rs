// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Section status storage operations.

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use super::{Storage, StorageError};
use crate::clock::{from_unix_millis, to_unix_millis};
use crate::section::{EntityId, SectionId, SectionKey, SectionScope};
use crate::status::{SectionStatus, StatusPatch, StatusStore};

const SELECT_COLUMNS: &str = "SELECT entity_id, scope, section, started_at, completed_at,
            content_hash, error_message, updated_at
     FROM section_status";

impl Storage {
    // === Section Status Operations ===

    /// Gets the status of a section.
    pub fn get_section_status(
        &self,
        key: &SectionKey,
    ) -> Result<Option<SectionStatus>, StorageError> {
        let conn = self.conn.lock();
        query_status(&conn, key)
    }

    /// Merges a patch into the status of a section, creating it if missing.
    ///
    /// Read, merge and write happen in one immediate transaction.
    pub fn upsert_section_status(
        &self,
        key: &SectionKey,
        patch: &StatusPatch,
    ) -> Result<SectionStatus, StorageError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut status = query_status(&tx, key)?
            .unwrap_or_else(|| SectionStatus::new(key.clone(), patch.updated_at));
        status.apply(patch);

        tx.execute(
            "INSERT INTO section_status
             (entity_id, scope, section, started_at, completed_at, content_hash, error_message, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
             ON CONFLICT (entity_id, scope, section) DO UPDATE SET
                started_at = excluded.started_at,
                completed_at = excluded.completed_at,
                content_hash = excluded.content_hash,
                error_message = excluded.error_message,
                updated_at = excluded.updated_at",
            params![
                status.key.entity_id,
                status.key.section.scope().as_str(),
                status.key.section.name(),
                status.started_at.map(to_unix_millis),
                status.completed_at.map(to_unix_millis),
                status.content_hash,
                status.error_message,
                to_unix_millis(status.updated_at),
            ],
        )?;
        tx.commit()?;

        Ok(status)
    }

    /// Lists the statuses of one entity within a scope, ordered by section name.
    pub fn list_section_statuses(
        &self,
        scope: SectionScope,
        entity_id: EntityId,
    ) -> Result<Vec<SectionStatus>, StorageError> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE scope = ?1 AND entity_id = ?2 ORDER BY section"
        ))?;

        let rows = stmt.query_map(params![scope.as_str(), entity_id], row_to_status)?;

        rows.collect::<Result<Vec<_>, _>>()
            .map_err(StorageError::Database)
    }

    /// Deletes all statuses of an entity. Returns the number of deleted rows.
    ///
    /// Called when a character or corporation is removed.
    pub fn delete_entity_statuses(
        &self,
        scope: SectionScope,
        entity_id: EntityId,
    ) -> Result<usize, StorageError> {
        let rows_affected = self.conn.lock().execute(
            "DELETE FROM section_status WHERE scope = ?1 AND entity_id = ?2",
            params![scope.as_str(), entity_id],
        )?;
        Ok(rows_affected)
    }

    /// Counts all stored statuses.
    pub fn count_section_statuses(&self) -> Result<usize, StorageError> {
        let count: i64 =
            self.conn
                .lock()
                .query_row("SELECT COUNT(*) FROM section_status", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

impl StatusStore for Storage {
    fn get(&self, key: &SectionKey) -> Result<Option<SectionStatus>, StorageError> {
        self.get_section_status(key)
    }

    fn upsert(&self, key: &SectionKey, patch: &StatusPatch) -> Result<SectionStatus, StorageError> {
        self.upsert_section_status(key, patch)
    }

    fn list(
        &self,
        scope: SectionScope,
        entity_id: EntityId,
    ) -> Result<Vec<SectionStatus>, StorageError> {
        self.list_section_statuses(scope, entity_id)
    }
}

fn query_status(conn: &Connection, key: &SectionKey) -> Result<Option<SectionStatus>, StorageError> {
    let status = conn
        .query_row(
            &format!("{SELECT_COLUMNS} WHERE entity_id = ?1 AND scope = ?2 AND section = ?3"),
            params![
                key.entity_id,
                key.section.scope().as_str(),
                key.section.name()
            ],
            row_to_status,
        )
        .optional()?;
    Ok(status)
}

/// Converts database row to SectionStatus.
fn row_to_status(row: &rusqlite::Row<'_>) -> rusqlite::Result<SectionStatus> {
    let scope: String = row.get(1)?;
    let scope: SectionScope = scope
        .parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;
    let section: String = row.get(2)?;

    Ok(SectionStatus {
        key: SectionKey::new(row.get(0)?, SectionId::new(scope, section)),
        started_at: row.get::<_, Option<i64>>(3)?.map(from_unix_millis),
        completed_at: row.get::<_, Option<i64>>(4)?.map(from_unix_millis),
        content_hash: row.get(5)?,
        error_message: row.get(6)?,
        updated_at: from_unix_millis(row.get(7)?),
    })
}
