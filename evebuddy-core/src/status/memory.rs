// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! In-memory status store.

use std::collections::HashMap;

use parking_lot::RwLock;

use super::{SectionStatus, StatusPatch, StatusStore};
use crate::section::{EntityId, SectionKey, SectionScope};
use crate::storage::StorageError;

/// Status store kept in process memory.
///
/// Useful for tests and for callers that do not need statuses to survive a
/// restart.
#[derive(Debug, Default)]
pub struct MemoryStatusStore {
    statuses: RwLock<HashMap<SectionKey, SectionStatus>>,
}

impl MemoryStatusStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded statuses.
    pub fn len(&self) -> usize {
        self.statuses.read().len()
    }

    /// Whether no status was recorded yet.
    pub fn is_empty(&self) -> bool {
        self.statuses.read().is_empty()
    }

    /// Replaces a status wholesale.
    pub fn insert(&self, status: SectionStatus) {
        self.statuses.write().insert(status.key.clone(), status);
    }
}

impl StatusStore for MemoryStatusStore {
    fn get(&self, key: &SectionKey) -> Result<Option<SectionStatus>, StorageError> {
        Ok(self.statuses.read().get(key).cloned())
    }

    fn upsert(&self, key: &SectionKey, patch: &StatusPatch) -> Result<SectionStatus, StorageError> {
        let mut statuses = self.statuses.write();
        let status = statuses
            .entry(key.clone())
            .or_insert_with(|| SectionStatus::new(key.clone(), patch.updated_at));
        status.apply(patch);
        Ok(status.clone())
    }

    fn list(
        &self,
        scope: SectionScope,
        entity_id: EntityId,
    ) -> Result<Vec<SectionStatus>, StorageError> {
        let mut list: Vec<SectionStatus> = self
            .statuses
            .read()
            .values()
            .filter(|s| s.key.section.scope() == scope && s.key.entity_id == entity_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.key.section.name().cmp(b.key.section.name()));
        Ok(list)
    }
}
