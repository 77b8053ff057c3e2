// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Status Cache
//!
//! Keeps the latest status of every section in memory so that UI refresh
//! tickers can poll update progress without hitting the database. The cache
//! is filled once from a [`StatusStore`] and then follows the updater through
//! [`UpdateEvent::StatusRecorded`] events.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::RwLock;
use tracing::debug;

use crate::events::{EventHandler, UpdateEvent};
use crate::policy::StalenessPolicy;
use crate::section::{catalog, EntityId, SectionKey, SectionScope};
use crate::status::{SectionStatus, StatusStore};
use crate::storage::StorageError;

/// Entities whose sections are tracked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub characters: Vec<EntityId>,
    pub corporations: Vec<EntityId>,
}

impl Roster {
    /// Creates an empty roster. General sections are always tracked.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_character(mut self, id: EntityId) -> Self {
        self.characters.push(id);
        self
    }

    pub fn with_corporation(mut self, id: EntityId) -> Self {
        self.corporations.push(id);
        self
    }

    /// Every `(scope, entity)` pair covered by this roster.
    pub fn entities(&self) -> impl Iterator<Item = (SectionScope, EntityId)> + '_ {
        self.characters
            .iter()
            .map(|id| (SectionScope::Character, *id))
            .chain(
                self.corporations
                    .iter()
                    .map(|id| (SectionScope::Corporation, *id)),
            )
            .chain(std::iter::once((SectionScope::General, 0)))
    }
}

/// A section together with its cached status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionView {
    pub key: SectionKey,
    pub display_name: String,
    pub timeout: Duration,
    /// `None` if the section never ran.
    pub status: Option<SectionStatus>,
}

impl SectionView {
    pub fn has_error(&self) -> bool {
        self.status.as_ref().is_some_and(SectionStatus::has_error)
    }

    pub fn is_running(&self) -> bool {
        self.status.as_ref().is_some_and(SectionStatus::is_running)
    }

    /// Whether the section never completed.
    pub fn is_missing(&self) -> bool {
        !self.status.as_ref().is_some_and(SectionStatus::has_content)
    }

    /// Whether the last refresh succeeded and has not yet expired at `now`.
    pub fn is_current(&self, now: SystemTime) -> bool {
        match &self.status {
            Some(status) if !status.has_error() => status
                .completed_at
                .and_then(|at| at.checked_add(self.timeout))
                .is_some_and(|expires_at| now <= expires_at),
            _ => false,
        }
    }
}

/// Aggregated update state over many sections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSummary {
    /// Sections that are fresh and without error.
    pub current: usize,
    /// Sections whose last attempt failed.
    pub errors: usize,
    /// Sections that never completed and have no error.
    pub missing: usize,
    /// Number of sections summarized.
    pub total: usize,
    /// Whether any section is being refreshed.
    pub is_running: bool,
}

impl StatusSummary {
    /// Adds the content of another summary.
    pub fn add(&mut self, other: StatusSummary) {
        self.current += other.current;
        self.errors += other.errors;
        self.missing += other.missing;
        self.total += other.total;
        self.is_running |= other.is_running;
    }

    /// Share of current sections in percent, 0 if there are none.
    pub fn percent_current(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.current * 100 / self.total) as u8
    }

    /// Whether all sections are current.
    pub fn is_ok(&self) -> bool {
        self.current == self.total
    }
}

/// In-memory cache of section statuses.
pub struct StatusCache {
    policy: Arc<StalenessPolicy>,
    statuses: RwLock<HashMap<SectionKey, SectionStatus>>,
}

impl StatusCache {
    /// Creates an empty cache. Timeouts of views come from `policy`.
    pub fn new(policy: Arc<StalenessPolicy>) -> Self {
        Self {
            policy,
            statuses: RwLock::new(HashMap::new()),
        }
    }

    /// Replaces the content of the cache with the statuses of `roster`.
    pub fn init_from_store(
        &self,
        store: &dyn StatusStore,
        roster: &Roster,
    ) -> Result<(), StorageError> {
        let mut loaded = HashMap::new();
        for (scope, entity_id) in roster.entities() {
            for status in store.list(scope, entity_id)? {
                loaded.insert(status.key.clone(), status);
            }
        }
        debug!(count = loaded.len(), "status cache initialized");
        *self.statuses.write() = loaded;
        Ok(())
    }

    /// Returns the cached status of a section.
    pub fn get(&self, key: &SectionKey) -> Option<SectionStatus> {
        self.statuses.read().get(key).cloned()
    }

    /// Stores a status, replacing any previous one for the same key.
    pub fn set(&self, status: SectionStatus) {
        self.statuses.write().insert(status.key.clone(), status);
    }

    /// Removes all cached statuses of an entity.
    pub fn remove_entity(&self, scope: SectionScope, entity_id: EntityId) {
        self.statuses
            .write()
            .retain(|key, _| !(key.section.scope() == scope && key.entity_id == entity_id));
    }

    /// Number of cached statuses.
    pub fn len(&self) -> usize {
        self.statuses.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.read().is_empty()
    }

    /// Whether a section completed at least once.
    pub fn has_section(&self, key: &SectionKey) -> bool {
        self.statuses
            .read()
            .get(key)
            .is_some_and(SectionStatus::has_content)
    }

    /// Returns a section with its display name, timeout and cached status.
    pub fn section_view(&self, key: &SectionKey) -> SectionView {
        SectionView {
            key: key.clone(),
            display_name: key.section.display_name(),
            timeout: self.policy.timeout(&key.section),
            status: self.get(key),
        }
    }

    /// Lists the known sections of an entity in catalog order.
    pub fn list_sections(&self, scope: SectionScope, entity_id: EntityId) -> Vec<SectionView> {
        catalog::sections_for(scope)
            .iter()
            .map(|section| self.section_view(&SectionKey::new(entity_id, section.clone())))
            .collect()
    }

    /// Summarizes the known sections of one entity.
    pub fn entity_summary(
        &self,
        scope: SectionScope,
        entity_id: EntityId,
        now: SystemTime,
    ) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for view in self.list_sections(scope, entity_id) {
            summary.total += 1;
            if view.has_error() {
                summary.errors += 1;
            } else if view.is_current(now) {
                summary.current += 1;
            } else if view.is_missing() {
                summary.missing += 1;
            }
            summary.is_running |= view.is_running();
        }
        summary
    }

    /// Summarizes all sections of `roster` plus the general sections.
    pub fn summary(&self, roster: &Roster, now: SystemTime) -> StatusSummary {
        let mut summary = StatusSummary::default();
        for (scope, entity_id) in roster.entities() {
            summary.add(self.entity_summary(scope, entity_id, now));
        }
        summary
    }
}

impl EventHandler for StatusCache {
    fn on_event(&self, event: UpdateEvent) {
        if let UpdateEvent::StatusRecorded { status } = event {
            self.set(status);
        }
    }
}
