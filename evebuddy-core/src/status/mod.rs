// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Section Status
//!
//! The persisted record of the last update attempt per [`SectionKey`], and the
//! store interface the updater reads and writes it through.
//!
//! A status cycles through `Idle -> Running -> {Succeeded, Failed}` and back
//! to `Running` whenever a refresh starts. It is never deleted by the updater.

mod memory;

pub use memory::MemoryStatusStore;

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::section::{EntityId, SectionKey, SectionScope};
use crate::storage::StorageError;

/// Update status of one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionStatus {
    /// The section this status belongs to.
    pub key: SectionKey,
    /// Set while a refresh is in progress.
    pub started_at: Option<SystemTime>,
    /// Last successful completion, `None` if never completed.
    pub completed_at: Option<SystemTime>,
    /// Fingerprint of the last applied payload, empty if none.
    pub content_hash: String,
    /// Error of the most recent attempt, empty if it succeeded.
    pub error_message: String,
    /// Last time this record was written.
    pub updated_at: SystemTime,
}

/// Lifecycle phase derived from a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectionPhase {
    /// Never ran.
    Idle,
    /// A refresh is in progress.
    Running,
    /// The most recent refresh succeeded.
    Succeeded,
    /// The most recent refresh failed.
    Failed,
}

impl SectionStatus {
    /// Creates an idle status.
    pub fn new(key: SectionKey, now: SystemTime) -> Self {
        Self {
            key,
            started_at: None,
            completed_at: None,
            content_hash: String::new(),
            error_message: String::new(),
            updated_at: now,
        }
    }

    /// Whether the most recent attempt failed.
    pub fn has_error(&self) -> bool {
        !self.error_message.is_empty()
    }

    /// Whether a refresh is currently in progress.
    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }

    /// Whether the section has completed successfully at least once.
    pub fn has_content(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Returns the lifecycle phase.
    pub fn phase(&self) -> SectionPhase {
        if self.is_running() {
            SectionPhase::Running
        } else if self.has_error() {
            SectionPhase::Failed
        } else if self.has_content() {
            SectionPhase::Succeeded
        } else {
            SectionPhase::Idle
        }
    }

    /// Merges the set fields of a patch into this status.
    pub fn apply(&mut self, patch: &StatusPatch) {
        if let Some(started_at) = patch.started_at {
            self.started_at = started_at;
        }
        if let Some(completed_at) = patch.completed_at {
            self.completed_at = completed_at;
        }
        if let Some(hash) = &patch.content_hash {
            self.content_hash.clone_from(hash);
        }
        if let Some(message) = &patch.error_message {
            self.error_message.clone_from(message);
        }
        self.updated_at = patch.updated_at;
    }
}

/// Partial update of a [`SectionStatus`].
///
/// Fields left as `None` keep their stored value. For the nullable
/// timestamps, `Some(None)` clears the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusPatch {
    pub started_at: Option<Option<SystemTime>>,
    pub completed_at: Option<Option<SystemTime>>,
    pub content_hash: Option<String>,
    pub error_message: Option<String>,
    pub updated_at: SystemTime,
}

impl StatusPatch {
    /// Creates an empty patch written at `now`.
    pub fn new(now: SystemTime) -> Self {
        Self {
            started_at: None,
            completed_at: None,
            content_hash: None,
            error_message: None,
            updated_at: now,
        }
    }

    /// Marks a refresh as started. Prior completion and hash are kept.
    pub fn running(now: SystemTime) -> Self {
        Self::new(now).started_at(Some(now))
    }

    /// Records a successful refresh.
    pub fn succeeded(now: SystemTime, content_hash: impl Into<String>) -> Self {
        Self::new(now)
            .started_at(None)
            .completed_at(Some(now))
            .content_hash(content_hash)
            .error_message("")
    }

    /// Records a failed refresh. Completion and hash are kept.
    pub fn failed(now: SystemTime, error_message: impl Into<String>) -> Self {
        Self::new(now).started_at(None).error_message(error_message)
    }

    pub fn started_at(mut self, at: Option<SystemTime>) -> Self {
        self.started_at = Some(at);
        self
    }

    pub fn completed_at(mut self, at: Option<SystemTime>) -> Self {
        self.completed_at = Some(at);
        self
    }

    pub fn content_hash(mut self, hash: impl Into<String>) -> Self {
        self.content_hash = Some(hash.into());
        self
    }

    pub fn error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}

/// Persistence of section statuses.
///
/// Implementations must apply each `upsert` atomically per key.
pub trait StatusStore: Send + Sync {
    /// Returns the status of a section, if it was ever recorded.
    fn get(&self, key: &SectionKey) -> Result<Option<SectionStatus>, StorageError>;

    /// Merges `patch` into the stored status, creating it if missing,
    /// and returns the result.
    fn upsert(&self, key: &SectionKey, patch: &StatusPatch) -> Result<SectionStatus, StorageError>;

    /// Lists all recorded statuses of one entity within a scope.
    fn list(
        &self,
        scope: SectionScope,
        entity_id: EntityId,
    ) -> Result<Vec<SectionStatus>, StorageError>;
}
