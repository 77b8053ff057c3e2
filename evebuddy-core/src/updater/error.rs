// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Update Error Types

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

use crate::context::Cancelled;
use crate::fingerprint::FingerprintError;
use crate::section::{InvalidKeyError, SectionId, SectionKey};
use crate::storage::StorageError;

/// Error type returned by fetch and apply callbacks.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Callback error shared between every caller of one update.
pub type SharedError = Arc<dyn StdError + Send + Sync>;

/// Failure of a section update.
///
/// Cloneable so that concurrent callers of the same update all receive the
/// same error. The section is part of every runtime failure.
#[derive(Debug, Clone, Error)]
pub enum UpdateError {
    /// The request names an entity that does not fit the section's scope.
    #[error("invalid update request: {0}")]
    InvalidRequest(#[from] InvalidKeyError),

    /// The fetch callback failed.
    #[error("{key}: fetch failed: {source}")]
    Fetch { key: SectionKey, source: SharedError },

    /// The fetched payload could not be fingerprinted.
    #[error("{key}: {source}")]
    Encoding {
        key: SectionKey,
        source: Arc<FingerprintError>,
    },

    /// The apply callback failed.
    #[error("{key}: apply failed: {source}")]
    Apply { key: SectionKey, source: SharedError },

    /// The context was cancelled or its deadline passed.
    #[error("{key}: {source}")]
    Cancelled { key: SectionKey, source: Cancelled },

    /// Reading or writing the section status failed.
    #[error("{key}: status storage failed: {source}")]
    Storage {
        key: SectionKey,
        source: Arc<StorageError>,
    },

    /// No handler is registered for the section.
    #[error("no handler registered for section {0}")]
    NoHandler(SectionId),
}

impl UpdateError {
    pub(crate) fn fetch(key: &SectionKey, source: BoxError) -> Self {
        UpdateError::Fetch {
            key: key.clone(),
            source: Arc::from(source),
        }
    }

    pub(crate) fn apply(key: &SectionKey, source: BoxError) -> Self {
        UpdateError::Apply {
            key: key.clone(),
            source: Arc::from(source),
        }
    }

    pub(crate) fn encoding(key: &SectionKey, source: FingerprintError) -> Self {
        UpdateError::Encoding {
            key: key.clone(),
            source: Arc::new(source),
        }
    }

    pub(crate) fn cancelled(key: &SectionKey, source: Cancelled) -> Self {
        UpdateError::Cancelled {
            key: key.clone(),
            source,
        }
    }

    pub(crate) fn storage(key: &SectionKey, source: StorageError) -> Self {
        UpdateError::Storage {
            key: key.clone(),
            source: Arc::new(source),
        }
    }

    /// The section that failed, if the request got that far.
    pub fn key(&self) -> Option<&SectionKey> {
        match self {
            UpdateError::Fetch { key, .. }
            | UpdateError::Encoding { key, .. }
            | UpdateError::Apply { key, .. }
            | UpdateError::Cancelled { key, .. }
            | UpdateError::Storage { key, .. } => Some(key),
            UpdateError::InvalidRequest(_) | UpdateError::NoHandler(_) => None,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, UpdateError::Cancelled { .. })
    }

    /// Text recorded as the section's error message.
    pub fn status_message(&self) -> String {
        match self {
            UpdateError::Fetch { source, .. } | UpdateError::Apply { source, .. } => {
                source.to_string()
            }
            UpdateError::Encoding { source, .. } => source.to_string(),
            UpdateError::Cancelled { source, .. } => source.to_string(),
            UpdateError::Storage { source, .. } => source.to_string(),
            other => other.to_string(),
        }
    }
}

/// Result type for section updates.
pub type UpdateResult<T> = Result<T, UpdateError>;
