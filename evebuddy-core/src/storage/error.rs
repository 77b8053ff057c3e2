// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Storage error types.

use thiserror::Error;

/// Errors raised by the status database.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A schema migration could not be applied.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A row could not be turned back into a section status.
    #[error("Invalid section status row: {0}")]
    InvalidData(String),
}
