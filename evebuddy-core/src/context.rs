// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Cooperative cancellation for section updates.
//!
//! An [`UpdateContext`] is handed to fetch and apply callbacks. Long running
//! callbacks are expected to call [`UpdateContext::check`] between I/O steps
//! and return early once the context has been cancelled or its deadline has
//! passed.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Cancellation handle and optional deadline for one update call.
///
/// Clones share the same cancellation flag.
#[derive(Debug, Clone, Default)]
pub struct UpdateContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl UpdateContext {
    /// Creates a context without deadline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context that expires after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::new().deadline(Instant::now() + timeout)
    }

    /// Sets the deadline of this context.
    pub fn deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Returns the deadline, if any.
    pub fn deadline_at(&self) -> Option<Instant> {
        self.deadline
    }

    /// Cancels this context and all its clones.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether the context was cancelled or its deadline has passed.
    pub fn is_cancelled(&self) -> bool {
        self.reason().is_some()
    }

    /// Returns `Err` once the context is no longer live.
    pub fn check(&self) -> Result<(), Cancelled> {
        match self.reason() {
            Some(reason) => Err(Cancelled { reason }),
            None => Ok(()),
        }
    }

    fn reason(&self) -> Option<CancelReason> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Some(CancelReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(CancelReason::DeadlineExceeded),
            _ => None,
        }
    }
}

/// Why a context stopped being live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// [`UpdateContext::cancel`] was called.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Cancelled => f.write_str("cancelled"),
            CancelReason::DeadlineExceeded => f.write_str("deadline exceeded"),
        }
    }
}

/// Error returned by [`UpdateContext::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("context {reason}")]
pub struct Cancelled {
    /// Why the context is no longer live.
    pub reason: CancelReason,
}
