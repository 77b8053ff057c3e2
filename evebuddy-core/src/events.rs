// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Event System
//!
//! Callbacks for section update events.

use std::sync::Arc;

use crate::section::SectionKey;
use crate::status::SectionStatus;

/// Events emitted by the section updater.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateEvent {
    /// A refresh started executing. Not emitted for skipped or shared calls.
    Started {
        /// The section being refreshed.
        key: SectionKey,
        /// Whether the refresh was forced.
        forced: bool,
    },

    /// A status was written to the store.
    StatusRecorded {
        /// The status as stored.
        status: SectionStatus,
    },

    /// A refresh finished successfully.
    Completed {
        /// The refreshed section.
        key: SectionKey,
        /// Whether the fetched data differed from the previous refresh.
        changed: bool,
    },

    /// A refresh failed.
    Failed {
        /// The section that failed.
        key: SectionKey,
        /// Error description.
        error: String,
    },
}

impl UpdateEvent {
    /// The section this event is about.
    pub fn key(&self) -> &SectionKey {
        match self {
            UpdateEvent::Started { key, .. }
            | UpdateEvent::Completed { key, .. }
            | UpdateEvent::Failed { key, .. } => key,
            UpdateEvent::StatusRecorded { status } => &status.key,
        }
    }
}

/// Event handler trait.
///
/// Handlers are called synchronously on the updating thread and should
/// return quickly.
pub trait EventHandler: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: UpdateEvent);
}

/// Simple callback-based event handler.
pub struct CallbackHandler<F>
where
    F: Fn(UpdateEvent) + Send + Sync,
{
    callback: F,
}

impl<F> CallbackHandler<F>
where
    F: Fn(UpdateEvent) + Send + Sync,
{
    /// Creates a new callback handler.
    pub fn new(callback: F) -> Self {
        CallbackHandler { callback }
    }
}

impl<F> EventHandler for CallbackHandler<F>
where
    F: Fn(UpdateEvent) + Send + Sync,
{
    fn on_event(&self, event: UpdateEvent) {
        (self.callback)(event);
    }
}

/// Event dispatcher for managing multiple handlers.
#[derive(Default)]
pub struct EventDispatcher {
    handlers: Vec<Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    /// Creates a new event dispatcher.
    pub fn new() -> Self {
        EventDispatcher {
            handlers: Vec::new(),
        }
    }

    /// Adds an event handler.
    pub fn add_handler(&mut self, handler: Arc<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Returns the number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    /// Dispatches an event to all handlers.
    pub fn dispatch(&self, event: UpdateEvent) {
        for handler in &self.handlers {
            handler.on_event(event.clone());
        }
    }
}
