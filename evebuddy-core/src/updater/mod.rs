// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Section Updater
//!
//! Refreshes sections of remote data on demand. For each request the updater
//! decides whether the section is due, fetches it at most once across
//! concurrent callers, and writes it through the caller's apply callback only
//! when its content fingerprint changed.
//!
//! # Example
//!
//! ```
//! use evebuddy_core::section::catalog::character;
//! use evebuddy_core::{SectionUpdater, UpdateContext, UpdateRequest};
//!
//! let updater = SectionUpdater::builder().build();
//! let ctx = UpdateContext::new();
//! let req = UpdateRequest::new(42, character::SKILLQUEUE);
//!
//! let changed = updater
//!     .update_section_if_needed(
//!         &ctx,
//!         &req,
//!         |_ctx, _id| Ok::<_, std::io::Error>(vec![1, 2, 3]),
//!         |_ctx, _id, _queue: Vec<u32>| Ok::<_, std::io::Error>(()),
//!     )
//!     .unwrap();
//! assert!(changed);
//!
//! // Fresh sections are skipped without calling fetch.
//! let changed = updater
//!     .update_section_if_needed(
//!         &ctx,
//!         &req,
//!         |_ctx, _id| -> Result<Vec<u32>, std::io::Error> { unreachable!() },
//!         |_ctx, _id, _queue| Ok::<_, std::io::Error>(()),
//!     )
//!     .unwrap();
//! assert!(!changed);
//! ```

mod error;

pub use error::{BoxError, SharedError, UpdateError, UpdateResult};

use std::collections::HashMap;
use std::fs;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigError, UpdaterConfig};
use crate::context::UpdateContext;
use crate::events::{EventDispatcher, EventHandler, UpdateEvent};
use crate::fingerprint::fingerprint;
use crate::policy::StalenessPolicy;
use crate::section::{EntityId, SectionId, SectionKey, SectionScope};
use crate::singleflight::SingleFlight;
use crate::status::{MemoryStatusStore, SectionStatus, StatusPatch, StatusStore};
use crate::storage::{Storage, StorageError};

/// A request to refresh one section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    pub entity_id: EntityId,
    pub section: SectionId,
    /// Refresh even when the section is current, and apply even when unchanged.
    pub force_update: bool,
}

impl UpdateRequest {
    /// Creates a request for an entity-owned section.
    pub fn new(entity_id: EntityId, section: SectionId) -> Self {
        Self {
            entity_id,
            section,
            force_update: false,
        }
    }

    /// Creates a request for a general section.
    pub fn general(section: SectionId) -> Self {
        Self::new(0, section)
    }

    /// Marks the request as forced.
    pub fn forced(mut self) -> Self {
        self.force_update = true;
        self
    }

    /// The section this request refers to.
    pub fn key(&self) -> SectionKey {
        SectionKey::new(self.entity_id, self.section.clone())
    }
}

/// Fetches and stores the data of one or more sections.
///
/// A handler serving several sections (e.g. the seven wallet divisions of a
/// corporation) receives the requested section with every call.
pub trait SectionHandler: Send + Sync {
    /// Data produced by `fetch` and consumed by `apply`.
    type Payload: Serialize;

    /// Sections this handler serves.
    fn sections(&self) -> &[SectionId];

    /// Retrieves the current data of a section from the remote API.
    fn fetch(
        &self,
        ctx: &UpdateContext,
        section: &SectionId,
        entity_id: EntityId,
    ) -> Result<Self::Payload, BoxError>;

    /// Writes fetched data to local storage.
    fn apply(
        &self,
        ctx: &UpdateContext,
        section: &SectionId,
        entity_id: EntityId,
        payload: Self::Payload,
    ) -> Result<(), BoxError>;
}

/// Handler with its payload type erased, for routing by section.
trait RegisteredHandler: Send + Sync {
    fn update(
        &self,
        updater: &SectionUpdater,
        ctx: &UpdateContext,
        req: &UpdateRequest,
    ) -> UpdateResult<bool>;
}

impl<H: SectionHandler> RegisteredHandler for H {
    fn update(
        &self,
        updater: &SectionUpdater,
        ctx: &UpdateContext,
        req: &UpdateRequest,
    ) -> UpdateResult<bool> {
        updater.update_section_with(ctx, req, self)
    }
}

/// Orchestrates section refreshes.
///
/// Safe to share between threads behind an `Arc`.
pub struct SectionUpdater {
    store: Arc<dyn StatusStore>,
    policy: Arc<StalenessPolicy>,
    clock: Arc<dyn Clock>,
    events: EventDispatcher,
    handlers: HashMap<SectionId, Arc<dyn RegisteredHandler>>,
    flights: SingleFlight<UpdateResult<bool>>,
}

impl SectionUpdater {
    /// Creates a builder with an in-memory store and the default policy.
    pub fn builder() -> SectionUpdaterBuilder {
        SectionUpdaterBuilder::new()
    }

    /// Creates an updater backed by the SQLite database described by `config`.
    pub fn from_config(config: &UpdaterConfig) -> Result<Self, ConfigError> {
        Ok(SectionUpdaterBuilder::from_config(config)?.build())
    }

    /// Returns the staleness policy.
    pub fn policy(&self) -> &Arc<StalenessPolicy> {
        &self.policy
    }

    /// Returns the status store.
    pub fn store(&self) -> &Arc<dyn StatusStore> {
        &self.store
    }

    /// Refreshes a section when it is due, using the given callbacks.
    ///
    /// Returns whether the fetched data differed from the last applied data.
    /// Returns `Ok(false)` without calling `fetch` when the request is not
    /// forced and the section completed recently without error.
    ///
    /// Concurrent calls for the same section share one execution and all
    /// receive its result. Only the callbacks of the first caller run.
    pub fn update_section_if_needed<T, F, A, FE, AE>(
        &self,
        ctx: &UpdateContext,
        req: &UpdateRequest,
        fetch: F,
        apply: A,
    ) -> UpdateResult<bool>
    where
        T: Serialize,
        F: FnOnce(&UpdateContext, EntityId) -> Result<T, FE>,
        A: FnOnce(&UpdateContext, EntityId, T) -> Result<(), AE>,
        FE: Into<BoxError>,
        AE: Into<BoxError>,
    {
        let key = req.key();
        key.validate()?;

        if !req.force_update && self.is_current(&key)? {
            debug!(
                entity_id = key.entity_id,
                section = %key.section,
                "section is current, skipping update"
            );
            return Ok(false);
        }

        let (outcome, shared) = self.flights.execute(&key.dedup_key(), || {
            self.run(ctx, &key, req.force_update, fetch, apply)
        });
        if shared {
            debug!(
                entity_id = key.entity_id,
                section = %key.section,
                shared,
                "joined in-flight update"
            );
        }
        outcome
    }

    /// Refreshes a section through a handler.
    ///
    /// # Panics
    ///
    /// Panics if the handler does not serve the requested section.
    pub fn update_section_with<H: SectionHandler>(
        &self,
        ctx: &UpdateContext,
        req: &UpdateRequest,
        handler: &H,
    ) -> UpdateResult<bool> {
        assert!(
            handler.sections().contains(&req.section),
            "handler does not serve section {}",
            req.section
        );
        let section = &req.section;
        self.update_section_if_needed(
            ctx,
            req,
            |ctx, entity_id| handler.fetch(ctx, section, entity_id),
            |ctx, entity_id, payload| handler.apply(ctx, section, entity_id, payload),
        )
    }

    /// Refreshes a section through the handler registered for it.
    pub fn update_registered_section(
        &self,
        ctx: &UpdateContext,
        req: &UpdateRequest,
    ) -> UpdateResult<bool> {
        let handler = self
            .handlers
            .get(&req.section)
            .ok_or_else(|| UpdateError::NoHandler(req.section.clone()))?;
        handler.update(self, ctx, req)
    }

    /// Whether a handler is registered for a section.
    pub fn has_handler(&self, section: &SectionId) -> bool {
        self.handlers.contains_key(section)
    }

    /// Returns the stored status of a section.
    pub fn section_status(&self, key: &SectionKey) -> Result<Option<SectionStatus>, StorageError> {
        self.store.get(key)
    }

    /// Whether a section completed successfully at least once.
    pub fn has_section(&self, key: &SectionKey) -> Result<bool, StorageError> {
        Ok(self
            .store
            .get(key)?
            .is_some_and(|status| status.has_content()))
    }

    /// Lists the stored statuses of an entity.
    pub fn list_statuses(
        &self,
        scope: SectionScope,
        entity_id: EntityId,
    ) -> Result<Vec<SectionStatus>, StorageError> {
        self.store.list(scope, entity_id)
    }

    /// Whether an update of this section is executing right now.
    pub fn is_updating(&self, key: &SectionKey) -> bool {
        self.flights.is_in_flight(&key.dedup_key())
    }

    fn is_current(&self, key: &SectionKey) -> UpdateResult<bool> {
        let status = self
            .store
            .get(key)
            .map_err(|e| UpdateError::storage(key, e))?;
        Ok(status.is_some_and(|status| {
            !status.has_error() && !self.policy.is_expired(&status, self.clock.now())
        }))
    }

    fn run<T, F, A, FE, AE>(
        &self,
        ctx: &UpdateContext,
        key: &SectionKey,
        forced: bool,
        fetch: F,
        apply: A,
    ) -> UpdateResult<bool>
    where
        T: Serialize,
        F: FnOnce(&UpdateContext, EntityId) -> Result<T, FE>,
        A: FnOnce(&UpdateContext, EntityId, T) -> Result<(), AE>,
        FE: Into<BoxError>,
        AE: Into<BoxError>,
    {
        self.events.dispatch(UpdateEvent::Started {
            key: key.clone(),
            forced,
        });

        let outcome = self.refresh(ctx, key, forced, fetch, apply);
        match &outcome {
            Ok(changed) => {
                info!(
                    entity_id = key.entity_id,
                    section = %key.section,
                    forced,
                    changed,
                    "section updated"
                );
                self.events.dispatch(UpdateEvent::Completed {
                    key: key.clone(),
                    changed: *changed,
                });
            }
            Err(err) => {
                warn!(
                    entity_id = key.entity_id,
                    section = %key.section,
                    forced,
                    error = %err,
                    "section update failed"
                );
                self.record_failure(key, err);
                self.events.dispatch(UpdateEvent::Failed {
                    key: key.clone(),
                    error: err.status_message(),
                });
            }
        }
        outcome
    }

    fn refresh<T, F, A, FE, AE>(
        &self,
        ctx: &UpdateContext,
        key: &SectionKey,
        forced: bool,
        fetch: F,
        apply: A,
    ) -> UpdateResult<bool>
    where
        T: Serialize,
        F: FnOnce(&UpdateContext, EntityId) -> Result<T, FE>,
        A: FnOnce(&UpdateContext, EntityId, T) -> Result<(), AE>,
        FE: Into<BoxError>,
        AE: Into<BoxError>,
    {
        let running = self.record(key, &StatusPatch::running(self.clock.now()))?;
        let previous_hash = running.content_hash;

        ctx.check().map_err(|e| UpdateError::cancelled(key, e))?;
        let payload = fetch(ctx, key.entity_id)
            .map_err(|e| callback_error(ctx, key, e.into(), UpdateError::fetch))?;

        let hash = fingerprint(&payload).map_err(|e| UpdateError::encoding(key, e))?;
        let changed = previous_hash.is_empty() || hash != previous_hash;

        if forced || changed || self.policy.skips_change_detection(&key.section) {
            ctx.check().map_err(|e| UpdateError::cancelled(key, e))?;
            apply(ctx, key.entity_id, payload)
                .map_err(|e| callback_error(ctx, key, e.into(), UpdateError::apply))?;
        } else {
            debug!(
                entity_id = key.entity_id,
                section = %key.section,
                "content unchanged, skipping apply"
            );
        }

        self.record(key, &StatusPatch::succeeded(self.clock.now(), hash))?;
        Ok(changed)
    }

    fn record(&self, key: &SectionKey, patch: &StatusPatch) -> UpdateResult<SectionStatus> {
        let status = self
            .store
            .upsert(key, patch)
            .map_err(|e| UpdateError::storage(key, e))?;
        self.events.dispatch(UpdateEvent::StatusRecorded {
            status: status.clone(),
        });
        Ok(status)
    }

    // Best effort: the original error is what the caller sees.
    fn record_failure(&self, key: &SectionKey, err: &UpdateError) {
        let patch = StatusPatch::failed(self.clock.now(), err.status_message());
        if let Err(e) = self.record(key, &patch) {
            error!(
                entity_id = key.entity_id,
                section = %key.section,
                error = %e,
                "failed to record section error"
            );
        }
    }
}

/// Classifies a callback failure, preferring cancellation when the context
/// is no longer live.
fn callback_error(
    ctx: &UpdateContext,
    key: &SectionKey,
    source: BoxError,
    wrap: fn(&SectionKey, BoxError) -> UpdateError,
) -> UpdateError {
    match ctx.check() {
        Err(cancelled) => UpdateError::cancelled(key, cancelled),
        Ok(()) => wrap(key, source),
    }
}

/// Builder for [`SectionUpdater`].
pub struct SectionUpdaterBuilder {
    store: Option<Arc<dyn StatusStore>>,
    policy: StalenessPolicy,
    clock: Arc<dyn Clock>,
    events: EventDispatcher,
    handlers: HashMap<SectionId, Arc<dyn RegisteredHandler>>,
}

impl SectionUpdaterBuilder {
    /// Creates a new builder with default configuration.
    pub fn new() -> Self {
        SectionUpdaterBuilder {
            store: None,
            policy: StalenessPolicy::default(),
            clock: Arc::new(SystemClock),
            events: EventDispatcher::new(),
            handlers: HashMap::new(),
        }
    }

    /// Creates a builder with the SQLite store and policy of `config`.
    ///
    /// The storage directory is created if missing.
    pub fn from_config(config: &UpdaterConfig) -> Result<Self, ConfigError> {
        let policy = config.staleness_policy()?;
        fs::create_dir_all(&config.storage_path)?;
        let storage = Storage::open(config.database_path())?;
        Ok(Self::new().store(Arc::new(storage)).policy(policy))
    }

    /// Sets the status store.
    pub fn store(mut self, store: Arc<dyn StatusStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the staleness policy.
    pub fn policy(mut self, policy: StalenessPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Adds an event handler.
    pub fn event_handler(mut self, handler: Arc<dyn EventHandler>) -> Self {
        self.events.add_handler(handler);
        self
    }

    /// Registers a handler for all sections it serves.
    ///
    /// A section registered twice is served by the last handler.
    pub fn handler<H: SectionHandler + 'static>(mut self, handler: H) -> Self {
        let sections = handler.sections().to_vec();
        let handler: Arc<dyn RegisteredHandler> = Arc::new(handler);
        for section in sections {
            if self
                .handlers
                .insert(section.clone(), Arc::clone(&handler))
                .is_some()
            {
                warn!(section = %section, "replacing handler for section");
            }
        }
        self
    }

    /// Builds the updater. Without a store, statuses are kept in memory.
    pub fn build(self) -> SectionUpdater {
        SectionUpdater {
            store: self
                .store
                .unwrap_or_else(|| Arc::new(MemoryStatusStore::new())),
            policy: Arc::new(self.policy),
            clock: self.clock,
            events: self.events,
            handlers: self.handlers,
            flights: SingleFlight::new(),
        }
    }
}

impl Default for SectionUpdaterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
