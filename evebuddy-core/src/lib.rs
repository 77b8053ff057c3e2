// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! EVE Buddy Core Library
//!
//! Keeps a local mirror of EVE Online ESI data fresh, one section at a time.
//! Sections are refreshed only when stale, fetched once under concurrent
//! callers, and written only when their content fingerprint changed.

pub mod clock;
pub mod config;
pub mod context;
pub mod events;
pub mod fingerprint;
pub mod policy;
pub mod section;
pub mod singleflight;
pub mod status;
pub mod status_cache;
pub mod storage;
pub mod updater;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, UpdaterConfig};
pub use context::{CancelReason, Cancelled, UpdateContext};
pub use events::{CallbackHandler, EventDispatcher, EventHandler, UpdateEvent};
pub use fingerprint::{fingerprint, FingerprintError};
pub use policy::{PolicyOverrides, StalenessPolicy, StalenessPolicyBuilder, UnknownSectionError};
pub use section::{
    EntityId, InvalidKeyError, ParseSectionError, SectionId, SectionKey, SectionScope,
};
pub use singleflight::SingleFlight;
pub use status::{MemoryStatusStore, SectionPhase, SectionStatus, StatusPatch, StatusStore};
pub use status_cache::{Roster, SectionView, StatusCache, StatusSummary};
pub use storage::{Storage, StorageError};
pub use updater::{
    BoxError, SectionHandler, SectionUpdater, SectionUpdaterBuilder, UpdateError, UpdateRequest,
    UpdateResult,
};
