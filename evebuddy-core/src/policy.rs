// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Staleness Policy
//!
//! Decides whether a section's last successful refresh is still fresh enough
//! to skip fetching it again. The policy is built once and never mutated, so
//! it can be shared freely between threads and swapped per test.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::section::catalog::{character, corporation, general};
use crate::section::{ParseSectionError, SectionId, SectionScope};
use crate::status::SectionStatus;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;

/// Timeout of unknown character and corporation sections.
pub const DEFAULT_ENTITY_TIMEOUT: Duration = Duration::from_secs(HOUR);

/// Timeout of unknown general sections.
pub const DEFAULT_GENERAL_TIMEOUT: Duration = Duration::from_secs(24 * HOUR);

/// A section has no entry in the timeout table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no timeout defined for section {section}")]
pub struct UnknownSectionError {
    pub section: SectionId,
}

/// Immutable per-section timeout table.
#[derive(Debug, Clone)]
pub struct StalenessPolicy {
    timeouts: HashMap<SectionId, Duration>,
    scope_defaults: HashMap<SectionScope, Duration>,
    skip_change_detection: HashSet<SectionId>,
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self::eve_defaults()
    }
}

impl StalenessPolicy {
    /// Creates a builder with an empty table and the built-in scope defaults.
    pub fn builder() -> StalenessPolicyBuilder {
        StalenessPolicyBuilder::new()
    }

    /// The timeouts used by the desktop application.
    pub fn eve_defaults() -> Self {
        StalenessPolicyBuilder::eve_defaults().build()
    }

    /// Returns a builder pre-filled with this policy.
    pub fn to_builder(&self) -> StalenessPolicyBuilder {
        StalenessPolicyBuilder {
            timeouts: self.timeouts.clone(),
            scope_defaults: self.scope_defaults.clone(),
            skip_change_detection: self.skip_change_detection.clone(),
        }
    }

    /// Looks up the configured timeout of a section.
    pub fn lookup(&self, section: &SectionId) -> Result<Duration, UnknownSectionError> {
        self.timeouts
            .get(section)
            .copied()
            .ok_or_else(|| UnknownSectionError {
                section: section.clone(),
            })
    }

    /// Returns the timeout of a section.
    ///
    /// Unknown sections get the default of their scope and a warning is logged.
    pub fn timeout(&self, section: &SectionId) -> Duration {
        match self.lookup(section) {
            Ok(timeout) => timeout,
            Err(e) => {
                let fallback = self.default_timeout(section.scope());
                warn!(
                    section = %section,
                    fallback_secs = fallback.as_secs(),
                    "{e}, using scope default"
                );
                fallback
            }
        }
    }

    /// Timeout applied to unknown sections of a scope.
    pub fn default_timeout(&self, scope: SectionScope) -> Duration {
        self.scope_defaults
            .get(&scope)
            .copied()
            .unwrap_or_else(|| builtin_scope_default(scope))
    }

    /// Whether the last successful refresh recorded in `status` is too old at `now`.
    ///
    /// A status that never completed is always expired. Otherwise the status
    /// expires strictly after `completed_at + timeout`.
    pub fn is_expired(&self, status: &SectionStatus, now: SystemTime) -> bool {
        match self.expires_at(status) {
            None if status.completed_at.is_none() => true,
            None => false,
            Some(expires_at) => now > expires_at,
        }
    }

    /// Instant after which a completed status becomes stale.
    pub fn expires_at(&self, status: &SectionStatus) -> Option<SystemTime> {
        let completed_at = status.completed_at?;
        completed_at.checked_add(self.timeout(&status.key.section))
    }

    /// Whether fetched data of this section is always applied, even when its
    /// fingerprint did not change.
    pub fn skips_change_detection(&self, section: &SectionId) -> bool {
        self.skip_change_detection.contains(section)
    }

    /// Number of sections with an explicit timeout.
    pub fn len(&self) -> usize {
        self.timeouts.len()
    }

    /// Whether no section has an explicit timeout.
    pub fn is_empty(&self) -> bool {
        self.timeouts.is_empty()
    }
}

fn builtin_scope_default(scope: SectionScope) -> Duration {
    match scope {
        SectionScope::Character | SectionScope::Corporation => DEFAULT_ENTITY_TIMEOUT,
        SectionScope::General => DEFAULT_GENERAL_TIMEOUT,
    }
}

/// Builder for [`StalenessPolicy`].
#[derive(Debug, Clone)]
pub struct StalenessPolicyBuilder {
    timeouts: HashMap<SectionId, Duration>,
    scope_defaults: HashMap<SectionScope, Duration>,
    skip_change_detection: HashSet<SectionId>,
}

impl Default for StalenessPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl StalenessPolicyBuilder {
    /// Creates a builder with an empty timeout table.
    pub fn new() -> Self {
        let scope_defaults = SectionScope::ALL
            .into_iter()
            .map(|scope| (scope, builtin_scope_default(scope)))
            .collect();
        Self {
            timeouts: HashMap::new(),
            scope_defaults,
            skip_change_detection: HashSet::new(),
        }
    }

    /// Creates a builder pre-filled with the desktop application's timeouts.
    pub fn eve_defaults() -> Self {
        let secs = Duration::from_secs;
        let mut builder = Self::new()
            // Character sections
            .timeout(character::ASSETS, secs(HOUR))
            .timeout(character::ATTRIBUTES, secs(2 * MINUTE))
            .timeout(character::CONTRACTS, secs(5 * MINUTE))
            .timeout(character::IMPLANTS, secs(2 * MINUTE))
            .timeout(character::INDUSTRY_JOBS, secs(5 * MINUTE))
            .timeout(character::JUMP_CLONES, secs(2 * MINUTE))
            .timeout(character::LOCATION, secs(5 * MINUTE))
            .timeout(character::MAIL_LABELS, secs(MINUTE))
            .timeout(character::MAIL_LISTS, secs(2 * MINUTE))
            .timeout(character::MAILS, secs(MINUTE))
            .timeout(character::NOTIFICATIONS, secs(10 * MINUTE))
            .timeout(character::ONLINE, secs(5 * MINUTE))
            .timeout(character::PLANETS, secs(10 * MINUTE))
            .timeout(character::ROLES, secs(HOUR))
            .timeout(character::SHIP, secs(5 * MINUTE))
            .timeout(character::SKILLQUEUE, secs(2 * MINUTE))
            .timeout(character::SKILLS, secs(2 * MINUTE))
            .timeout(character::WALLET_BALANCE, secs(2 * MINUTE))
            .timeout(character::WALLET_JOURNAL, secs(HOUR))
            .timeout(character::WALLET_TRANSACTIONS, secs(HOUR))
            // Corporation sections
            .timeout(corporation::DIVISIONS, secs(HOUR))
            .timeout(corporation::INDUSTRY_JOBS, secs(5 * MINUTE))
            .timeout(corporation::WALLET_BALANCES, secs(5 * MINUTE))
            // General sections
            .timeout(general::CHARACTERS, secs(4 * HOUR))
            .timeout(general::CORPORATIONS, secs(4 * HOUR))
            .timeout(general::ENTITIES, secs(24 * HOUR))
            .timeout(general::MARKET_PRICES, secs(6 * HOUR))
            .timeout(general::TYPES, secs(24 * HOUR));

        for section in corporation::WALLET_JOURNALS
            .into_iter()
            .chain(corporation::WALLET_TRANSACTIONS)
        {
            builder = builder.timeout(section, secs(HOUR));
        }
        builder
    }

    /// Sets the timeout of one section.
    pub fn timeout(mut self, section: SectionId, timeout: Duration) -> Self {
        self.timeouts.insert(section, timeout);
        self
    }

    /// Sets the timeout used for unknown sections of a scope.
    pub fn default_timeout(mut self, scope: SectionScope, timeout: Duration) -> Self {
        self.scope_defaults.insert(scope, timeout);
        self
    }

    /// Always applies fetched data of this section.
    pub fn skip_change_detection(mut self, section: SectionId) -> Self {
        self.skip_change_detection.insert(section);
        self
    }

    /// Applies textual overrides, e.g. loaded from a configuration file.
    pub fn overrides(mut self, overrides: &PolicyOverrides) -> Result<Self, ParseSectionError> {
        for (section, secs) in &overrides.timeouts {
            let section: SectionId = section.parse()?;
            self = self.timeout(section, Duration::from_secs(*secs));
        }
        for (scope, secs) in &overrides.default_timeouts {
            let scope: SectionScope = scope.parse()?;
            self = self.default_timeout(scope, Duration::from_secs(*secs));
        }
        for section in &overrides.skip_change_detection {
            self = self.skip_change_detection(section.parse()?);
        }
        Ok(self)
    }

    /// Freezes the policy.
    pub fn build(self) -> StalenessPolicy {
        StalenessPolicy {
            timeouts: self.timeouts,
            scope_defaults: self.scope_defaults,
            skip_change_detection: self.skip_change_detection,
        }
    }
}

/// Serializable adjustments to the built-in policy.
///
/// ```json
/// {
///   "timeouts": { "character:skillqueue": 60 },
///   "default_timeouts": { "general": 3600 },
///   "skip_change_detection": ["character:location"]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyOverrides {
    /// Section timeouts in seconds, keyed by `scope:name`.
    pub timeouts: BTreeMap<String, u64>,
    /// Timeouts in seconds for unknown sections, keyed by scope.
    pub default_timeouts: BTreeMap<String, u64>,
    /// Sections whose data is applied on every refresh.
    pub skip_change_detection: Vec<String>,
}

impl PolicyOverrides {
    /// Whether no override is set.
    pub fn is_empty(&self) -> bool {
        self.timeouts.is_empty()
            && self.default_timeouts.is_empty()
            && self.skip_change_detection.is_empty()
    }

    /// Builds a policy from the built-in defaults with these overrides applied.
    pub fn to_policy(&self) -> Result<StalenessPolicy, ParseSectionError> {
        Ok(StalenessPolicyBuilder::eve_defaults()
            .overrides(self)?
            .build())
    }
}
