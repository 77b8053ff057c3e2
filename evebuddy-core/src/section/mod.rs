// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Section identities
//!
//! A section is an independently refreshable slice of remote data owned by an
//! entity (a character or a corporation), or by the whole universe for
//! general sections. A [`SectionKey`] names exactly one such slice.

pub mod catalog;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// ID of a character or corporation. General sections use `0`.
pub type EntityId = i32;

/// Owner kind of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionScope {
    /// Sections owned by a player character.
    Character,
    /// Sections owned by a corporation.
    Corporation,
    /// Sections not owned by any entity (e.g. market prices).
    General,
}

impl SectionScope {
    /// All scopes, in display order.
    pub const ALL: [SectionScope; 3] = [
        SectionScope::Character,
        SectionScope::Corporation,
        SectionScope::General,
    ];

    /// Stable textual form, used in storage and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionScope::Character => "character",
            SectionScope::Corporation => "corporation",
            SectionScope::General => "general",
        }
    }

    /// Whether keys of this scope must carry a non-zero entity ID.
    pub fn requires_entity(&self) -> bool {
        !matches!(self, SectionScope::General)
    }
}

impl fmt::Display for SectionScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionScope {
    type Err = ParseSectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "character" => Ok(SectionScope::Character),
            "corporation" => Ok(SectionScope::Corporation),
            "general" => Ok(SectionScope::General),
            other => Err(ParseSectionError::UnknownScope(other.to_string())),
        }
    }
}

/// Identifies one kind of section within a scope, e.g. `character:skillqueue`.
///
/// Known sections are available as constants in [`catalog`]. Sections not in
/// the catalog can still be constructed with [`SectionId::new`]; the staleness
/// policy falls back to the scope default for them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SectionId {
    scope: SectionScope,
    name: Cow<'static, str>,
}

impl SectionId {
    /// Creates a character section from a static name.
    pub const fn character(name: &'static str) -> Self {
        Self {
            scope: SectionScope::Character,
            name: Cow::Borrowed(name),
        }
    }

    /// Creates a corporation section from a static name.
    pub const fn corporation(name: &'static str) -> Self {
        Self {
            scope: SectionScope::Corporation,
            name: Cow::Borrowed(name),
        }
    }

    /// Creates a general section from a static name.
    pub const fn general(name: &'static str) -> Self {
        Self {
            scope: SectionScope::General,
            name: Cow::Borrowed(name),
        }
    }

    /// Creates a section with an owned name.
    pub fn new(scope: SectionScope, name: impl Into<String>) -> Self {
        Self {
            scope,
            name: Cow::Owned(name.into()),
        }
    }

    /// Returns the scope of this section.
    pub fn scope(&self) -> SectionScope {
        self.scope
    }

    /// Returns the name of this section within its scope.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human readable name, e.g. "wallet_journal_1" -> "Wallet Journal 1".
    pub fn display_name(&self) -> String {
        self.name
            .split('_')
            .filter(|w| !w.is_empty())
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.name)
    }
}

impl FromStr for SectionId {
    type Err = ParseSectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (scope, name) = s
            .split_once(':')
            .ok_or_else(|| ParseSectionError::MissingSeparator(s.to_string()))?;
        let scope: SectionScope = scope.parse()?;
        if name.is_empty() {
            return Err(ParseSectionError::EmptyName(s.to_string()));
        }
        Ok(SectionId::new(scope, name))
    }
}

impl Serialize for SectionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SectionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Composite identity of one refreshable slice: `{entity, section}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SectionKey {
    /// Owning entity, `0` for general sections.
    pub entity_id: EntityId,
    /// The section.
    pub section: SectionId,
}

impl SectionKey {
    /// Creates a key for an entity-owned section.
    pub fn new(entity_id: EntityId, section: SectionId) -> Self {
        Self { entity_id, section }
    }

    /// Creates a key for a general section.
    pub fn general(section: SectionId) -> Self {
        Self {
            entity_id: 0,
            section,
        }
    }

    /// Key under which concurrent refreshes of this slice are deduplicated.
    pub fn dedup_key(&self) -> String {
        format!(
            "update-{}-section-{}-{}",
            self.section.scope(),
            self.section.name(),
            self.entity_id
        )
    }

    /// Checks that the entity ID matches the scope of the section.
    pub fn validate(&self) -> Result<(), InvalidKeyError> {
        let scope = self.section.scope();
        if scope.requires_entity() && self.entity_id == 0 {
            return Err(InvalidKeyError::MissingEntity(self.section.clone()));
        }
        if !scope.requires_entity() && self.entity_id != 0 {
            return Err(InvalidKeyError::UnexpectedEntity(
                self.section.clone(),
                self.entity_id,
            ));
        }
        if self.section.name().is_empty() {
            return Err(InvalidKeyError::EmptySection);
        }
        Ok(())
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.section.scope() {
            SectionScope::General => write!(f, "general / {}", self.section.name()),
            scope => write!(f, "{} {} / {}", scope, self.entity_id, self.section.name()),
        }
    }
}

/// Errors from parsing textual section IDs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSectionError {
    #[error("section id must be of the form 'scope:name', got '{0}'")]
    MissingSeparator(String),

    #[error("unknown section scope: {0}")]
    UnknownScope(String),

    #[error("section id has an empty name: '{0}'")]
    EmptyName(String),
}

/// A key whose entity ID does not fit its scope.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidKeyError {
    #[error("section {0} requires a non-zero entity id")]
    MissingEntity(SectionId),

    #[error("general section {0} must not have an entity id (got {1})")]
    UnexpectedEntity(SectionId, EntityId),

    #[error("section name is empty")]
    EmptySection,
}
