// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Configuration for the section updater

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::{PolicyOverrides, StalenessPolicy};
use crate::section::ParseSectionError;
use crate::storage::StorageError;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid section in policy overrides: {0}")]
    InvalidSection(#[from] ParseSectionError),

    #[error("failed to open status database: {0}")]
    Storage(#[from] StorageError),
}

/// Configuration for the section update system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdaterConfig {
    /// Directory holding the status database
    pub storage_path: PathBuf,

    /// File name of the status database
    pub database_name: String,

    /// Adjustments to the built-in staleness policy
    pub policy: PolicyOverrides,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("."),
            database_name: "evebuddy.sqlite".to_string(),
            policy: PolicyOverrides::default(),
        }
    }
}

impl UpdaterConfig {
    /// Parses a configuration from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks that all section names in the policy overrides parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.policy.to_policy()?;
        Ok(())
    }

    /// Full path of the status database.
    pub fn database_path(&self) -> PathBuf {
        self.storage_path.join(&self.database_name)
    }

    /// Builds the staleness policy described by this configuration.
    pub fn staleness_policy(&self) -> Result<StalenessPolicy, ConfigError> {
        Ok(self.policy.to_policy()?)
    }

    /// Configure the storage directory
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Configure the database file name
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Configure policy overrides
    pub fn with_policy(mut self, policy: PolicyOverrides) -> Self {
        self.policy = policy;
        self
    }
}
