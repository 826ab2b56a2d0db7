// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for docsync.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level docsync configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DocsyncConfig {
    /// Database connection settings.
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Delta-sync target and reset behavior.
    #[serde(default)]
    pub sync: SyncConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
    /// Connection string handed to the driver's connect call.
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Per-command timeout. `None` waits for every command indefinitely.
    #[serde(default)]
    pub command_timeout_secs: Option<u64>,
}

impl ConnectionConfig {
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            command_timeout_secs: None,
        }
    }
}

fn default_uri() -> String {
    "sqlite://docsync.db".to_string()
}

/// Delta-sync writer configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SyncConfig {
    /// Database holding the synced collection.
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection receiving the change-sets.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Wipe the collection once when the writer starts.
    #[serde(default)]
    pub reset: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            collection: default_collection(),
            reset: false,
        }
    }
}

fn default_database() -> String {
    "test_database".to_string()
}

fn default_collection() -> String {
    "test_collection".to_string()
}
