// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./docsync.toml` > `~/.config/docsync/docsync.toml` > `/etc/docsync/docsync.toml`
//! with environment variable overrides via `DOCSYNC_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DocsyncConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/docsync/docsync.toml` (system-wide)
/// 3. `~/.config/docsync/docsync.toml` (user XDG config)
/// 4. `./docsync.toml` (local directory)
/// 5. `DOCSYNC_*` environment variables
pub fn load_config() -> Result<DocsyncConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<DocsyncConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DocsyncConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DocsyncConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DocsyncConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading.
///
/// Returns the Figment before extraction so callers can inspect metadata.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(DocsyncConfig::default()))
        .merge(Toml::file("/etc/docsync/docsync.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("docsync/docsync.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("docsync.toml"))
        .merge(env_provider())
}

/// Environment provider with explicit section mapping.
///
/// `Env::split("_")` would turn `DOCSYNC_CONNECTION_COMMAND_TIMEOUT_SECS` into
/// `connection.command.timeout.secs`; only the first segment names a section.
fn env_provider() -> Env {
    Env::prefixed("DOCSYNC_").map(|key| {
        key.as_str()
            .replacen("connection_", "connection.", 1)
            .replacen("sync_", "sync.", 1)
            .into()
    })
}
