// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::DocsyncConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &DocsyncConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    let uri = config.connection.uri.trim();
    if uri.is_empty() {
        errors.push(ConfigError::Validation {
            message: "connection.uri must not be empty".to_string(),
        });
    } else if !uri.contains(':') {
        errors.push(ConfigError::Validation {
            message: format!("connection.uri `{uri}` has no scheme"),
        });
    }

    if config.connection.command_timeout_secs == Some(0) {
        errors.push(ConfigError::Validation {
            message: "connection.command_timeout_secs must be at least 1".to_string(),
        });
    }

    for (key, name) in [
        ("sync.database", &config.sync.database),
        ("sync.collection", &config.sync.collection),
    ] {
        if let Some(message) = check_name(key, name) {
            errors.push(ConfigError::Validation { message });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Database and collection names end up in storage identifiers.
fn check_name(key: &str, name: &str) -> Option<String> {
    if name.trim().is_empty() {
        return Some(format!("{key} must not be empty"));
    }
    if let Some(bad) = name.chars().find(|c| matches!(c, '$' | '\0' | '/' | '\\' | '"' | ' ')) {
        return Some(format!("{key} `{name}` contains invalid character {bad:?}"));
    }
    None
}
