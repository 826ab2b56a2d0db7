// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for the docsync configuration system.

use docsync_config::diagnostic::ConfigError;
use docsync_config::model::DocsyncConfig;
use docsync_config::{load_and_validate_str, load_config_from_path, load_config_from_str};

/// Valid TOML with all known fields deserializes successfully.
#[test]
fn valid_toml_deserializes_into_docsync_config() {
    let toml = r#"
[connection]
uri = "sqlite:///var/lib/docsync/docs.db"
command_timeout_secs = 30

[sync]
database = "metadata"
collection = "files"
reset = true
"#;

    let config = load_config_from_str(toml).expect("valid TOML should deserialize");
    assert_eq!(config.connection.uri, "sqlite:///var/lib/docsync/docs.db");
    assert_eq!(
        config.connection.command_timeout(),
        Some(std::time::Duration::from_secs(30))
    );
    assert_eq!(config.sync.database, "metadata");
    assert_eq!(config.sync.collection, "files");
    assert!(config.sync.reset);
}

/// Missing optional sections use defaults without error.
#[test]
fn missing_sections_use_defaults() {
    let config = load_config_from_str("").expect("empty TOML should use defaults");
    assert_eq!(config, DocsyncConfig::default());
    assert_eq!(config.connection.uri, "sqlite://docsync.db");
    assert!(config.connection.command_timeout_secs.is_none());
    assert_eq!(config.sync.database, "test_database");
    assert_eq!(config.sync.collection, "test_collection");
    assert!(!config.sync.reset);
}

/// A typo in a key is reported with a suggestion.
#[test]
fn unknown_key_gets_suggestion() {
    let toml = r#"
[sync]
colection = "files"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject unknown field");
    let unknown = errors
        .iter()
        .find_map(|e| match e {
            ConfigError::UnknownKey {
                key, suggestion, ..
            } => Some((key.clone(), suggestion.clone())),
            _ => None,
        })
        .expect("should produce UnknownKey");
    assert_eq!(unknown.0, "colection");
    assert_eq!(unknown.1.as_deref(), Some("collection"));
}

/// A value of the wrong type is reported as InvalidType.
#[test]
fn wrong_type_is_reported() {
    let toml = r#"
[sync]
reset = "yes please"
"#;

    let errors = load_and_validate_str(toml).expect_err("should reject wrong type");
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::InvalidType { key, .. } if key.contains("reset"))),
        "got: {errors:?}"
    );
}

/// Semantic validation runs after successful deserialization.
#[test]
fn validation_errors_surface_through_load_and_validate() {
    let toml = r#"
[connection]
uri = "nowhere"
"#;

    let errors = load_and_validate_str(toml).expect_err("uri without scheme is invalid");
    assert!(matches!(&errors[0], ConfigError::Validation { message } if message.contains("scheme")));
}

/// Missing config files are silently skipped.
#[test]
fn missing_config_file_yields_defaults() {
    let config = load_config_from_path(std::path::Path::new("/nonexistent/docsync.toml"))
        .expect("missing file should be silently skipped");
    assert_eq!(config.sync.collection, "test_collection");
}
