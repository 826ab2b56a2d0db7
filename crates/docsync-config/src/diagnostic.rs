// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration diagnostics.
//!
//! Figment errors become miette reports: unknown keys are underlined in the
//! file they came from and get a "did you mean" hint.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

use docsync_core::DocsyncError;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// An unknown key was found in the configuration.
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(docsync::config::unknown_key),
        help("{}", format_unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        /// The unrecognized key name.
        key: String,
        /// Suggested correction via fuzzy matching, if any.
        suggestion: Option<String>,
        /// List of valid keys for the section.
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A configuration value has the wrong type.
    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(docsync::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        key: String,
        detail: String,
        expected: String,
    },

    /// A required configuration key is missing.
    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(docsync::config::missing_key),
        help("add `{key} = <value>` to your docsync.toml")
    )]
    MissingKey { key: String },

    /// A validation error for a config value.
    #[error("validation error: {message}")]
    #[diagnostic(code(docsync::config::validation))]
    Validation { message: String },

    /// Catch-all for other configuration errors.
    #[error("configuration error: {0}")]
    #[diagnostic(code(docsync::config::other))]
    Other(String),
}

impl From<ConfigError> for DocsyncError {
    fn from(err: ConfigError) -> Self {
        DocsyncError::Config(err.to_string())
    }
}

fn format_unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    let valid = format!("keys accepted here: {valid_keys}");
    suggestion.map_or(valid.clone(), |s| format!("did you mean `{s}`? {valid}"))
}

/// Translate every error carried by a `figment::Error` into a diagnostic.
///
/// `toml_sources` pairs each loaded file path with its contents so unknown
/// keys can be pointed at in the source.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter()
        .map(|error| to_config_error(&error, toml_sources))
        .collect()
}

fn to_config_error(error: &figment::Error, toml_sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    let dotted = error
        .path
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(".");
    match &error.kind {
        Kind::UnknownField(field, expected) => {
            let (span, src) = locate(error, field, toml_sources)
                .map_or((None, None), |(span, src)| (Some(span), Some(src)));
            ConfigError::UnknownKey {
                key: field.clone(),
                suggestion: suggest_key(field, *expected),
                valid_keys: expected.join(", "),
                span,
                src,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: field.to_string(),
        },
        Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
            key: dotted,
            detail: format!("found {actual}, expected {expected}"),
            expected: expected.clone(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Point at `field` inside the TOML file the error came from.
fn locate(
    error: &figment::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> Option<(SourceSpan, NamedSource<String>)> {
    let origin = error.metadata.as_ref().and_then(|m| match &m.source {
        Some(figment::Source::File(path)) => Some(path.display().to_string()),
        _ => None,
    });
    let (path, content) = match origin {
        Some(origin) => toml_sources.iter().find(|(p, _)| *p == origin)?,
        // Strings parsed directly carry no file path.
        None => match toml_sources {
            [only] => only,
            _ => return None,
        },
    };
    let offset = find_key_offset(content, &error.path, field)?;
    Some((
        SourceSpan::new(offset.into(), field.len()),
        NamedSource::new(path, content.clone()),
    ))
}

/// Byte offset of `field` as a key under the table named by `path[0]`.
///
/// With an empty `path` only top-level keys are considered.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let wanted = path.first().map(String::as_str);
    let mut table: Option<&str> = None;
    let mut offset = 0;

    for line in content.split_inclusive('\n') {
        let trimmed = line.trim();
        if let Some(header) = trimmed.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
            table = Some(header.trim());
        } else if table == wanted {
            let indent = line.len() - line.trim_start().len();
            let key = line[indent..]
                .split(['=', ' ', '\t'])
                .next()
                .unwrap_or_default();
            if key == field {
                return Some(offset + indent);
            }
        }
        offset += line.len();
    }
    None
}

/// Closest valid key by Jaro-Winkler similarity, if any is close enough.
pub fn suggest_key<S: AsRef<str>>(unknown: &str, valid_keys: &[S]) -> Option<String> {
    valid_keys
        .iter()
        .map(|key| (strsim::jaro_winkler(unknown, key.as_ref()), key.as_ref()))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, key)| key.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suggest_colection_for_collection() {
        let valid = &["database", "collection", "reset"];
        assert_eq!(
            suggest_key("colection", valid),
            Some("collection".to_string())
        );
    }

    #[test]
    fn no_suggestion_for_distant_typo() {
        let valid = &["uri", "command_timeout_secs"];
        assert_eq!(suggest_key("zzzzzz", valid), None);
    }

    #[test]
    fn find_key_offset_ignores_other_tables() {
        let content = "[connection]\nreset = 1\n[sync]\nreset = true\n";
        let path = vec!["sync".to_string()];
        let o = find_key_offset(content, &path, "reset").unwrap();
        assert_eq!(o, content.rfind("reset").unwrap());
        assert_eq!(find_key_offset(content, &[], "reset"), None);
    }

    #[test]
    fn find_key_offset_in_section() {
        let content = "[connection]\nurl = \"x\"\n\n[sync]\nrest = true\n";
        let path = vec!["sync".to_string()];
        let o = find_key_offset(content, &path, "rest").unwrap();
        assert_eq!(&content[o..o + 4], "rest");
    }

    #[test]
    fn config_error_converts_to_docsync_error() {
        let err: DocsyncError = ConfigError::Validation {
            message: "sync.collection must not be empty".into(),
        }
        .into();
        assert!(matches!(err, DocsyncError::Config(ref m) if m.contains("sync.collection")));
    }
}
