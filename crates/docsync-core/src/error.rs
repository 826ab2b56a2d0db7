// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared by the bridge, the connection, and the delta-sync writer.

use thiserror::Error;

/// Boxed error produced by blocking database drivers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The primary error type used across all docsync components.
#[derive(Debug, Error)]
pub enum DocsyncError {
    /// Opening the database client failed. Fatal to `start()`, never retried.
    #[error("failed to connect to `{uri}`: {source}")]
    Connection { uri: String, source: BoxError },

    /// A bridged call returned an error or panicked on the worker thread.
    #[error("command `{operation}` failed: {source}")]
    Command { operation: String, source: BoxError },

    /// A contract violation: malformed item, submit after shutdown,
    /// item before start, or a dependency cycle.
    #[error("protocol misuse: {0}")]
    ProtocolMisuse(String),

    /// A bridged call did not resolve within the configured timeout.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Configuration could not be loaded or failed validation.
    #[error("configuration error: {0}")]
    Config(String),

    /// Internal or unexpected errors (worker thread vanished, join failure).
    #[error("internal error: {0}")]
    Internal(String),
}

impl DocsyncError {
    /// Shorthand for a [`DocsyncError::ProtocolMisuse`] with a formatted message.
    pub fn misuse(message: impl Into<String>) -> Self {
        Self::ProtocolMisuse(message.into())
    }

    /// Returns true if this error came from a failed or panicked bridged call.
    pub fn is_command(&self) -> bool {
        matches!(self, Self::Command { .. })
    }
}
