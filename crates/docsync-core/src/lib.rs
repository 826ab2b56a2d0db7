// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for docsync.
//!
//! Provides the error type, the change-set and command types that flow
//! through the pipeline, and the traits at each external seam: pipeline
//! nodes, lifecycle components, and blocking database drivers.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{BoxError, DocsyncError};
pub use types::{
    ChangeSet, CollectionRef, Command, CommandOutcome, ConnectionState, Document, DocumentId,
    Filter, HealthStatus, Item, Operation,
};

pub use traits::{
    Component, Connector, Dependency, DocumentClient, Emitter, Node, startup_order,
};
