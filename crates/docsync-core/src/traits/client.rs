// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocking database driver traits.
//!
//! Every method here may block. They are only ever invoked on a connection's
//! dedicated worker thread, never on the event loop.

use crate::error::BoxError;
use crate::types::{Command, CommandOutcome, CollectionRef, Document, DocumentId, Filter, Operation};

/// A synchronous client bound to one open database connection.
pub trait DocumentClient: Send {
    /// Delete every document in `target` matching `filter`. Returns the deleted count.
    fn delete_many(&mut self, target: &CollectionRef, filter: &Filter) -> Result<u64, BoxError>;

    /// Insert `documents` into `target` in order. Returns the inserted ids.
    fn insert_many(
        &mut self,
        target: &CollectionRef,
        documents: &[Document],
    ) -> Result<Vec<DocumentId>, BoxError>;

    /// Fetch the documents in `target` matching `filter`, in insertion order.
    fn find(&mut self, target: &CollectionRef, filter: &Filter) -> Result<Vec<Document>, BoxError>;

    /// Release the underlying connection. Called at most once.
    fn close(&mut self) -> Result<(), BoxError>;

    /// Dispatch a serialized [`Command`] to the matching driver call.
    fn execute(&mut self, command: &Command) -> Result<CommandOutcome, BoxError> {
        match &command.operation {
            Operation::DeleteMany { filter } => self
                .delete_many(&command.target, filter)
                .map(|count| CommandOutcome::Deleted { count }),
            Operation::InsertMany { documents } => self
                .insert_many(&command.target, documents)
                .map(|ids| CommandOutcome::Inserted { ids }),
        }
    }
}

/// Constructs [`DocumentClient`]s from a connection URI.
pub trait Connector: Send + Sync + 'static {
    /// Open a client. Runs on the worker thread as the connection's first job.
    fn connect(&self, uri: &str) -> Result<Box<dyn DocumentClient>, BoxError>;
}
