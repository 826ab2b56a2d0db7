// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collection handles: a connection plus a `(database, collection)` target.

use std::fmt;
use std::sync::Arc;

use docsync_bridge::Completion;
use docsync_core::{
    CollectionRef, Command, CommandOutcome, Document, DocumentId, Filter, Operation,
};

use crate::connection::Connection;

/// A lightweight reference to one collection on a [`Connection`].
///
/// Cloning is cheap. Every method only enqueues work; nothing blocks.
#[derive(Clone)]
pub struct CollectionHandle {
    connection: Arc<Connection>,
    target: CollectionRef,
}

impl CollectionHandle {
    pub(crate) fn new(
        connection: Arc<Connection>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        Self {
            connection,
            target: CollectionRef::new(database, collection),
        }
    }

    pub fn target(&self) -> &CollectionRef {
        &self.target
    }

    pub fn connection(&self) -> &Arc<Connection> {
        &self.connection
    }

    /// Describe `operation` against this collection as a serializable command.
    pub fn command(&self, operation: Operation) -> Command {
        Command::new(self.target.clone(), operation)
    }

    /// Run a serialized command built by [`CollectionHandle::command`].
    pub fn execute(&self, operation: Operation) -> Completion<CommandOutcome> {
        self.connection.execute(self.command(operation))
    }

    pub fn delete_many(&self, filter: Filter) -> Completion<u64> {
        let target = self.target.clone();
        self.connection.cmd("delete_many", move |client| {
            client.delete_many(&target, &filter)
        })
    }

    /// Remove every document in the collection.
    pub fn delete_all(&self) -> Completion<u64> {
        self.delete_many(Filter::All)
    }

    pub fn insert_many(&self, documents: Vec<Document>) -> Completion<Vec<DocumentId>> {
        let target = self.target.clone();
        self.connection.cmd("insert_many", move |client| {
            client.insert_many(&target, &documents)
        })
    }

    pub fn find(&self, filter: Filter) -> Completion<Vec<Document>> {
        let target = self.target.clone();
        self.connection
            .cmd("find", move |client| client.find(&target, &filter))
    }
}

impl fmt::Debug for CollectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionHandle")
            .field("connection", &self.connection.name())
            .field("target", &self.target)
            .finish()
    }
}
