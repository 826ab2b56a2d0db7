// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The delta-sync writer node.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use docsync_config::{DocsyncConfig, SyncConfig};
use docsync_core::{
    ChangeSet, CollectionRef, Command, Component, Connector, Dependency, DocsyncError, Emitter,
    Filter, Item, Node, Operation,
};
use docsync_storage::{CollectionHandle, Connection};

/// How the writer relates to its connection.
enum Binding {
    /// Started in `start`, stopped in `join`.
    Owned(Arc<Connection>),
    /// Managed by the dispatcher as a separate component.
    Shared(Arc<Connection>),
}

impl Binding {
    fn connection(&self) -> &Arc<Connection> {
        match self {
            Binding::Owned(conn) | Binding::Shared(conn) => conn,
        }
    }
}

/// Applies change-sets to one collection and forwards them downstream.
///
/// For every change-set the writer deletes the listed ids, then inserts the
/// new documents in one batch, and only then forwards the unmodified
/// change-set. A failed command fails the item and nothing is forwarded.
pub struct DeltaSyncWriter {
    name: String,
    target: CollectionRef,
    binding: Binding,
    collection: OnceCell<CollectionHandle>,
    reset_pending: AtomicBool,
    running: AtomicBool,
}

impl DeltaSyncWriter {
    /// A writer that owns a private connection built from `config`.
    pub fn standalone(config: &DocsyncConfig, connector: impl Connector) -> Self {
        let connection = Connection::from_config(&config.connection, connector);
        Self::with_binding(&config.sync, Binding::Owned(Arc::new(connection)))
    }

    /// A writer that issues commands through a connection managed elsewhere.
    ///
    /// The connection must be started before the writer; see
    /// [`Component::dependencies`].
    pub fn shared(config: &SyncConfig, connection: Arc<Connection>) -> Self {
        Self::with_binding(config, Binding::Shared(connection))
    }

    fn with_binding(config: &SyncConfig, binding: Binding) -> Self {
        Self {
            name: "writer".to_string(),
            target: CollectionRef::new(&config.database, &config.collection),
            binding,
            collection: OnceCell::new(),
            reset_pending: AtomicBool::new(config.reset),
            running: AtomicBool::new(false),
        }
    }

    /// Set the identity used as the producer on forwarded items.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &CollectionRef {
        &self.target
    }

    pub fn connection(&self) -> &Arc<Connection> {
        self.binding.connection()
    }

    /// True until the initial reset has been applied.
    pub fn reset_pending(&self) -> bool {
        self.reset_pending.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Describe `operation` against this writer's collection.
    pub fn format_command(&self, operation: Operation) -> Command {
        Command::new(self.target.clone(), operation)
    }

    /// The commands that apply `changes`, in execution order.
    ///
    /// Deletes come first so an id present in both lists ends up replaced.
    /// Empty lists produce no command.
    pub fn plan(&self, changes: &ChangeSet) -> Result<Vec<Command>, DocsyncError> {
        changes.validate()?;
        let mut commands = Vec::with_capacity(2);
        if !changes.deletes.is_empty() {
            commands.push(self.format_command(Operation::DeleteMany {
                filter: Filter::IdIn(changes.deletes.clone()),
            }));
        }
        if !changes.inserts.is_empty() {
            commands.push(self.format_command(Operation::InsertMany {
                documents: changes.documents()?,
            }));
        }
        Ok(commands)
    }

    fn collection(&self) -> Result<&CollectionHandle, DocsyncError> {
        if !self.is_running() {
            return Err(DocsyncError::misuse(format!(
                "writer `{}` received an item before start",
                self.name
            )));
        }
        self.collection.get().ok_or_else(|| {
            DocsyncError::Internal(format!("writer `{}` has no collection handle", self.name))
        })
    }

    /// Bring the writer up, applying the pending reset if configured.
    ///
    /// A failed reset fails start and stays pending for the next attempt.
    pub async fn start(&self) -> Result<(), DocsyncError> {
        if let Binding::Owned(conn) = &self.binding {
            conn.start().await?;
        }

        let conn = Arc::clone(self.connection());
        let target = self.target.clone();
        let collection = self
            .collection
            .get_or_init(|| async move {
                conn.collection(target.database.clone(), target.collection.clone())
            })
            .await;

        if self.reset_pending() {
            info!(writer = %self.name, target = %self.target, "resetting collection");
            match collection.delete_all().await {
                Ok(count) => {
                    self.reset_pending.store(false, Ordering::SeqCst);
                    info!(writer = %self.name, deleted = count, "collection reset");
                }
                Err(err) => {
                    warn!(writer = %self.name, error = %err, "collection reset failed");
                    if let Binding::Owned(conn) = &self.binding {
                        if let Err(stop_err) = conn.stop().await {
                            warn!(writer = %self.name, error = %stop_err, "connection stop failed");
                        }
                    }
                    return Err(err);
                }
            }
        }

        self.running.store(true, Ordering::SeqCst);
        debug!(writer = %self.name, target = %self.target, "writer started");
        Ok(())
    }

    /// Stop accepting items; a standalone writer also stops its connection.
    pub async fn join(&self) -> Result<(), DocsyncError> {
        self.running.store(false, Ordering::SeqCst);
        debug!(writer = %self.name, "writer stopped");
        match &self.binding {
            Binding::Owned(conn) => conn.stop().await,
            Binding::Shared(_) => Ok(()),
        }
    }

    /// Apply one change-set, then forward it through `send`.
    pub async fn apply(
        &self,
        changes: ChangeSet,
        send: &mut dyn Emitter,
    ) -> Result<(), DocsyncError> {
        let collection = self.collection()?;
        for command in self.plan(&changes)? {
            let operation = command.operation.name();
            let outcome = collection.connection().execute(command).await;
            match outcome {
                Ok(outcome) => {
                    debug!(writer = %self.name, operation, ?outcome, "command applied");
                }
                Err(err) => {
                    warn!(writer = %self.name, operation, error = %err, "command failed");
                    return Err(err);
                }
            }
        }
        send.send(Item::ChangeSet(changes), &self.name);
        Ok(())
    }
}

#[async_trait]
impl Component for DeltaSyncWriter {
    fn name(&self) -> &str {
        &self.name
    }

    fn attach(&self, handle: Handle) {
        if let Binding::Owned(conn) = &self.binding {
            conn.attach(handle);
        }
    }

    fn detach(&self) {
        if let Binding::Owned(conn) = &self.binding {
            conn.detach();
        }
    }

    async fn start(&self) -> Result<(), DocsyncError> {
        DeltaSyncWriter::start(self).await
    }

    async fn join(&self) -> Result<(), DocsyncError> {
        DeltaSyncWriter::join(self).await
    }

    fn dependencies(&self) -> Vec<Dependency> {
        match &self.binding {
            Binding::Owned(_) => Vec::new(),
            Binding::Shared(conn) => vec![Dependency::new(&self.name, conn.name())],
        }
    }
}

#[async_trait]
impl Node<ChangeSet> for DeltaSyncWriter {
    async fn call(&mut self, item: ChangeSet, send: &mut dyn Emitter) -> Result<(), DocsyncError> {
        self.apply(item, send).await
    }
}

/// Accepts change-sets in their loosely typed JSON form.
#[async_trait]
impl Node<Value> for DeltaSyncWriter {
    async fn call(&mut self, item: Value, send: &mut dyn Emitter) -> Result<(), DocsyncError> {
        let changes = ChangeSet::from_value(&item)?;
        self.apply(changes, send).await
    }
}
