// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle on top of the blocking call bridge.
//!
//! A [`Connection`] owns one bridge whose worker thread holds the driver
//! client. States move `Closed -> Starting -> Open -> Stopping -> Closed`;
//! commands are only accepted while `Open`. The client is created, used,
//! and closed exclusively on the worker thread.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

use docsync_bridge::{Bridge, Completion};
use docsync_config::ConnectionConfig;
use docsync_core::{
    BoxError, Command, CommandOutcome, Component, ConnectionState, Connector, DocsyncError,
    DocumentClient, Emitter, HealthStatus, Item, Node,
};

use crate::collection::CollectionHandle;
use crate::sqlite::SqliteConnector;

/// Worker-owned client slot. `None` until connect succeeds and after close.
type ClientSlot = Option<Box<dyn DocumentClient>>;

enum State {
    Closed,
    Starting,
    Open(Bridge<ClientSlot>),
    Stopping,
}

impl State {
    fn kind(&self) -> ConnectionState {
        match self {
            State::Closed => ConnectionState::Closed,
            State::Starting => ConnectionState::Starting,
            State::Open(_) => ConnectionState::Open,
            State::Stopping => ConnectionState::Stopping,
        }
    }
}

/// A database connection served by one dedicated worker thread.
pub struct Connection {
    name: String,
    uri: String,
    connector: Arc<dyn Connector>,
    command_timeout: Option<Duration>,
    runtime: Mutex<Option<Handle>>,
    state: Mutex<State>,
    // Serializes start/stop so each sees a settled state.
    lifecycle: tokio::sync::Mutex<()>,
}

impl Connection {
    /// Create a closed connection that will open `uri` with `connector`.
    pub fn new(uri: impl Into<String>, connector: impl Connector) -> Self {
        Self {
            name: "connection".to_string(),
            uri: uri.into(),
            connector: Arc::new(connector),
            command_timeout: None,
            runtime: Mutex::new(None),
            state: Mutex::new(State::Closed),
            lifecycle: tokio::sync::Mutex::new(()),
        }
    }

    /// Create a closed connection from the `[connection]` config section.
    pub fn from_config(config: &ConnectionConfig, connector: impl Connector) -> Self {
        Self::new(config.uri.clone(), connector).with_command_timeout(config.command_timeout())
    }

    /// Create a closed connection to the SQLite document store at `config.uri`.
    pub fn sqlite(config: &ConnectionConfig) -> Self {
        Self::from_config(config, SqliteConnector)
    }

    /// Set the component name used in logs, thread names, and dependency wiring.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn state(&self) -> ConnectionState {
        self.lock_state()
            .map(|s| s.kind())
            .unwrap_or(ConnectionState::Closed)
    }

    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, State>, DocsyncError> {
        self.state
            .lock()
            .map_err(|_| DocsyncError::Internal("connection state lock poisoned".into()))
    }

    fn set_state(&self, state: State) -> Result<(), DocsyncError> {
        *self.lock_state()? = state;
        Ok(())
    }

    /// Bind to the event loop whose blocking pool joins the worker thread.
    pub fn attach(&self, handle: Handle) {
        if let Ok(mut runtime) = self.runtime.lock() {
            *runtime = Some(handle);
        }
    }

    /// Release the event-loop binding. Does not affect liveness.
    pub fn detach(&self) {
        if let Ok(mut runtime) = self.runtime.lock() {
            *runtime = None;
        }
    }

    pub fn is_attached(&self) -> bool {
        self.runtime.lock().map(|h| h.is_some()).unwrap_or(false)
    }

    /// Spawn the worker thread and open the client on it.
    ///
    /// Fails with [`DocsyncError::Connection`] if the driver's connect call
    /// fails; the worker is torn down and the connection stays closed.
    pub async fn start(&self) -> Result<(), DocsyncError> {
        let _lifecycle = self.lifecycle.lock().await;
        {
            let mut state = self.lock_state()?;
            if !matches!(*state, State::Closed) {
                return Err(DocsyncError::misuse(format!(
                    "connection `{}` cannot start while {}",
                    self.name,
                    state.kind()
                )));
            }
            *state = State::Starting;
        }

        let runtime = self.runtime.lock().ok().and_then(|h| h.clone());
        let bridge = match Bridge::<ClientSlot>::spawn(format!("docsync-{}", self.name), None) {
            Ok(bridge) => bridge
                .with_timeout(self.command_timeout)
                .with_runtime(runtime),
            Err(err) => {
                self.set_state(State::Closed)?;
                return Err(err);
            }
        };

        let connector = Arc::clone(&self.connector);
        let uri = self.uri.clone();
        let connected = bridge
            .call("connect", move |slot: &mut ClientSlot| {
                *slot = Some(connector.connect(&uri)?);
                Ok::<_, BoxError>(())
            })
            .await;

        match connected {
            Ok(()) => {
                self.set_state(State::Open(bridge))?;
                info!(connection = %self.name, uri = %self.uri, "connection open");
                Ok(())
            }
            Err(err) => {
                warn!(connection = %self.name, uri = %self.uri, error = %err, "connect failed");
                if let Err(shutdown_err) = shutdown(bridge).await {
                    warn!(connection = %self.name, error = %shutdown_err, "worker teardown failed");
                }
                self.set_state(State::Closed)?;
                Err(DocsyncError::Connection {
                    uri: self.uri.clone(),
                    source: Box::new(err),
                })
            }
        }
    }

    /// Drain queued commands, close the client, and join the worker thread.
    ///
    /// Idempotent: stopping a connection that is not open does nothing.
    pub async fn stop(&self) -> Result<(), DocsyncError> {
        let _lifecycle = self.lifecycle.lock().await;
        let bridge = {
            let mut state = self.lock_state()?;
            match std::mem::replace(&mut *state, State::Stopping) {
                State::Open(bridge) => bridge,
                previous => {
                    debug!(connection = %self.name, state = %previous.kind(), "stop ignored");
                    *state = previous;
                    return Ok(());
                }
            }
        };

        let result = shutdown(bridge).await;
        self.set_state(State::Closed)?;
        info!(connection = %self.name, "connection closed");
        result
    }

    /// Submit a blocking call against the open client.
    ///
    /// Returns immediately. Outside the `Open` state the completion resolves
    /// with [`DocsyncError::ProtocolMisuse`].
    pub fn cmd<F, T>(&self, operation: &str, f: F) -> Completion<T>
    where
        F: FnOnce(&mut dyn DocumentClient) -> Result<T, BoxError> + Send + 'static,
        T: Send + 'static,
    {
        let state = match self.lock_state() {
            Ok(state) => state,
            Err(err) => return Completion::rejected(err),
        };
        match &*state {
            State::Open(bridge) => {
                bridge.submit_named(operation, move |slot: &mut ClientSlot| {
                    match slot.as_deref_mut() {
                        Some(client) => f(client),
                        None => Err(BoxError::from("client handle is closed")),
                    }
                })
            }
            other => Completion::rejected(DocsyncError::misuse(format!(
                "`{operation}` submitted while connection `{}` is {}",
                self.name,
                other.kind()
            ))),
        }
    }

    /// Submit one serialized [`Command`].
    pub fn execute(&self, command: Command) -> Completion<CommandOutcome> {
        let operation = command.operation.name();
        debug!(connection = %self.name, target = %command.target, operation, "executing command");
        self.cmd(operation, move |client| client.execute(&command))
    }

    /// A lightweight handle bound to `database.collection`. No I/O happens here.
    pub fn collection(
        self: &Arc<Self>,
        database: impl Into<String>,
        collection: impl Into<String>,
    ) -> CollectionHandle {
        CollectionHandle::new(Arc::clone(self), database, collection)
    }

    /// Round-trip a no-op job through the worker.
    pub async fn health_check(&self) -> HealthStatus {
        let state = self.state();
        if state != ConnectionState::Open {
            return HealthStatus::Unhealthy(format!("connection is {state}"));
        }
        match self.cmd("ping", |_| Ok(())).await {
            Ok(()) => HealthStatus::Healthy,
            Err(err) => HealthStatus::Degraded(err.to_string()),
        }
    }
}

/// Close the client on the worker, then stop and join it.
async fn shutdown(bridge: Bridge<ClientSlot>) -> Result<(), DocsyncError> {
    let closed = bridge
        .call("close", |slot: &mut ClientSlot| match slot.take() {
            Some(mut client) => client.close(),
            None => Ok(()),
        })
        .await;
    let stopped = bridge.stop().await;
    closed?;
    stopped.map(|_| ())
}

#[async_trait]
impl Component for Connection {
    fn name(&self) -> &str {
        &self.name
    }

    fn attach(&self, handle: Handle) {
        Connection::attach(self, handle);
    }

    fn detach(&self) {
        Connection::detach(self);
    }

    async fn start(&self) -> Result<(), DocsyncError> {
        Connection::start(self).await
    }

    async fn join(&self) -> Result<(), DocsyncError> {
        Connection::stop(self).await
    }
}

/// Executes command items and forwards each outcome downstream.
#[async_trait]
impl Node<Command> for Connection {
    async fn call(&mut self, item: Command, send: &mut dyn Emitter) -> Result<(), DocsyncError> {
        let outcome = self.execute(item).await?;
        send.send(Item::Outcome(outcome), &self.name);
        Ok(())
    }
}
