// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The blocking call bridge: one queue, one worker thread, strict FIFO.
//!
//! The event loop hands jobs to the worker through an unbounded channel and
//! awaits a [`Completion`] per job. The worker thread owns a state value `S`
//! (for a connection, the driver client) that only jobs can touch.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use docsync_core::{BoxError, DocsyncError};

use crate::completion::Completion;
use crate::job::{Job, Work};
use crate::worker;

/// A blocking call bridge with a dedicated worker thread owning `S`.
pub struct Bridge<S> {
    name: String,
    queue: mpsc::UnboundedSender<Job<S>>,
    worker: JoinHandle<S>,
    timeout: Option<Duration>,
    runtime: Option<Handle>,
}

impl<S: Send + 'static> Bridge<S> {
    /// Create the queue and spawn the named worker thread owning `state`.
    pub fn spawn(name: impl Into<String>, state: S) -> Result<Self, DocsyncError> {
        let name = name.into();
        let (queue, rx) = mpsc::unbounded_channel();
        let thread_name = name.clone();
        let worker = std::thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker::run(&thread_name, state, rx))
            .map_err(|e| {
                DocsyncError::Internal(format!("failed to spawn worker thread `{name}`: {e}"))
            })?;
        debug!(worker = %name, "bridge spawned");
        Ok(Self {
            name,
            queue,
            worker,
            timeout: None,
            runtime: None,
        })
    }

    /// Resolve a completion with [`DocsyncError::Timeout`] if its job runs
    /// longer than `timeout` once the worker has picked it up. Time spent
    /// queued behind other jobs does not count. The job itself still runs
    /// to the end.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the final thread join on `handle`'s blocking pool instead of the
    /// ambient runtime.
    pub fn with_runtime(mut self, handle: Option<Handle>) -> Self {
        self.runtime = handle;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns false once the worker has left its loop.
    pub fn is_running(&self) -> bool {
        !self.queue.is_closed()
    }

    /// Enqueue `f` and return immediately. Equivalent to [`Bridge::submit_named`]
    /// with the operation name `"call"`.
    pub fn submit<F, T, E>(&self, f: F) -> Completion<T>
    where
        F: FnOnce(&mut S) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<BoxError>,
    {
        self.submit_named("call", f)
    }

    /// Enqueue `f` under an operation name used in errors and logs.
    ///
    /// The returned completion resolves with `f`'s value, or with
    /// [`DocsyncError::Command`] if `f` fails or panics. If the worker has
    /// already stopped it resolves with [`DocsyncError::ProtocolMisuse`].
    pub fn submit_named<F, T, E>(&self, operation: &str, f: F) -> Completion<T>
    where
        F: FnOnce(&mut S) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<BoxError>,
    {
        let (tx, rx) = oneshot::channel();
        let (start, timer) = match self.timeout {
            Some(duration) => {
                let (start, started) = oneshot::channel();
                (Some(start), Some((duration, started)))
            }
            None => (None, None),
        };
        let op = operation.to_string();
        let work: Work<S> = Box::new(move |state: &mut S| {
            if let Some(start) = start {
                let _ = start.send(());
            }
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| f(state))) {
                Ok(Ok(value)) => Ok(value),
                Ok(Err(err)) => Err(DocsyncError::Command {
                    operation: op,
                    source: err.into(),
                }),
                Err(payload) => Err(DocsyncError::Command {
                    source: format!("panicked: {}", panic_message(&*payload)).into(),
                    operation: op,
                }),
            };
            // The caller may have timed out or dropped its completion.
            let _ = tx.send(outcome);
        });

        if self.queue.send(Job::Work(work)).is_err() {
            return Completion::rejected(DocsyncError::misuse(format!(
                "`{operation}` submitted after bridge `{}` stopped",
                self.name
            )));
        }
        Completion::pending(rx, timer)
    }

    /// Submit `f` and await its result.
    pub async fn call<F, T, E>(&self, operation: &str, f: F) -> Result<T, DocsyncError>
    where
        F: FnOnce(&mut S) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: Into<BoxError>,
    {
        self.submit_named(operation, f).await
    }

    /// Stop the worker after every previously submitted job has run, join the
    /// thread, and hand back the worker state.
    pub async fn stop(self) -> Result<S, DocsyncError> {
        let Bridge {
            name,
            queue,
            worker,
            runtime,
            ..
        } = self;

        let (tx, rx) = oneshot::channel();
        if queue.send(Job::Stop(tx)).is_ok() {
            if rx.await.is_err() {
                warn!(worker = %name, "worker exited without acknowledging stop");
            }
        } else {
            debug!(worker = %name, "worker already gone, joining");
        }
        drop(queue);

        let runtime = runtime.unwrap_or_else(Handle::current);
        let joined = runtime
            .spawn_blocking(move || worker.join())
            .await
            .map_err(|e| DocsyncError::Internal(format!("join task for `{name}` failed: {e}")))?;
        let state = joined.map_err(|payload| {
            DocsyncError::Internal(format!(
                "worker `{name}` panicked: {}",
                panic_message(&*payload)
            ))
        })?;
        debug!(worker = %name, "bridge stopped");
        Ok(state)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
