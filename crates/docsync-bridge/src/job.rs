// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Units of deferred work handed to the worker thread.

use tokio::sync::oneshot;

/// A type-erased call against the worker-owned state.
///
/// The closure owns the caller's completion sender and resolves it exactly
/// once, whether the wrapped function returns, fails, or panics.
pub(crate) type Work<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// A job on the bridge queue.
pub(crate) enum Job<S> {
    /// Run a function on the worker thread.
    Work(Work<S>),
    /// Leave the worker loop. Jobs queued before this one have all run.
    Stop(oneshot::Sender<()>),
}
