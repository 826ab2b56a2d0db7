// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The worker loop: drains the queue and runs each job synchronously.

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, trace};

use crate::job::Job;

/// Run jobs in FIFO order until a `Stop` job is dequeued or every sender is gone.
///
/// Failures never reach this loop: each `Work` closure converts its own
/// errors and panics into a failed completion. Returns the state so the
/// owner can recover it after joining.
pub(crate) fn run<S>(name: &str, mut state: S, mut queue: UnboundedReceiver<Job<S>>) -> S {
    debug!(worker = name, "worker started");
    let mut executed: u64 = 0;

    while let Some(job) = queue.blocking_recv() {
        match job {
            Job::Work(work) => {
                work(&mut state);
                executed += 1;
                trace!(worker = name, executed, "job complete");
            }
            Job::Stop(done) => {
                // The stopper may have given up waiting; nothing to report then.
                let _ = done.send(());
                debug!(worker = name, executed, "worker stopped");
                return state;
            }
        }
    }

    debug!(worker = name, executed, "queue closed, worker exiting");
    state
}
