// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Single-resolution handle for the result of a bridged call.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Sleep;

use docsync_core::DocsyncError;

/// Result slot written by the worker thread.
pub(crate) type Outcome<T> = Result<T, DocsyncError>;

/// Signal fired by the worker just before it runs the job.
pub(crate) type Started = oneshot::Receiver<()>;

enum Slot<T> {
    Pending(oneshot::Receiver<Outcome<T>>),
    Rejected(Option<DocsyncError>),
}

/// Timeout bookkeeping. Time spent waiting in the queue is not counted.
enum Deadline {
    Queued { duration: Duration, started: Started },
    Running { duration: Duration, sleep: Pin<Box<Sleep>> },
}

/// The eventual result of a bridged call.
///
/// Resolves on whichever task awaits it; the worker thread only posts the
/// value into the channel. Dropping a `Completion` does not cancel the job.
#[must_use = "a completion does nothing unless awaited"]
pub struct Completion<T> {
    slot: Slot<T>,
    deadline: Option<Deadline>,
}

impl<T> Completion<T> {
    /// `timeout` pairs the per-job limit with the job's start signal.
    pub(crate) fn pending(
        rx: oneshot::Receiver<Outcome<T>>,
        timeout: Option<(Duration, Started)>,
    ) -> Self {
        Self {
            slot: Slot::Pending(rx),
            deadline: timeout.map(|(duration, started)| Deadline::Queued { duration, started }),
        }
    }

    /// A completion that fails immediately without touching the worker.
    pub fn rejected(err: DocsyncError) -> Self {
        Self {
            slot: Slot::Rejected(Some(err)),
            deadline: None,
        }
    }
}

impl<T> Future for Completion<T> {
    type Output = Result<T, DocsyncError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        match &mut this.slot {
            Slot::Rejected(err) => {
                return Poll::Ready(Err(err.take().unwrap_or_else(|| {
                    DocsyncError::Internal("completion polled after it resolved".into())
                })));
            }
            Slot::Pending(rx) => {
                if let Poll::Ready(received) = Pin::new(rx).poll(cx) {
                    return Poll::Ready(received.unwrap_or_else(|_| {
                        Err(DocsyncError::misuse(
                            "bridge closed before the job could run",
                        ))
                    }));
                }
            }
        }

        if let Some(Deadline::Queued { duration, started }) = &mut this.deadline {
            // A dropped start signal means the job will never run; the result
            // channel reports that, so only a real start arms the timer.
            match Pin::new(started).poll(cx) {
                Poll::Ready(Ok(())) => {
                    let duration = *duration;
                    // Created here so a completion can be built outside a runtime.
                    this.deadline = Some(Deadline::Running {
                        duration,
                        sleep: Box::pin(tokio::time::sleep(duration)),
                    });
                }
                Poll::Ready(Err(_)) => this.deadline = None,
                Poll::Pending => {}
            }
        }

        if let Some(Deadline::Running { duration, sleep }) = &mut this.deadline {
            if sleep.as_mut().poll(cx).is_ready() {
                let duration = *duration;
                this.deadline = None;
                this.slot = Slot::Rejected(None);
                return Poll::Ready(Err(DocsyncError::Timeout { duration }));
            }
        }

        Poll::Pending
    }
}
