// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Blocking call bridge for docsync.
//!
//! Lets code on a single-threaded event loop run blocking functions on one
//! dedicated worker thread without stalling the loop. Jobs execute strictly
//! in submission order, one at a time; each result travels back through a
//! [`Completion`] future.
//!
//! ```no_run
//! # async fn demo() -> Result<(), docsync_core::DocsyncError> {
//! use docsync_bridge::Bridge;
//!
//! let bridge = Bridge::spawn("example", 0u64)?;
//! let total = bridge
//!     .call("add", |sum: &mut u64| {
//!         *sum += 2;
//!         Ok::<_, docsync_core::BoxError>(*sum)
//!     })
//!     .await?;
//! assert_eq!(total, 2);
//! bridge.stop().await?;
//! # Ok(())
//! # }
//! ```

mod bridge;
mod completion;
mod job;
mod worker;

pub use bridge::Bridge;
pub use completion::Completion;
