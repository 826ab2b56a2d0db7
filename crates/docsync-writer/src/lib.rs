// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delta-sync writer for docsync.
//!
//! [`DeltaSyncWriter`] applies each change-set to one collection as a
//! delete followed by a batched insert, then forwards the change-set
//! downstream. With `reset` enabled the collection is wiped once at start.

pub mod writer;

pub use writer::DeltaSyncWriter;
