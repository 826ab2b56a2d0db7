// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Trait seams between docsync and its external collaborators.
//!
//! The pipeline dispatcher drives [`Component`] lifecycles and feeds items to
//! [`Node`]s; blocking database drivers plug in through [`Connector`] and
//! [`DocumentClient`].

pub mod client;
pub mod component;
pub mod node;

pub use client::{Connector, DocumentClient};
pub use component::{Component, Dependency, startup_order};
pub use node::{Emitter, Node};
