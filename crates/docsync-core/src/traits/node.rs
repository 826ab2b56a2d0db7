// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pipeline node contract consumed from the external dispatcher.

use async_trait::async_trait;

use crate::error::DocsyncError;
use crate::types::Item;

/// Forwards values to downstream nodes.
pub trait Emitter: Send {
    /// Send `output` downstream, tagged with the producing node's identity.
    fn send(&mut self, output: Item, producer: &str);
}

/// A callback-style pipeline node.
///
/// The dispatcher never overlaps two calls on the same node; `&mut self`
/// makes that at-most-one-in-flight contract explicit.
#[async_trait]
pub trait Node<I: Send + 'static>: Send {
    /// Process one item, forwarding results through `send`.
    ///
    /// An `Err` marks the item as failed; nothing is forwarded for it.
    async fn call(&mut self, item: I, send: &mut dyn Emitter) -> Result<(), DocsyncError>;
}
