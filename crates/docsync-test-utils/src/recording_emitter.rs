// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Emitter that captures forwarded items for assertions.

use docsync_core::{ChangeSet, Emitter, Item};

/// Captures every `(item, producer)` pair passed to [`Emitter::send`].
#[derive(Debug, Default)]
pub struct RecordingEmitter {
    sent: Vec<(Item, String)>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> &[(Item, String)] {
        &self.sent
    }

    pub fn sent_count(&self) -> usize {
        self.sent.len()
    }

    /// Forwarded change-sets, in order, ignoring other item kinds.
    pub fn change_sets(&self) -> Vec<&ChangeSet> {
        self.sent
            .iter()
            .filter_map(|(item, _)| match item {
                Item::ChangeSet(changes) => Some(changes),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.sent.clear();
    }
}

impl Emitter for RecordingEmitter {
    fn send(&mut self, output: Item, producer: &str) {
        self.sent.push((output, producer.to_string()));
    }
}
