// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for docsync integration tests.
//!
//! Provides test doubles for fast, deterministic tests without a real
//! database.
//!
//! # Components
//!
//! - [`MockConnector`] / [`MockClient`] - in-memory document client recording every call
//! - [`RecordingEmitter`] - captures items forwarded downstream

pub mod mock_client;
pub mod recording_emitter;

pub use mock_client::{Call, MockClient, MockConnector};
pub use recording_emitter::RecordingEmitter;
