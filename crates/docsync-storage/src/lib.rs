// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle for docsync.
//!
//! A [`Connection`] owns a blocking call bridge whose worker thread holds
//! the database client, and exposes start/stop, collection handles, and a
//! command-executing pipeline node. [`SqliteConnector`] provides a blocking
//! document store over SQLite.

pub mod collection;
pub mod connection;
pub mod sqlite;

pub use collection::CollectionHandle;
pub use connection::Connection;
pub use sqlite::{SqliteClient, SqliteConnector};
