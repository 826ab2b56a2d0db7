// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory document client for deterministic testing.
//!
//! Every client opened by a [`MockConnector`] shares the connector's call log
//! and document store, so tests can assert on both after the connection has
//! been stopped. Latency and failures can be injected per operation.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread;
use std::time::Duration;

use tracing::trace;

use docsync_core::types::ID_FIELD;
use docsync_core::{
    BoxError, CollectionRef, Connector, Document, DocumentClient, DocumentId, Filter,
};

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Connect {
        uri: String,
    },
    DeleteMany {
        target: CollectionRef,
        filter: Filter,
    },
    InsertMany {
        target: CollectionRef,
        documents: Vec<Document>,
    },
    Find {
        target: CollectionRef,
    },
    Close,
}

impl Call {
    /// Driver-facing operation name.
    pub fn operation(&self) -> &'static str {
        match self {
            Call::Connect { .. } => "connect",
            Call::DeleteMany { .. } => "delete_many",
            Call::InsertMany { .. } => "insert_many",
            Call::Find { .. } => "find",
            Call::Close => "close",
        }
    }
}

type Store = HashMap<CollectionRef, Vec<Document>>;

#[derive(Default)]
struct Shared {
    calls: Mutex<Vec<Call>>,
    store: Mutex<Store>,
    failing: Mutex<HashSet<&'static str>>,
    latency: Mutex<HashMap<&'static str, Duration>>,
    worker_threads: Mutex<Vec<Option<String>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread must not hide the calls recorded so far.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Opens [`MockClient`]s that share one call log and document store.
#[derive(Clone, Default)]
pub struct MockConnector {
    shared: Arc<Shared>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call of `operation` fail. `"connect"` fails the connect call.
    pub fn fail_on(self, operation: &'static str) -> Self {
        lock(&self.shared.failing).insert(operation);
        self
    }

    /// Stop failing `operation`.
    pub fn recover(&self, operation: &'static str) {
        lock(&self.shared.failing).remove(operation);
    }

    /// Sleep for `delay` on the worker thread before running `operation`.
    pub fn with_latency(self, operation: &'static str, delay: Duration) -> Self {
        lock(&self.shared.latency).insert(operation, delay);
        self
    }

    /// Every call recorded so far, in execution order.
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.shared.calls).clone()
    }

    /// Operation names of every recorded call, in execution order.
    pub fn operations(&self) -> Vec<&'static str> {
        lock(&self.shared.calls).iter().map(Call::operation).collect()
    }

    pub fn count(&self, operation: &str) -> usize {
        lock(&self.shared.calls)
            .iter()
            .filter(|c| c.operation() == operation)
            .count()
    }

    /// Documents currently stored in `target`.
    pub fn documents(&self, target: &CollectionRef) -> Vec<Document> {
        lock(&self.shared.store)
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    /// Seed `target` with documents without recording a call.
    pub fn seed(&self, target: &CollectionRef, documents: Vec<Document>) {
        lock(&self.shared.store)
            .entry(target.clone())
            .or_default()
            .extend(documents);
    }

    /// Names of the threads each call ran on.
    pub fn worker_threads(&self) -> Vec<Option<String>> {
        lock(&self.shared.worker_threads).clone()
    }

    fn record(&self, call: Call) -> Result<(), BoxError> {
        let operation = call.operation();
        let delay = lock(&self.shared.latency).get(operation).copied();
        if let Some(delay) = delay {
            thread::sleep(delay);
        }
        trace!(operation, "mock client call");
        lock(&self.shared.calls).push(call);
        lock(&self.shared.worker_threads).push(thread::current().name().map(str::to_string));
        if lock(&self.shared.failing).contains(operation) {
            return Err(format!("injected failure in `{operation}`").into());
        }
        Ok(())
    }
}

impl Connector for MockConnector {
    fn connect(&self, uri: &str) -> Result<Box<dyn DocumentClient>, BoxError> {
        self.record(Call::Connect {
            uri: uri.to_string(),
        })?;
        Ok(Box::new(MockClient {
            connector: self.clone(),
            closed: false,
        }))
    }
}

/// A client opened by [`MockConnector`].
pub struct MockClient {
    connector: MockConnector,
    closed: bool,
}

impl MockClient {
    fn ensure_open(&self) -> Result<(), BoxError> {
        if self.closed {
            Err("mock client is closed".into())
        } else {
            Ok(())
        }
    }
}

fn matches(doc: &Document, filter: &Filter) -> bool {
    match filter {
        Filter::All => true,
        Filter::IdIn(ids) => doc
            .get(ID_FIELD)
            .is_some_and(|id| ids.iter().any(|wanted| wanted.to_value() == *id)),
    }
}

impl DocumentClient for MockClient {
    fn delete_many(&mut self, target: &CollectionRef, filter: &Filter) -> Result<u64, BoxError> {
        self.ensure_open()?;
        self.connector.record(Call::DeleteMany {
            target: target.clone(),
            filter: filter.clone(),
        })?;
        let mut store = lock(&self.connector.shared.store);
        let docs = store.entry(target.clone()).or_default();
        let before = docs.len();
        docs.retain(|doc| !matches(doc, filter));
        Ok((before - docs.len()) as u64)
    }

    fn insert_many(
        &mut self,
        target: &CollectionRef,
        documents: &[Document],
    ) -> Result<Vec<DocumentId>, BoxError> {
        self.ensure_open()?;
        self.connector.record(Call::InsertMany {
            target: target.clone(),
            documents: documents.to_vec(),
        })?;
        let ids = documents
            .iter()
            .map(|doc| {
                doc.get(ID_FIELD)
                    .ok_or_else(|| BoxError::from("document has no `_id` field"))
                    .and_then(|id| DocumentId::from_value(id).map_err(BoxError::from))
            })
            .collect::<Result<Vec<_>, _>>()?;
        lock(&self.connector.shared.store)
            .entry(target.clone())
            .or_default()
            .extend(documents.iter().cloned());
        Ok(ids)
    }

    fn find(&mut self, target: &CollectionRef, filter: &Filter) -> Result<Vec<Document>, BoxError> {
        self.ensure_open()?;
        self.connector.record(Call::Find {
            target: target.clone(),
        })?;
        Ok(self
            .connector
            .documents(target)
            .into_iter()
            .filter(|doc| matches(doc, filter))
            .collect())
    }

    fn close(&mut self) -> Result<(), BoxError> {
        if self.closed {
            return Err("mock client closed twice".into());
        }
        self.closed = true;
        self.connector.record(Call::Close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn target() -> CollectionRef {
        CollectionRef::new("db", "coll")
    }

    #[test]
    fn records_calls_in_order() {
        let connector = MockConnector::new();
        let mut client = connector.connect("mock://").unwrap();
        let doc = json!({"_id": 1}).as_object().cloned().unwrap();
        client.insert_many(&target(), &[doc]).unwrap();
        client.delete_many(&target(), &Filter::All).unwrap();
        client.close().unwrap();

        assert_eq!(
            connector.operations(),
            vec!["connect", "insert_many", "delete_many", "close"]
        );
        assert!(connector.documents(&target()).is_empty());
    }

    #[test]
    fn injected_failure_is_reported() {
        let connector = MockConnector::new().fail_on("delete_many");
        let mut client = connector.connect("mock://").unwrap();
        assert!(client.delete_many(&target(), &Filter::All).is_err());
        connector.recover("delete_many");
        assert!(client.delete_many(&target(), &Filter::All).is_ok());
    }

    #[test]
    fn closing_twice_is_an_error() {
        let connector = MockConnector::new();
        let mut client = connector.connect("mock://").unwrap();
        client.close().unwrap();
        assert!(client.close().is_err());
        assert_eq!(connector.count("close"), 1);
    }
}
