// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Connection lifecycle tests against the mock driver and a SQLite file.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};

use docsync_config::ConnectionConfig;
use docsync_core::{
    CollectionRef, Command, CommandOutcome, ConnectionState, DocsyncError, Document, Filter, Item,
    Node, Operation,
};
use docsync_storage::Connection;
use docsync_test_utils::{MockConnector, RecordingEmitter};

fn doc(value: Value) -> Document {
    value.as_object().cloned().unwrap()
}

fn mock_connection(connector: &MockConnector) -> Arc<Connection> {
    Arc::new(Connection::new("mock://primary", connector.clone()))
}

#[tokio::test]
async fn connect_failure_is_reported_and_leaves_connection_closed() {
    let connector = MockConnector::new().fail_on("connect");
    let conn = mock_connection(&connector);

    let err = conn.start().await.unwrap_err();
    match err {
        DocsyncError::Connection { uri, .. } => assert_eq!(uri, "mock://primary"),
        other => panic!("expected connection error, got {other:?}"),
    }
    assert_eq!(conn.state(), ConnectionState::Closed);
    assert_eq!(connector.count("close"), 0);

    // A later start may succeed once the driver recovers.
    connector.recover("connect");
    conn.start().await.unwrap();
    assert!(conn.is_open());
    conn.stop().await.unwrap();
}

#[tokio::test]
async fn double_stop_closes_client_once() {
    let connector = MockConnector::new();
    let conn = mock_connection(&connector);
    conn.start().await.unwrap();

    conn.stop().await.unwrap();
    conn.stop().await.unwrap();

    assert_eq!(connector.count("close"), 1);
    assert_eq!(conn.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn stop_before_start_is_a_no_op() {
    let connector = MockConnector::new();
    let conn = mock_connection(&connector);
    conn.stop().await.unwrap();
    assert!(connector.calls().is_empty());
}

#[tokio::test]
async fn commands_after_stop_are_misuse() {
    let connector = MockConnector::new();
    let conn = mock_connection(&connector);
    conn.start().await.unwrap();
    let coll = conn.collection("db", "coll");
    conn.stop().await.unwrap();

    let err = coll.delete_all().await.unwrap_err();
    assert!(matches!(err, DocsyncError::ProtocolMisuse(_)));
    assert_eq!(connector.count("delete_many"), 0);
}

#[tokio::test]
async fn failing_command_keeps_connection_usable() {
    let connector = MockConnector::new().fail_on("delete_many");
    let conn = mock_connection(&connector);
    conn.start().await.unwrap();
    let coll = conn.collection("db", "coll");

    let err = coll.delete_all().await.unwrap_err();
    assert!(err.is_command());
    assert!(err.to_string().contains("injected failure"));

    let ids = coll
        .insert_many(vec![doc(json!({"_id": 1, "v": "a"}))])
        .await
        .unwrap();
    assert_eq!(ids, vec![1.into()]);
    assert!(conn.is_open());
    conn.stop().await.unwrap();
}

#[tokio::test]
async fn commands_run_in_submission_order() {
    let connector = MockConnector::new().with_latency("delete_many", Duration::from_millis(30));
    let conn = mock_connection(&connector);
    conn.start().await.unwrap();
    let coll = conn.collection("db", "coll");

    let deleted = coll.delete_many(Filter::IdIn(vec![1.into()]));
    let inserted = coll.insert_many(vec![doc(json!({"_id": 1}))]);
    let (deleted, inserted) = tokio::join!(deleted, inserted);
    deleted.unwrap();
    inserted.unwrap();

    assert_eq!(
        connector.operations(),
        vec!["connect", "delete_many", "insert_many"]
    );
    conn.stop().await.unwrap();
}

#[tokio::test]
async fn driver_calls_run_on_the_worker_thread() {
    let connector = MockConnector::new();
    let conn = Arc::new(Connection::new("mock://", connector.clone()).with_name("orders"));
    conn.start().await.unwrap();
    conn.collection("db", "coll").delete_all().await.unwrap();
    conn.stop().await.unwrap();

    let threads = connector.worker_threads();
    assert_eq!(threads.len(), 3);
    for name in threads {
        assert_eq!(name.as_deref(), Some("docsync-orders"));
    }
}

#[tokio::test]
async fn command_node_forwards_outcomes() {
    let connector = MockConnector::new();
    let mut conn = Connection::new("mock://primary", connector.clone());
    conn.start().await.unwrap();
    let mut emitter = RecordingEmitter::new();
    let target = CollectionRef::new("db", "coll");

    let insert = Command::new(
        target.clone(),
        Operation::InsertMany {
            documents: vec![doc(json!({"_id": "a"})), doc(json!({"_id": "b"}))],
        },
    );
    conn.call(insert, &mut emitter).await.unwrap();
    let delete = Command::new(
        target.clone(),
        Operation::DeleteMany {
            filter: Filter::IdIn(vec!["a".into()]),
        },
    );
    conn.call(delete, &mut emitter).await.unwrap();

    assert_eq!(
        emitter.sent(),
        &[
            (
                Item::Outcome(CommandOutcome::Inserted {
                    ids: vec!["a".into(), "b".into()]
                }),
                "connection".to_string()
            ),
            (
                Item::Outcome(CommandOutcome::Deleted { count: 1 }),
                "connection".to_string()
            ),
        ]
    );
    assert_eq!(connector.documents(&target), vec![doc(json!({"_id": "b"}))]);
    conn.stop().await.unwrap();
}

#[tokio::test]
async fn failed_command_item_is_not_forwarded() {
    let connector = MockConnector::new().fail_on("insert_many");
    let mut conn = Connection::new("mock://primary", connector.clone());
    conn.start().await.unwrap();
    let mut emitter = RecordingEmitter::new();

    let insert = Command::new(
        CollectionRef::new("db", "coll"),
        Operation::InsertMany {
            documents: vec![doc(json!({"_id": 1}))],
        },
    );
    assert!(conn.call(insert, &mut emitter).await.is_err());
    assert_eq!(emitter.sent_count(), 0);
    conn.stop().await.unwrap();
}

#[tokio::test]
async fn command_timeout_applies_to_slow_calls() {
    let connector = MockConnector::new().with_latency("find", Duration::from_millis(300));
    let conn = Arc::new(
        Connection::new("mock://", connector.clone())
            .with_command_timeout(Some(Duration::from_millis(50))),
    );
    conn.start().await.unwrap();

    let err = conn
        .collection("db", "coll")
        .find(Filter::All)
        .await
        .unwrap_err();
    assert!(matches!(err, DocsyncError::Timeout { .. }));

    // The timed-out call still runs to completion before the close job.
    conn.stop().await.unwrap();
    assert_eq!(connector.operations(), vec!["connect", "find", "close"]);
}

#[tokio::test]
async fn sqlite_file_persists_across_connections() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("docs.db");
    let config = ConnectionConfig {
        uri: format!("sqlite://{}", path.display()),
        command_timeout_secs: None,
    };

    let first = Arc::new(Connection::sqlite(&config));
    first.start().await.unwrap();
    first
        .collection("shop", "orders")
        .insert_many(vec![
            doc(json!({"_id": 1, "total": 10})),
            doc(json!({"_id": "k", "total": 20})),
        ])
        .await
        .unwrap();
    first.stop().await.unwrap();

    let second = Arc::new(Connection::sqlite(&config));
    second.start().await.unwrap();
    let orders = second.collection("shop", "orders");
    let found = orders.find(Filter::All).await.unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0]["total"], json!(10));

    assert_eq!(orders.delete_many(Filter::IdIn(vec![1.into()])).await.unwrap(), 1);
    let left = orders.find(Filter::All).await.unwrap();
    assert_eq!(left, vec![doc(json!({"_id": "k", "total": 20}))]);
    second.stop().await.unwrap();
}

#[tokio::test]
async fn unsupported_scheme_fails_start() {
    let config = ConnectionConfig {
        uri: "mongodb://localhost:27017".into(),
        command_timeout_secs: None,
    };
    let conn = Connection::sqlite(&config);
    let err = conn.start().await.unwrap_err();
    assert!(matches!(err, DocsyncError::Connection { .. }));
    assert!(err.to_string().contains("unsupported connection scheme"));
}

#[test]
fn stop_works_after_attach_to_another_runtime_and_detach() {
    let home = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let caller = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    let connector = MockConnector::new();
    let conn = mock_connection(&connector);

    conn.attach(home.handle().clone());
    assert!(conn.is_attached());
    caller.block_on(async {
        conn.start().await.unwrap();
        conn.detach();
        assert!(!conn.is_attached());
        assert!(conn.is_open());
        conn.stop().await.unwrap();
    });
    assert_eq!(conn.state(), ConnectionState::Closed);

    // Detached: the worker is joined on the caller's runtime.
    caller.block_on(async {
        conn.start().await.unwrap();
        conn.stop().await.unwrap();
    });
    assert_eq!(connector.count("close"), 2);
}
