// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed document client.
//!
//! Documents live in one `documents` table keyed by
//! `(database, collection, id)`, where `id` is the JSON encoding of `_id`
//! (so `1` and `"1"` stay distinct) and `body` is the full JSON document.
//! Every call blocks; the client is only used from a connection's worker.

use rusqlite::{Connection as SqliteConnection, params};
use serde_json::Value;
use tracing::debug;

use docsync_core::types::ID_FIELD;
use docsync_core::{
    BoxError, CollectionRef, Connector, Document, DocumentClient, DocumentId, Filter,
};

/// URI prefix for file databases: `sqlite://<path>`.
pub const FILE_SCHEME: &str = "sqlite://";

/// URI for a private in-memory database.
pub const MEMORY_URI: &str = "sqlite::memory:";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS documents (
    database   TEXT NOT NULL,
    collection TEXT NOT NULL,
    id         TEXT NOT NULL,
    body       TEXT NOT NULL,
    PRIMARY KEY (database, collection, id)
);";

/// Opens [`SqliteClient`]s from `sqlite://` or `sqlite::memory:` URIs.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteConnector;

impl Connector for SqliteConnector {
    fn connect(&self, uri: &str) -> Result<Box<dyn DocumentClient>, BoxError> {
        Ok(Box::new(SqliteClient::open(uri)?))
    }
}

/// A blocking document client over one SQLite connection.
pub struct SqliteClient {
    conn: Option<SqliteConnection>,
}

impl SqliteClient {
    /// Open the database named by `uri` and ensure the schema exists.
    pub fn open(uri: &str) -> Result<Self, BoxError> {
        let conn = if uri == MEMORY_URI {
            SqliteConnection::open_in_memory()?
        } else if let Some(path) = uri.strip_prefix(FILE_SCHEME) {
            if path.is_empty() {
                return Err(format!("no database path in `{uri}`").into());
            }
            let conn = SqliteConnection::open(path)?;
            conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            conn
        } else {
            return Err(format!("unsupported connection scheme in `{uri}`").into());
        };

        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(SCHEMA)?;
        debug!(uri, "sqlite document store opened");
        Ok(Self { conn: Some(conn) })
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection, BoxError> {
        self.conn
            .as_mut()
            .ok_or_else(|| BoxError::from("sqlite client is closed"))
    }
}

fn id_key(id: &DocumentId) -> Result<String, BoxError> {
    Ok(serde_json::to_string(&id.to_value())?)
}

impl DocumentClient for SqliteClient {
    fn delete_many(&mut self, target: &CollectionRef, filter: &Filter) -> Result<u64, BoxError> {
        let tx = self.conn()?.transaction()?;
        let deleted = match filter {
            Filter::All => tx.execute(
                "DELETE FROM documents WHERE database = ?1 AND collection = ?2",
                params![target.database, target.collection],
            )?,
            Filter::IdIn(ids) => {
                let mut total = 0;
                {
                    let mut stmt = tx.prepare(
                        "DELETE FROM documents WHERE database = ?1 AND collection = ?2 AND id = ?3",
                    )?;
                    for id in ids {
                        total += stmt.execute(params![
                            target.database,
                            target.collection,
                            id_key(id)?
                        ])?;
                    }
                }
                total
            }
        };
        tx.commit()?;
        Ok(deleted as u64)
    }

    fn insert_many(
        &mut self,
        target: &CollectionRef,
        documents: &[Document],
    ) -> Result<Vec<DocumentId>, BoxError> {
        let tx = self.conn()?.transaction()?;
        let mut ids = Vec::with_capacity(documents.len());
        {
            let mut stmt = tx.prepare(
                "INSERT INTO documents (database, collection, id, body) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for doc in documents {
                let id = doc
                    .get(ID_FIELD)
                    .ok_or_else(|| BoxError::from("document has no `_id` field"))
                    .and_then(|v| DocumentId::from_value(v).map_err(BoxError::from))?;
                let body = serde_json::to_string(doc)?;
                stmt.execute(params![target.database, target.collection, id_key(&id)?, body])?;
                ids.push(id);
            }
        }
        // Any failure above drops `tx`, rolling back the whole batch.
        tx.commit()?;
        Ok(ids)
    }

    fn find(&mut self, target: &CollectionRef, filter: &Filter) -> Result<Vec<Document>, BoxError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, body FROM documents WHERE database = ?1 AND collection = ?2 ORDER BY rowid",
        )?;
        let wanted: Option<Vec<String>> = match filter {
            Filter::All => None,
            Filter::IdIn(ids) => Some(ids.iter().map(id_key).collect::<Result<_, _>>()?),
        };
        let rows = stmt.query_map(params![target.database, target.collection], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut docs = Vec::new();
        for row in rows {
            let (id, body) = row?;
            if wanted.as_ref().is_some_and(|w| !w.contains(&id)) {
                continue;
            }
            match serde_json::from_str::<Value>(&body)? {
                Value::Object(doc) => docs.push(doc),
                other => return Err(format!("stored document `{id}` is not an object: {other}").into()),
            }
        }
        Ok(docs)
    }

    fn close(&mut self) -> Result<(), BoxError> {
        if let Some(conn) = self.conn.take() {
            conn.close().map_err(|(_, e)| e)?;
            debug!("sqlite document store closed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    fn target() -> CollectionRef {
        CollectionRef::new("db", "items")
    }

    #[test]
    fn insert_find_delete_roundtrip() {
        let mut client = SqliteClient::open(MEMORY_URI).unwrap();
        let ids = client
            .insert_many(
                &target(),
                &[doc(json!({"_id": 1, "a": 1})), doc(json!({"_id": "1", "a": 2}))],
            )
            .unwrap();
        assert_eq!(ids, vec![DocumentId::Int(1), DocumentId::Str("1".into())]);

        let deleted = client
            .delete_many(&target(), &Filter::IdIn(vec![DocumentId::Int(1)]))
            .unwrap();
        assert_eq!(deleted, 1);

        let left = client.find(&target(), &Filter::All).unwrap();
        assert_eq!(left, vec![doc(json!({"_id": "1", "a": 2}))]);
    }

    #[test]
    fn duplicate_id_rolls_back_batch() {
        let mut client = SqliteClient::open(MEMORY_URI).unwrap();
        client
            .insert_many(&target(), &[doc(json!({"_id": 5}))])
            .unwrap();
        let result = client.insert_many(
            &target(),
            &[doc(json!({"_id": 6})), doc(json!({"_id": 5}))],
        );
        assert!(result.is_err());
        assert_eq!(client.find(&target(), &Filter::All).unwrap().len(), 1);
    }

    #[test]
    fn collections_are_isolated() {
        let mut client = SqliteClient::open(MEMORY_URI).unwrap();
        let other = CollectionRef::new("db", "other");
        client.insert_many(&target(), &[doc(json!({"_id": 1}))]).unwrap();
        client.insert_many(&other, &[doc(json!({"_id": 1}))]).unwrap();

        assert_eq!(client.delete_many(&target(), &Filter::All).unwrap(), 1);
        assert_eq!(client.find(&other, &Filter::All).unwrap().len(), 1);
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        let err = SqliteClient::open("mongodb://localhost:27017/").err().unwrap();
        assert!(err.to_string().contains("unsupported connection scheme"));
    }

    #[test]
    fn closed_client_rejects_calls() {
        let mut client = SqliteClient::open(MEMORY_URI).unwrap();
        client.close().unwrap();
        client.close().unwrap();
        assert!(client.find(&target(), &Filter::All).is_err());
    }
}
