// SPDX-FileCopyrightText: 2026 Docsync Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change-set, command, and outcome types passed between pipeline nodes.

use std::collections::HashMap;
use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value, json};
use strum::Display;

use crate::error::DocsyncError;

/// A schemaless document. The `_id` field is set by the writer.
pub type Document = Map<String, Value>;

/// Name of the identifier field on every stored document.
pub const ID_FIELD: &str = "_id";

/// Identifier of a tracked document.
///
/// Change feeds emit either integer or string identifiers; both are kept
/// verbatim so the stored `_id` matches what upstream produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentId {
    Int(i64),
    Str(String),
}

impl DocumentId {
    /// Parse an identifier from a JSON value. Only integers and strings are accepted.
    pub fn from_value(value: &Value) -> Result<Self, DocsyncError> {
        match value {
            Value::Number(n) => n.as_i64().map(DocumentId::Int).ok_or_else(|| {
                DocsyncError::misuse(format!("document id `{n}` is not an integer"))
            }),
            Value::String(s) => Ok(DocumentId::Str(s.clone())),
            other => Err(DocsyncError::misuse(format!(
                "document id must be an integer or string, got `{other}`"
            ))),
        }
    }

    /// The JSON form stored in the `_id` field.
    pub fn to_value(&self) -> Value {
        match self {
            DocumentId::Int(n) => Value::from(*n),
            DocumentId::Str(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentId::Int(n) => write!(f, "{n}"),
            DocumentId::Str(s) => f.write_str(s),
        }
    }
}

impl From<i64> for DocumentId {
    fn from(value: i64) -> Self {
        DocumentId::Int(value)
    }
}

impl From<&str> for DocumentId {
    fn from(value: &str) -> Self {
        DocumentId::Str(value.to_string())
    }
}

/// One increment of a tracked collection's state.
///
/// Every identifier in `inserts` must have an entry in `data`; identifiers
/// in `deletes` need not.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChangeSet {
    pub inserts: Vec<DocumentId>,
    pub deletes: Vec<DocumentId>,
    pub data: HashMap<DocumentId, Document>,
}

impl ChangeSet {
    /// Returns true when the change-set carries neither inserts nor deletes.
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.deletes.is_empty()
    }

    /// Check that every inserted identifier has a document in `data`.
    pub fn validate(&self) -> Result<(), DocsyncError> {
        let missing: Vec<String> = self
            .inserts
            .iter()
            .filter(|id| !self.data.contains_key(id))
            .map(ToString::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(DocsyncError::misuse(format!(
                "inserted ids without data: {}",
                missing.join(", ")
            )))
        }
    }

    /// Build the documents to insert, in `inserts` order, each tagged with its `_id`.
    ///
    /// The `_id` always reflects the identifier from `inserts`, overriding any
    /// `_id` already present in the data.
    pub fn documents(&self) -> Result<Vec<Document>, DocsyncError> {
        self.inserts
            .iter()
            .map(|id| {
                let mut doc = self.data.get(id).cloned().ok_or_else(|| {
                    DocsyncError::misuse(format!("inserted id `{id}` has no data"))
                })?;
                doc.insert(ID_FIELD.to_string(), id.to_value());
                Ok(doc)
            })
            .collect()
    }

    /// Parse and validate a change-set arriving as a loosely typed JSON item.
    ///
    /// The item must be an object with `inserts` and `deletes` arrays and a
    /// `data` object. JSON object keys are always strings, so a `data` key is
    /// matched to an id from `inserts`/`deletes` by its display form; an item
    /// listing both `1` and `"1"` is rejected as ambiguous.
    pub fn from_value(item: &Value) -> Result<Self, DocsyncError> {
        let obj = item
            .as_object()
            .ok_or_else(|| DocsyncError::misuse("change-set item must be a JSON object"))?;

        let ids = |field: &str| -> Result<Vec<DocumentId>, DocsyncError> {
            obj.get(field)
                .and_then(Value::as_array)
                .ok_or_else(|| {
                    DocsyncError::misuse(format!("change-set item requires a `{field}` array"))
                })?
                .iter()
                .map(DocumentId::from_value)
                .collect()
        };
        let inserts = ids("inserts")?;
        let deletes = ids("deletes")?;

        let mut by_key: HashMap<String, &DocumentId> = HashMap::new();
        for id in inserts.iter().chain(deletes.iter()) {
            if let Some(other) = by_key.insert(id.to_string(), id) {
                if other != id {
                    return Err(DocsyncError::misuse(format!(
                        "ids `{other:?}` and `{id:?}` share the data key `{id}`"
                    )));
                }
            }
        }

        let raw_data = obj
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| DocsyncError::misuse("change-set item requires a `data` object"))?;

        let mut data = HashMap::with_capacity(raw_data.len());
        for (key, value) in raw_data {
            let doc = value.as_object().cloned().ok_or_else(|| {
                DocsyncError::misuse(format!("data for id `{key}` must be a JSON object"))
            })?;
            let id = by_key
                .get(key)
                .map(|id| (*id).clone())
                .unwrap_or_else(|| DocumentId::Str(key.clone()));
            data.insert(id, doc);
        }

        let changes = ChangeSet {
            inserts,
            deletes,
            data,
        };
        changes.validate()?;
        Ok(changes)
    }
}

/// A `(database, collection)` pair that commands are addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionRef {
    pub database: String,
    pub collection: String,
}

impl CollectionRef {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Document selector for delete commands.
///
/// Serialized in the query-document form drivers expect: `{}` for every
/// document, `{"_id": {"$in": [...]}}` for an id set.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    All,
    IdIn(Vec<DocumentId>),
}

impl Filter {
    pub fn to_value(&self) -> Value {
        match self {
            Filter::All => json!({}),
            Filter::IdIn(ids) => {
                let ids: Vec<Value> = ids.iter().map(DocumentId::to_value).collect();
                json!({ ID_FIELD: { "$in": ids } })
            }
        }
    }

    pub fn from_value(value: &Value) -> Result<Self, DocsyncError> {
        let obj = value
            .as_object()
            .ok_or_else(|| DocsyncError::misuse("filter must be a JSON object"))?;
        if obj.is_empty() {
            return Ok(Filter::All);
        }
        let ids = obj
            .get(ID_FIELD)
            .and_then(|v| v.get("$in"))
            .and_then(Value::as_array)
            .filter(|_| obj.len() == 1)
            .ok_or_else(|| {
                DocsyncError::misuse(format!("unsupported filter `{value}`"))
            })?;
        ids.iter()
            .map(DocumentId::from_value)
            .collect::<Result<_, _>>()
            .map(Filter::IdIn)
    }
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Filter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Filter::from_value(&value).map_err(D::Error::custom)
    }
}

/// A database call, independent of any driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "args", rename_all = "snake_case")]
pub enum Operation {
    DeleteMany { filter: Filter },
    InsertMany { documents: Vec<Document> },
}

impl Operation {
    /// Driver-facing operation name.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::DeleteMany { .. } => "delete_many",
            Operation::InsertMany { .. } => "insert_many",
        }
    }
}

/// A serializable description of one database call against one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub target: CollectionRef,
    #[serde(flatten)]
    pub operation: Operation,
}

impl Command {
    pub fn new(target: CollectionRef, operation: Operation) -> Self {
        Self { target, operation }
    }
}

/// Result of executing a [`Command`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandOutcome {
    Deleted { count: u64 },
    Inserted { ids: Vec<DocumentId> },
}

/// A value travelling between pipeline nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Item {
    ChangeSet(ChangeSet),
    Command(Command),
    Outcome(CommandOutcome),
}

/// Health status reported by component health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Component is fully operational.
    Healthy,
    /// Component is operational but experiencing issues.
    Degraded(String),
    /// Component is not operational.
    Unhealthy(String),
}

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum ConnectionState {
    Closed,
    Starting,
    Open,
    Stopping,
}
