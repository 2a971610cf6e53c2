//! Atomic write batches and the change records a commit produces.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

use super::document::{Document, DocumentPath};
use super::error::{ErrorContext, RepositoryError, RepositoryResult};

/// Value written to a single field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Literal JSON value.
    Value(Value),
    /// Add to the stored number; a missing or non-numeric field counts as zero.
    Increment(i64),
    /// The commit time of the batch.
    ServerTimestamp,
}

/// Field writes for one `set` or `update` operation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fields(BTreeMap<String, FieldValue>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every top-level field of a serializable object.
    pub fn from_serializable<T: Serialize>(value: &T) -> RepositoryResult<Self> {
        match serde_json::to_value(value) {
            Ok(Value::Object(map)) => Ok(Self(
                map.into_iter()
                    .map(|(k, v)| (k, FieldValue::Value(v)))
                    .collect(),
            )),
            Ok(_) => Err(RepositoryError::validation(
                "document data must serialize to a JSON object",
            )),
            Err(e) => Err(RepositoryError::internal(format!(
                "Failed to encode document: {}",
                e
            ))),
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(field.into(), FieldValue::Value(value.into()));
        self
    }

    /// `set` when `value` is present, otherwise unchanged.
    pub fn set_opt<V: Into<Value>>(self, field: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.set(field, value),
            None => self,
        }
    }

    pub fn increment(mut self, field: impl Into<String>, by: i64) -> Self {
        self.0.insert(field.into(), FieldValue::Increment(by));
        self
    }

    pub fn server_timestamp(mut self, field: impl Into<String>) -> Self {
        self.0.insert(field.into(), FieldValue::ServerTimestamp);
        self
    }

    pub fn insert(&mut self, field: impl Into<String>, value: FieldValue) {
        self.0.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.0.get(field)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or fully replace a document.
    Set { path: DocumentPath, fields: Fields },
    /// Merge fields into an existing document; fails if it does not exist.
    Update { path: DocumentPath, fields: Fields },
    /// Remove a document; absent documents are ignored.
    Delete { path: DocumentPath },
}

impl WriteOp {
    pub fn path(&self) -> &DocumentPath {
        match self {
            WriteOp::Set { path, .. } | WriteOp::Update { path, .. } | WriteOp::Delete { path } => {
                path
            }
        }
    }
}

/// Ordered list of writes committed all-or-nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocumentPath, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Set { path, fields });
        self
    }

    pub fn update(&mut self, path: DocumentPath, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Update { path, fields });
        self
    }

    pub fn delete(&mut self, path: DocumentPath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<WriteOp> {
        self.ops
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Snapshots of one document around a commit.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentChange {
    pub path: DocumentPath,
    pub before: Option<Document>,
    pub after: Option<Document>,
}

impl DocumentChange {
    pub fn kind(&self) -> ChangeKind {
        match (&self.before, &self.after) {
            (None, _) => ChangeKind::Created,
            (Some(_), Some(_)) => ChangeKind::Updated,
            (Some(_), None) => ChangeKind::Deleted,
        }
    }
}

/// Render a commit time the way `ServerTimestamp` fields store it.
pub fn timestamp_value(now: DateTime<Utc>) -> Value {
    Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true))
}

fn increment_value(current: Option<&Value>, by: i64) -> Value {
    match current {
        Some(Value::Number(n)) => match n.as_i64() {
            Some(i) => Value::from(i.saturating_add(by)),
            None => Value::from(n.as_f64().unwrap_or(0.0) + by as f64),
        },
        _ => Value::from(by),
    }
}

fn write_fields(target: &mut Map<String, Value>, fields: &Fields, now: DateTime<Utc>) {
    for (name, value) in fields.iter() {
        let resolved = match value {
            FieldValue::Value(v) => v.clone(),
            FieldValue::Increment(by) => increment_value(target.get(name), *by),
            FieldValue::ServerTimestamp => timestamp_value(now),
        };
        target.insert(name.clone(), resolved);
    }
}

/// Resolve a batch against current state without writing anything.
///
/// `load` returns the stored data of a document (or `None`). Multiple operations
/// on the same document apply in order. The result holds one change per touched
/// document in first-touch order; deletes of absent documents are dropped.
pub(crate) fn resolve_batch<F>(
    ops: &[WriteOp],
    now: DateTime<Utc>,
    mut load: F,
) -> RepositoryResult<Vec<DocumentChange>>
where
    F: FnMut(&DocumentPath) -> RepositoryResult<Option<Map<String, Value>>>,
{
    let mut order: Vec<DocumentPath> = Vec::new();
    let mut before: HashMap<DocumentPath, Option<Map<String, Value>>> = HashMap::new();
    let mut working: HashMap<DocumentPath, Option<Map<String, Value>>> = HashMap::new();

    for op in ops {
        let path = op.path();
        path.validate()?;
        if !working.contains_key(path) {
            let current = load(path)?;
            order.push(path.clone());
            before.insert(path.clone(), current.clone());
            working.insert(path.clone(), current);
        }
        let slot = working.get_mut(path).ok_or_else(|| {
            RepositoryError::internal("working copy missing for resolved path")
        })?;

        match op {
            WriteOp::Set { fields, .. } => {
                let mut data = Map::new();
                write_fields(&mut data, fields, now);
                *slot = Some(data);
            }
            WriteOp::Update { fields, .. } => match slot {
                Some(data) => write_fields(data, fields, now),
                None => {
                    return Err(RepositoryError::not_found_with_context(
                        format!("No document to update: {}", path),
                        ErrorContext::new("commit")
                            .with_entity("document")
                            .with_entity_id(path),
                    ))
                }
            },
            WriteOp::Delete { .. } => *slot = None,
        }
    }

    let changes = order
        .into_iter()
        .filter_map(|path| {
            let prior = before.remove(&path).flatten();
            let next = working.remove(&path).flatten();
            if prior.is_none() && next.is_none() {
                return None;
            }
            Some(DocumentChange {
                before: prior.map(|d| Document::new(path.clone(), d)),
                after: next.map(|d| Document::new(path.clone(), d)),
                path,
            })
        })
        .collect();
    Ok(changes)
}
