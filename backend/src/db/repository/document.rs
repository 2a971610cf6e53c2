//! Document and path types.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::error::{ErrorContext, RepositoryError, RepositoryResult};

/// Slash-separated path to a collection (odd number of segments).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectionPath(String);

/// Slash-separated path to a document (even number of segments).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentPath(String);

fn segments_of(path: &str) -> RepositoryResult<Vec<&str>> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(RepositoryError::validation_with_context(
            "path contains an empty segment",
            ErrorContext::new("parse_path").with_entity_id(path),
        ));
    }
    Ok(segments)
}

impl CollectionPath {
    pub fn parse(path: impl Into<String>) -> RepositoryResult<Self> {
        let path = path.into();
        if segments_of(&path)?.len() % 2 != 1 {
            return Err(RepositoryError::validation_with_context(
                "collection path must have an odd number of segments",
                ErrorContext::new("parse_path").with_entity_id(&path),
            ));
        }
        Ok(Self(path))
    }

    /// Wrap a path assembled from known segments without re-validating it.
    pub(crate) fn from_trusted(path: String) -> Self {
        Self(path)
    }

    /// Path of the document `id` inside this collection.
    ///
    /// Ids must not contain `/`; the result fails [`DocumentPath::parse`] otherwise
    /// and stores reject it on commit.
    pub fn doc(&self, id: &str) -> DocumentPath {
        DocumentPath(format!("{}/{}", self.0, id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether `path` names a document directly inside this collection.
    pub fn contains(&self, path: &DocumentPath) -> bool {
        path.0
            .strip_prefix(self.0.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .is_some_and(|id| !id.is_empty() && !id.contains('/'))
    }
}

impl DocumentPath {
    pub fn parse(path: impl Into<String>) -> RepositoryResult<Self> {
        let path = path.into();
        if segments_of(&path)?.len() % 2 != 0 {
            return Err(RepositoryError::validation_with_context(
                "document path must have an even number of segments",
                ErrorContext::new("parse_path").with_entity_id(&path),
            ));
        }
        Ok(Self(path))
    }

    /// Last path segment.
    pub fn id(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or_default()
    }

    /// Collection holding this document.
    pub fn parent(&self) -> CollectionPath {
        match self.0.rsplit_once('/') {
            Some((parent, _)) => CollectionPath(parent.to_string()),
            None => CollectionPath(String::new()),
        }
    }

    pub fn segments(&self) -> Vec<&str> {
        self.0.split('/').collect()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Re-validate a path built through [`CollectionPath::doc`].
    pub fn validate(&self) -> RepositoryResult<()> {
        Self::parse(self.0.clone()).map(|_| ())
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored document: its path and its field map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub path: DocumentPath,
    pub data: Map<String, Value>,
}

impl Document {
    pub fn new(path: DocumentPath, data: Map<String, Value>) -> Self {
        Self { path, data }
    }

    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Deserialize the field map into a typed document.
    pub fn decode<T: DeserializeOwned>(&self) -> RepositoryResult<T> {
        serde_json::from_value(Value::Object(self.data.clone())).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Failed to decode document: {}", e),
                ErrorContext::new("decode")
                    .with_entity("document")
                    .with_entity_id(&self.path),
            )
        })
    }
}
