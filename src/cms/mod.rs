//! Access to the CMS document store.
//!
//! The site reads documents and the preview editor patches them through the
//! [`DocumentStore`] trait. Two backends exist:
//!
//! - `sanity` - the hosted CMS over its HTTP API
//! - `local` - a sled database, used for offline development and tests

use crate::error::RemoteError;
use crate::models::SetOperation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub mod local;
pub mod sanity;

pub use local::LocalStore;
pub use sanity::SanityClient;

// ============================================================================
// Store Interface
// ============================================================================

/// Result of a committed mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitReceipt {
    pub transaction_id: String,
    pub document_ids: Vec<String>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>, RemoteError>;

    async fn get_document(&self, id: &str) -> Result<Option<Value>, RemoteError>;

    /// Apply all `sets` to document `id` in a single commit.
    async fn patch(&self, id: &str, sets: &[SetOperation]) -> Result<CommitReceipt, RemoteError>;

    /// Create a document. It must carry `_id` and `_type`.
    async fn create(&self, document: Value) -> Result<CommitReceipt, RemoteError>;

    async fn delete(&self, id: &str) -> Result<CommitReceipt, RemoteError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

// ============================================================================
// Queries
// ============================================================================

/// All documents of one type, optionally filtered on one field.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentQuery {
    pub doc_type: String,
    pub filter: Option<(String, Value)>,
    pub order_by: Option<String>,
}

impl DocumentQuery {
    pub fn of_type(doc_type: &str) -> Self {
        Self {
            doc_type: doc_type.to_string(),
            filter: None,
            order_by: None,
        }
    }

    pub fn where_eq(mut self, path: &str, value: impl Into<Value>) -> Self {
        self.filter = Some((path.to_string(), value.into()));
        self
    }

    pub fn order_by(mut self, path: &str) -> Self {
        self.order_by = Some(path.to_string());
        self
    }

    /// GROQ text; values are passed separately as `$type` and `$value`.
    pub fn to_groq(&self) -> String {
        let mut groq = String::from("*[_type == $type");
        if let Some((path, _)) = &self.filter {
            groq.push_str(&format!(" && {} == $value", path));
        }
        groq.push(']');
        if let Some(order) = &self.order_by {
            groq.push_str(&format!(" | order({} asc)", order));
        }
        groq
    }

    pub fn matches(&self, doc: &Value) -> bool {
        if doc.get("_type").and_then(Value::as_str) != Some(self.doc_type.as_str()) {
            return false;
        }
        match &self.filter {
            Some((path, expected)) => get_path(doc, path).ok().flatten() == Some(expected),
            None => true,
        }
    }
}

// ============================================================================
// Dotted Paths
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Split `a.b[2].c` into key and index segments.
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, RemoteError> {
    if !crate::models::is_valid_path(path) {
        return Err(RemoteError::MalformedPath(path.to_string()));
    }
    let mut segments = Vec::new();
    for part in path.split('.') {
        let mut pieces = part.split('[');
        let key = pieces.next().unwrap_or_default();
        segments.push(PathSegment::Key(key.to_string()));
        for idx in pieces {
            let n = idx
                .trim_end_matches(']')
                .parse()
                .map_err(|_| RemoteError::MalformedPath(path.to_string()))?;
            segments.push(PathSegment::Index(n));
        }
    }
    Ok(segments)
}

pub fn get_path<'a>(doc: &'a Value, path: &str) -> Result<Option<&'a Value>, RemoteError> {
    let mut current = doc;
    for seg in parse_path(path)? {
        let next = match seg {
            PathSegment::Key(k) => current.get(&k),
            PathSegment::Index(i) => current.get(i),
        };
        match next {
            Some(v) => current = v,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Set `path` inside `doc`, creating missing objects along the way.
///
/// Array indices must already exist; a key segment on a non-object or an
/// index on a non-array is a malformed path.
pub fn set_path(doc: &mut Value, path: &str, value: Value) -> Result<(), RemoteError> {
    let segments = parse_path(path)?;
    let malformed = || RemoteError::MalformedPath(path.to_string());
    let mut current = doc;
    for (i, seg) in segments.iter().enumerate() {
        let last = i + 1 == segments.len();
        current = match seg {
            PathSegment::Key(k) => {
                if current.is_null() {
                    *current = Value::Object(Map::new());
                }
                let obj = current.as_object_mut().ok_or_else(malformed)?;
                if last {
                    obj.insert(k.clone(), value);
                    return Ok(());
                }
                obj.entry(k.clone()).or_insert(Value::Null)
            }
            PathSegment::Index(n) => {
                let arr = current.as_array_mut().ok_or_else(malformed)?;
                let slot = arr.get_mut(*n).ok_or_else(malformed)?;
                if last {
                    *slot = value;
                    return Ok(());
                }
                slot
            }
        };
    }
    Err(malformed())
}
