//! sled-backed document store.
//!
//! Stores each document as JSON under its `_id`. Patches are applied with
//! compare-and-swap so two concurrent commits to the same document cannot
//! drop each other's changes.

use super::{set_path, CommitReceipt, DocumentQuery, DocumentStore};
use crate::error::RemoteError;
use crate::models::SetOperation;
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use serde_json::Value;
use sled::Db;
use std::path::Path;

const DOCUMENTS_TREE: &str = "documents";

#[derive(Clone)]
pub struct LocalStore {
    db: Db,
}

impl LocalStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RemoteError> {
        Ok(Self {
            db: sled::open(path)?,
        })
    }

    /// A throwaway database removed when dropped.
    pub fn temporary() -> Result<Self, RemoteError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    fn documents(&self) -> Result<sled::Tree, RemoteError> {
        Ok(self.db.open_tree(DOCUMENTS_TREE)?)
    }

    pub fn is_empty(&self) -> Result<bool, RemoteError> {
        Ok(self.documents()?.is_empty())
    }
}

fn new_revision() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(22)
        .map(char::from)
        .collect()
}

fn stamp(doc: &mut Value, rev: &str) {
    if let Some(obj) = doc.as_object_mut() {
        obj.insert("_rev".into(), Value::String(rev.to_string()));
        obj.insert("_updatedAt".into(), Value::String(Utc::now().to_rfc3339()));
    }
}

#[async_trait]
impl DocumentStore for LocalStore {
    async fn query(&self, query: &DocumentQuery) -> Result<Vec<Value>, RemoteError> {
        let mut docs = Vec::new();
        for entry in self.documents()?.iter() {
            let (_, bytes) = entry?;
            let doc: Value = serde_json::from_slice(&bytes)?;
            if query.matches(&doc) {
                docs.push(doc);
            }
        }
        if let Some(order) = &query.order_by {
            docs.sort_by(|a, b| {
                let key = |d: &Value| {
                    super::get_path(d, order)
                        .ok()
                        .flatten()
                        .map(|v| match v {
                            Value::Number(n) => format!("{:020.6}", n.as_f64().unwrap_or(0.0)),
                            other => other.to_string(),
                        })
                        .unwrap_or_default()
                };
                key(a).cmp(&key(b))
            });
        }
        Ok(docs)
    }

    async fn get_document(&self, id: &str) -> Result<Option<Value>, RemoteError> {
        match self.documents()?.get(id)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn patch(&self, id: &str, sets: &[SetOperation]) -> Result<CommitReceipt, RemoteError> {
        let tree = self.documents()?;
        let rev = new_revision();
        loop {
            let current = tree
                .get(id)?
                .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
            let mut doc: Value = serde_json::from_slice(&current)?;
            for op in sets {
                set_path(&mut doc, &op.path, op.value.clone())?;
            }
            stamp(&mut doc, &rev);
            let bytes = serde_json::to_vec(&doc)?;
            if tree.compare_and_swap(id, Some(current), Some(bytes))?.is_ok() {
                break;
            }
            tracing::debug!(id, "document changed during patch, retrying");
        }
        tracing::debug!(id, sets = sets.len(), "patched local document");
        Ok(CommitReceipt {
            transaction_id: rev,
            document_ids: vec![id.to_string()],
        })
    }

    async fn create(&self, mut document: Value) -> Result<CommitReceipt, RemoteError> {
        let id = match (
            document.get("_id").and_then(Value::as_str),
            document.get("_type").and_then(Value::as_str),
        ) {
            (Some(id), Some(_)) => id.to_string(),
            _ => return Err(RemoteError::MalformedPath("document needs _id and _type".into())),
        };
        let rev = new_revision();
        stamp(&mut document, &rev);
        let bytes = serde_json::to_vec(&document)?;
        let tree = self.documents()?;
        if tree
            .compare_and_swap(id.as_str(), None as Option<&[u8]>, Some(bytes))?
            .is_err()
        {
            return Err(RemoteError::Status {
                status: 409,
                body: format!("document `{}` already exists", id),
            });
        }
        Ok(CommitReceipt {
            transaction_id: rev,
            document_ids: vec![id],
        })
    }

    async fn delete(&self, id: &str) -> Result<CommitReceipt, RemoteError> {
        self.documents()?
            .remove(id)?
            .ok_or_else(|| RemoteError::NotFound(id.to_string()))?;
        Ok(CommitReceipt {
            transaction_id: new_revision(),
            document_ids: vec![id.to_string()],
        })
    }

    fn name(&self) -> &'static str {
        "local"
    }
}
