//! Writes editor changes back to the CMS.

use crate::auth::SessionFlag;
use crate::cms::{CommitReceipt, DocumentStore};
use crate::error::{Error, Result};
use crate::models::{FieldRef, FieldType, PatchPayload, SetOperation};
use crate::payload::{to_set_operations, validate};
use crate::schema;
use std::sync::Arc;

#[derive(Clone)]
pub struct PatchClient {
    store: Arc<dyn DocumentStore>,
}

impl PatchClient {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Validate and shape a payload without sending it.
    ///
    /// `doc_type` is used to look up whether the field is required.
    pub fn prepare(
        &self,
        field: &FieldRef,
        payload: &PatchPayload,
        field_type: FieldType,
        doc_type: Option<&str>,
    ) -> Result<Vec<SetOperation>> {
        let required = doc_type
            .map(|t| schema::is_required(t, &field.field_name()))
            .unwrap_or(false);
        validate(payload, field_type, required)?;
        Ok(to_set_operations(field, payload))
    }

    /// Write `payload` into the referenced field in one commit.
    ///
    /// Nothing is sent unless the session is authenticated and the payload
    /// passes validation. Remote failures are not retried.
    pub async fn save(
        &self,
        session: &impl SessionFlag,
        field: &FieldRef,
        payload: &PatchPayload,
        field_type: FieldType,
        doc_type: Option<&str>,
    ) -> Result<CommitReceipt> {
        if !session.is_authenticated() {
            return Err(Error::Unauthenticated);
        }
        let sets = self.prepare(field, payload, field_type, doc_type)?;
        self.commit(field, &sets).await
    }

    /// Send already prepared set operations.
    pub async fn commit(&self, field: &FieldRef, sets: &[SetOperation]) -> Result<CommitReceipt> {
        match self.store.patch(&field.document_id, sets).await {
            Ok(receipt) => {
                tracing::info!(
                    field = %field,
                    sets = sets.len(),
                    backend = self.store.name(),
                    transaction = %receipt.transaction_id,
                    "field saved"
                );
                Ok(receipt)
            }
            Err(e) => {
                tracing::warn!(field = %field, backend = self.store.name(), error = %e, "save failed");
                Err(e.into())
            }
        }
    }
}
