//! Preview session: the editing flow as seen from one browser tab.
//!
//! Page load checks the `preview` query parameter and annotates editable
//! nodes. The editor authenticates once per session, clicks a node to open
//! the overlay pre-filled with its current value, and saves. A save is split
//! in three steps so an in-flight write never blocks the page:
//!
//! 1. [`PreviewSession::begin_save`] validates, marks the node pending and
//!    disables the save button;
//! 2. [`PreviewSession::execute`] sends the commit;
//! 3. [`PreviewSession::finish_save`] applies the result, unless the overlay
//!    was closed (or reopened) in the meantime, in which case it is dropped.

use crate::auth::{PasswordGate, SessionFlag, AUTH_ERROR_CLEAR_MS};
use crate::classify::{annotate, classify_node, doc_type_of};
use crate::cms::CommitReceipt;
use crate::dom::Document;
use crate::error::{Error, Result};
use crate::models::{FieldRef, FieldType, PatchPayload, SetOperation};
use crate::overlay::{
    parse_submission, show_editor, DismissReason, EditorSeed, FormValues, OverlayHost, SaveState,
};
use crate::patch::PatchClient;
use crate::reconcile;
use crate::theme::{apply_palette, detect_optimal_theme, PaletteId};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Query parameter that switches the editing layer on.
pub const PREVIEW_PARAM: &str = "preview";

pub const WRONG_PASSWORD_MESSAGE: &str = "Incorrect password";

/// Whether a raw query string asks for preview mode: `?preview`,
/// `?preview=true` or `?preview=1`.
pub fn preview_requested(query: Option<&str>) -> bool {
    let Some(query) = query else {
        return false;
    };
    url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .any(|(k, v)| k == PREVIEW_PARAM && matches!(v.as_ref(), "" | "true" | "1"))
}

// ============================================================================
// Login Prompt
// ============================================================================

/// Inline error state of the password prompt.
#[derive(Debug, Default, Clone)]
pub struct LoginPrompt {
    error_shown_at: Option<DateTime<Utc>>,
    failures: u32,
}

impl LoginPrompt {
    pub fn record_failure(&mut self, now: DateTime<Utc>) {
        self.failures += 1;
        self.error_shown_at = Some(now);
    }

    pub fn clear(&mut self) {
        self.error_shown_at = None;
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// The error message, until it auto-clears.
    pub fn visible_error(&self, now: DateTime<Utc>) -> Option<&'static str> {
        let shown = self.error_shown_at?;
        (now - shown < Duration::milliseconds(AUTH_ERROR_CLEAR_MS)).then_some(WRONG_PASSWORD_MESSAGE)
    }
}

// ============================================================================
// Session
// ============================================================================

/// A save that has been validated and is waiting for its commit.
#[derive(Debug, Clone)]
pub struct PendingSave {
    pub ticket: u64,
    pub field: FieldRef,
    pub payload: PatchPayload,
    pub sets: Vec<SetOperation>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Stored, page updated, overlay closed.
    Saved(CommitReceipt),
    /// Write failed; overlay still open with the error and save re-enabled.
    Failed(String),
    /// The overlay was closed before the write finished; result ignored.
    Dropped,
}

pub struct PreviewSession<S: SessionFlag> {
    requested: bool,
    gate: Option<Arc<PasswordGate>>,
    session: S,
    patch: PatchClient,
    overlay: OverlayHost,
    prompt: LoginPrompt,
    next_ticket: u64,
    current_ticket: Option<u64>,
}

impl<S: SessionFlag> PreviewSession<S> {
    pub fn new(query: Option<&str>, gate: Option<Arc<PasswordGate>>, session: S, patch: PatchClient) -> Self {
        Self {
            requested: preview_requested(query),
            gate,
            session,
            patch,
            overlay: OverlayHost::new(),
            prompt: LoginPrompt::default(),
            next_ticket: 1,
            current_ticket: None,
        }
    }

    /// Preview was requested and a password is configured.
    pub fn is_enabled(&self) -> bool {
        self.requested && self.gate.is_some()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn overlay(&self) -> &OverlayHost {
        &self.overlay
    }

    pub fn prompt(&self) -> &LoginPrompt {
        &self.prompt
    }

    /// Annotate editable nodes with their field types. Does nothing when
    /// preview is off.
    pub fn initialize(&self, doc: &mut Document) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        let count = annotate(doc);
        tracing::debug!(count, "annotated editable fields");
        count
    }

    pub fn authenticate(&mut self, attempt: &str, now: DateTime<Utc>) -> bool {
        let Some(gate) = self.gate.as_ref() else {
            return false;
        };
        if gate.check_password(attempt, &mut self.session) {
            self.prompt.clear();
            true
        } else {
            self.prompt.record_failure(now);
            false
        }
    }

    fn require_auth(&self) -> Result<()> {
        if !self.is_enabled() {
            return Err(Error::EditingDisabled);
        }
        if !self.session.is_authenticated() {
            return Err(Error::Unauthenticated);
        }
        Ok(())
    }

    /// Give the hovered field its own palette.
    pub fn hover(&self, doc: &mut Document, token: &str) -> Result<PaletteId> {
        let field = FieldRef::parse(token)?;
        let path = reconcile::locate(doc, &field)?;
        let palette = detect_optimal_theme(doc, &path);
        if let Some(el) = doc.get_mut(&path) {
            apply_palette(el, palette);
        }
        Ok(palette)
    }

    /// Open the editor for the node carrying `token`.
    pub fn open(&mut self, doc: &mut Document, token: &str) -> Result<()> {
        self.require_auth()?;
        let field = FieldRef::parse(token)?;
        let path = reconcile::locate(doc, &field)?;
        let field_type = classify_node(doc, &path).unwrap_or(FieldType::Text);
        let el = doc
            .get(&path)
            .ok_or_else(|| Error::NodeNotFound(token.to_string()))?;
        let seed = EditorSeed::from_element(el, field_type);
        let palette = detect_optimal_theme(doc, &path);
        let form = show_editor(&field, field_type, &seed);
        self.current_ticket = None;
        self.overlay.open(doc, form, palette)
    }

    pub fn dismiss(&mut self, doc: &mut Document, reason: DismissReason) -> bool {
        self.current_ticket = None;
        self.overlay.dismiss(doc, reason)
    }

    pub fn handle_key(&mut self, doc: &mut Document, key: &str) -> bool {
        let closed = self.overlay.handle_key(doc, key);
        if closed {
            self.current_ticket = None;
        }
        closed
    }

    pub fn handle_click(&mut self, doc: &mut Document, action: &str) -> bool {
        let closed = self.overlay.handle_click(doc, action);
        if closed {
            self.current_ticket = None;
        }
        closed
    }

    /// Validate the submitted form and put the field into the pending state.
    ///
    /// Validation errors are shown in the overlay and returned; nothing is
    /// sent.
    pub fn begin_save(&mut self, doc: &mut Document, values: &FormValues) -> Result<PendingSave> {
        self.require_auth()?;
        let form = self.overlay.form().ok_or(Error::NoOpenEditor)?;
        let field = form.field.clone();
        let field_type = form.field_type;
        let path = reconcile::locate(doc, &field)?;
        let doc_type = doc_type_of(doc, &path).map(str::to_string);

        let prepared = parse_submission(field_type, values)
            .map_err(Error::from)
            .and_then(|payload| {
                let sets = self.patch.prepare(&field, &payload, field_type, doc_type.as_deref())?;
                Ok((payload, sets))
            });
        let (payload, sets) = match prepared {
            Ok(p) => p,
            Err(e) => {
                self.overlay
                    .set_save_state(doc, SaveState::Failed(e.user_message()));
                return Err(e);
            }
        };

        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.current_ticket = Some(ticket);
        reconcile::mark_pending(doc, &field)?;
        self.overlay.set_save_state(doc, SaveState::Saving);
        Ok(PendingSave {
            ticket,
            field,
            payload,
            sets,
        })
    }

    /// Send the commit. No retry, no cancellation.
    pub async fn execute(&self, pending: &PendingSave) -> Result<CommitReceipt> {
        if !self.session.is_authenticated() {
            return Err(Error::Unauthenticated);
        }
        self.patch.commit(&pending.field, &pending.sets).await
    }

    /// Act on a finished write.
    pub fn finish_save(
        &mut self,
        doc: &mut Document,
        pending: PendingSave,
        result: Result<CommitReceipt>,
    ) -> SaveOutcome {
        let current = self.current_ticket == Some(pending.ticket)
            && self.overlay.editing() == Some(&pending.field);
        if !current {
            reconcile::rollback(doc, &pending.field);
            tracing::debug!(field = %pending.field, ticket = pending.ticket, "dropping stale save result");
            return SaveOutcome::Dropped;
        }
        self.current_ticket = None;

        match result {
            Ok(receipt) => {
                if let Err(e) = reconcile::commit(doc, &pending.field, &pending.payload) {
                    tracing::warn!(field = %pending.field, error = %e, "saved but could not update page");
                }
                self.overlay.dismiss(doc, DismissReason::Close);
                SaveOutcome::Saved(receipt)
            }
            Err(e) => {
                reconcile::rollback(doc, &pending.field);
                let msg = e.user_message();
                self.overlay.set_save_state(doc, SaveState::Failed(msg.clone()));
                SaveOutcome::Failed(msg)
            }
        }
    }

    /// Validate, write and reconcile in one go.
    pub async fn save(&mut self, doc: &mut Document, values: &FormValues) -> Result<SaveOutcome> {
        let pending = self.begin_save(doc, values)?;
        let result = self.execute(&pending).await;
        Ok(self.finish_save(doc, pending, result))
    }
}


#[cfg(test)]
#[path = "preview_test.rs"]
mod preview_test;
