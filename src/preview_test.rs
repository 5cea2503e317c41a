use super::*;
use crate::auth::MemorySession;
use crate::classify::DOC_TYPE_ATTR;
use crate::cms::{DocumentQuery, DocumentStore, LocalStore};
use crate::dom::Element;
use crate::error::{RemoteError, GENERIC_SAVE_ERROR};
use crate::models::FIELD_REF_ATTR;
use crate::overlay::OVERLAY_ID;
use crate::reconcile::EDIT_STATE_ATTR;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

const PASSWORD: &str = "seaview";

fn gate() -> Arc<PasswordGate> {
    static GATE: OnceLock<Arc<PasswordGate>> = OnceLock::new();
    GATE.get_or_init(|| Arc::new(PasswordGate::new(PASSWORD).unwrap()))
        .clone()
}

/// Store that refuses every write and counts the attempts.
#[derive(Default)]
struct FailingStore {
    writes: AtomicUsize,
}

#[async_trait]
impl DocumentStore for FailingStore {
    async fn query(&self, _query: &DocumentQuery) -> Result<Vec<Value>, RemoteError> {
        Ok(Vec::new())
    }

    async fn get_document(&self, _id: &str) -> Result<Option<Value>, RemoteError> {
        Ok(None)
    }

    async fn patch(&self, _id: &str, _sets: &[SetOperation]) -> Result<CommitReceipt, RemoteError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(RemoteError::Network("connection reset".into()))
    }

    async fn create(&self, _document: Value) -> Result<CommitReceipt, RemoteError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(RemoteError::Network("connection reset".into()))
    }

    async fn delete(&self, _id: &str) -> Result<CommitReceipt, RemoteError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        Err(RemoteError::Network("connection reset".into()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

async fn seeded_store() -> Arc<LocalStore> {
    let store = LocalStore::temporary().unwrap();
    store
        .create(json!({
            "_id": "homePage",
            "_type": "homePage",
            "hero": {"title": "Welcome", "subtitle": "By the sea"}
        }))
        .await
        .unwrap();
    Arc::new(store)
}

fn page() -> Document {
    Document::from_body(
        Element::new("body").with_child(
            Element::new("main")
                .with_attr(DOC_TYPE_ATTR, "homePage")
                .with_attr("style", "background-color: #1a1a40")
                .with_child(
                    Element::new("h1")
                        .with_attr(FIELD_REF_ATTR, "homePage#hero.title")
                        .with_text("Welcome"),
                )
                .with_child(
                    Element::new("p")
                        .with_attr(FIELD_REF_ATTR, "homePage#hero.subtitle")
                        .with_text("By the sea"),
                ),
        ),
    )
}

fn values(pairs: &[(&str, &str)]) -> FormValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn text_of(doc: &Document, token: &str) -> String {
    let path = doc.find_by_attr(FIELD_REF_ATTR, token).unwrap();
    doc.get(&path).unwrap().text_content()
}

fn session(store: Arc<dyn DocumentStore>) -> PreviewSession<MemorySession> {
    PreviewSession::new(
        Some("preview=true"),
        Some(gate()),
        MemorySession::new(),
        PatchClient::new(store),
    )
}

#[tokio::test]
async fn test_edit_headline_end_to_end() {
    let store = seeded_store().await;
    let mut preview = session(store.clone());
    let mut doc = page();

    assert!(preview.is_enabled());
    assert_eq!(preview.initialize(&mut doc), 2);
    assert!(preview.authenticate(PASSWORD, Utc::now()));

    preview.open(&mut doc, "homePage#hero.title").unwrap();
    let form = preview.overlay().form().unwrap();
    assert_eq!(form.field_type, FieldType::Headline);
    assert_eq!(form.fields[0].value, "Welcome");

    let outcome = preview
        .save(&mut doc, &values(&[("value", "Welcome Back")]))
        .await
        .unwrap();
    assert!(matches!(outcome, SaveOutcome::Saved(_)));

    assert_eq!(text_of(&doc, "homePage#hero.title"), "Welcome Back");
    assert!(!preview.overlay().is_open());
    assert!(doc.find_by_id(OVERLAY_ID).is_none());

    let stored = store.get_document("homePage").await.unwrap().unwrap();
    assert_eq!(stored["hero"]["title"], "Welcome Back");
    assert_eq!(stored["hero"]["subtitle"], "By the sea");
}

#[tokio::test]
async fn test_wrong_password_never_writes() {
    let failing = Arc::new(FailingStore::default());
    let mut preview = session(failing.clone());
    let mut doc = page();
    preview.initialize(&mut doc);

    let now = Utc::now();
    for _ in 0..3 {
        assert!(!preview.authenticate("letmein", now));
    }
    assert!(!preview.is_authenticated());
    assert_eq!(preview.prompt().failures(), 3);
    assert_eq!(preview.prompt().visible_error(now), Some(WRONG_PASSWORD_MESSAGE));

    assert!(matches!(
        preview.open(&mut doc, "homePage#hero.title"),
        Err(Error::Unauthenticated)
    ));
    assert!(matches!(
        preview.save(&mut doc, &values(&[("value", "x")])).await,
        Err(Error::Unauthenticated)
    ));
    assert_eq!(failing.writes.load(Ordering::SeqCst), 0);
    assert_eq!(preview.session().marks(), 0);

    // A later correct attempt still works.
    assert!(preview.authenticate(PASSWORD, now));
    assert_eq!(preview.prompt().visible_error(now), None);
}

#[tokio::test]
async fn test_preview_off_leaves_page_alone() {
    let store = seeded_store().await;
    let mut preview = PreviewSession::new(
        Some("preview=false"),
        Some(gate()),
        MemorySession::new(),
        PatchClient::new(store),
    );
    let mut doc = page();
    let before = doc.clone();
    assert_eq!(preview.initialize(&mut doc), 0);
    assert_eq!(doc, before);
    assert!(matches!(
        preview.open(&mut doc, "homePage#hero.title"),
        Err(Error::EditingDisabled)
    ));
}

#[tokio::test]
async fn test_no_password_configured_disables_editing() {
    let store = seeded_store().await;
    let preview = PreviewSession::new(
        Some("preview"),
        None,
        MemorySession::new(),
        PatchClient::new(store),
    );
    assert!(!preview.is_enabled());
}

#[tokio::test]
async fn test_remote_failure_keeps_overlay_open() {
    let failing = Arc::new(FailingStore::default());
    let mut preview = session(failing.clone());
    let mut doc = page();
    preview.initialize(&mut doc);
    assert!(preview.authenticate(PASSWORD, Utc::now()));
    preview.open(&mut doc, "homePage#hero.title").unwrap();

    let outcome = preview
        .save(&mut doc, &values(&[("value", "Welcome Back")]))
        .await
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Failed(GENERIC_SAVE_ERROR.to_string()));
    assert_eq!(failing.writes.load(Ordering::SeqCst), 1);

    assert_eq!(text_of(&doc, "homePage#hero.title"), "Welcome");
    let h1 = doc.find_by_attr(FIELD_REF_ATTR, "homePage#hero.title").unwrap();
    assert_eq!(doc.get(&h1).unwrap().attr(EDIT_STATE_ATTR), None);

    assert!(preview.overlay().is_open());
    assert_eq!(
        preview.overlay().save_state(),
        Some(&SaveState::Failed(GENERIC_SAVE_ERROR.to_string()))
    );
    let save = doc.find(|e| e.attr("class") == Some("preview-save")).unwrap();
    assert!(!doc.get(&save).unwrap().has_attr("disabled"));
}

#[tokio::test]
async fn test_validation_error_sends_nothing() {
    let failing = Arc::new(FailingStore::default());
    let mut preview = session(failing.clone());
    let mut doc = page();
    preview.initialize(&mut doc);
    assert!(preview.authenticate(PASSWORD, Utc::now()));
    preview.open(&mut doc, "homePage#hero.title").unwrap();

    let result = preview.save(&mut doc, &values(&[("value", "   ")])).await;
    assert!(matches!(result, Err(Error::Validation(_))));
    assert_eq!(failing.writes.load(Ordering::SeqCst), 0);
    assert!(matches!(
        preview.overlay().save_state(),
        Some(SaveState::Failed(_))
    ));
}

#[tokio::test]
async fn test_result_after_close_is_dropped() {
    let store = seeded_store().await;
    let mut preview = session(store.clone());
    let mut doc = page();
    preview.initialize(&mut doc);
    assert!(preview.authenticate(PASSWORD, Utc::now()));
    preview.open(&mut doc, "homePage#hero.title").unwrap();

    let pending = preview
        .begin_save(&mut doc, &values(&[("value", "Welcome Back")]))
        .unwrap();
    assert_eq!(preview.overlay().save_state(), Some(&SaveState::Saving));

    assert!(preview.handle_key(&mut doc, "Escape"));
    let result = preview.execute(&pending).await;
    assert!(result.is_ok());

    assert_eq!(preview.finish_save(&mut doc, pending, result), SaveOutcome::Dropped);
    assert_eq!(text_of(&doc, "homePage#hero.title"), "Welcome");
    assert!(doc.find_by_id(OVERLAY_ID).is_none());
    let h1 = doc.find_by_attr(FIELD_REF_ATTR, "homePage#hero.title").unwrap();
    assert_eq!(doc.get(&h1).unwrap().attr(EDIT_STATE_ATTR), None);
}

#[tokio::test]
async fn test_result_for_previous_field_is_dropped_after_reopen() {
    let store = seeded_store().await;
    let mut preview = session(store);
    let mut doc = page();
    preview.initialize(&mut doc);
    assert!(preview.authenticate(PASSWORD, Utc::now()));

    preview.open(&mut doc, "homePage#hero.title").unwrap();
    let pending = preview
        .begin_save(&mut doc, &values(&[("value", "Welcome Back")]))
        .unwrap();
    preview.open(&mut doc, "homePage#hero.subtitle").unwrap();

    let result = preview.execute(&pending).await;
    assert_eq!(preview.finish_save(&mut doc, pending, result), SaveOutcome::Dropped);
    assert_eq!(
        preview.overlay().editing().map(|f| f.to_string()).as_deref(),
        Some("homePage#hero.subtitle")
    );
    assert_eq!(text_of(&doc, "homePage#hero.title"), "Welcome");
}

#[tokio::test]
async fn test_hover_applies_palette_to_element_only() {
    let store = seeded_store().await;
    let preview = session(store);
    let mut doc = page();

    // dark, cool-leaning background
    let palette = preview.hover(&mut doc, "homePage#hero.title").unwrap();
    assert_eq!(palette, PaletteId::Warm);
    let h1 = doc.find_by_attr(FIELD_REF_ATTR, "homePage#hero.title").unwrap();
    assert_eq!(doc.get(&h1).unwrap().attr("data-editor-palette"), Some("warm"));
    let body = doc.body_path().unwrap();
    assert_eq!(doc.get(&body).unwrap().attr("data-editor-palette"), None);
}
