//! The editing overlay.
//!
//! [`show_editor`] decides which inputs a field gets, [`EditorForm`] renders
//! them as a modal, and [`OverlayHost`] owns the single mounted overlay: it
//! appends the modal to the page, tracks its listeners and save button, and
//! tears everything down again on close, cancel, outside click or Escape.

use crate::dom::{Document, Element, NodePath};
use crate::error::{Error, Result, ValidationError};
use crate::models::{FieldRef, FieldType, LinkTarget, PatchPayload};
use crate::payload::{join_list, normalize_paragraphs, split_list, split_paragraphs};
use crate::reconcile;
use crate::theme::{apply_palette, PaletteId};
use std::collections::HashMap;

pub const OVERLAY_ID: &str = "preview-editor-overlay";

/// Attribute on page elements giving the overlay a friendly title.
pub const FIELD_LABEL_ATTR: &str = "data-field-label";

/// Submitted form values keyed by input name.
pub type FormValues = HashMap<String, String>;

// ============================================================================
// Seeding
// ============================================================================

/// Current state of a field, used to pre-fill the form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorSeed {
    pub value: String,
    pub url: Option<String>,
    pub target: Option<LinkTarget>,
    pub label: Option<String>,
}

impl EditorSeed {
    pub fn text(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Default::default()
        }
    }

    /// Read the current value of a rendered field.
    pub fn from_element(el: &Element, field_type: FieldType) -> Self {
        let label = el.attr(FIELD_LABEL_ATTR).map(str::to_string);
        match field_type {
            FieldType::Button | FieldType::Menu => {
                let link = el.self_or_descendant(&reconcile::is_link).unwrap_or(el);
                Self {
                    value: direct_text(link).trim().to_string(),
                    url: link.attr("href").map(str::to_string),
                    target: link.attr("target").and_then(|t| t.parse().ok()),
                    label,
                }
            }
            FieldType::Image => {
                let img = el.self_or_descendant(&reconcile::is_image);
                Self {
                    value: img.and_then(|i| i.attr("alt")).unwrap_or_default().to_string(),
                    url: img.and_then(|i| i.attr("src")).map(str::to_string),
                    target: None,
                    label,
                }
            }
            FieldType::Paragraph | FieldType::List => Self {
                value: block_text(el, field_type),
                url: None,
                target: None,
                label,
            },
            _ => {
                let mut copy = el.clone();
                let value = copy
                    .first_text_mut()
                    .map(|t| t.trim().to_string())
                    .unwrap_or_default();
                Self {
                    value,
                    url: None,
                    target: None,
                    label,
                }
            }
        }
    }
}

/// Entries of a block field, one per line for lists and separated by a
/// blank line for paragraphs.
fn block_text(el: &Element, field_type: FieldType) -> String {
    let Some(tag) = el.block_item_tag() else {
        return el.text_content().trim().to_string();
    };
    let sep = if field_type == FieldType::List { "\n" } else { "\n\n" };
    el.child_elements()
        .filter(|c| c.tag == tag)
        .map(|c| c.text_content().trim().to_string())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}

fn direct_text(el: &Element) -> String {
    el.children
        .iter()
        .filter_map(|c| match c {
            crate::dom::Node::Text(t) => Some(t.as_str()),
            crate::dom::Node::Element(_) => None,
        })
        .collect()
}

// ============================================================================
// Form Description
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Multi-line, rich-text capable area.
    RichText { rows: u8 },
    Line,
    /// Free-form link: absolute URL, site path, mailto or tel.
    Link,
    Url,
    Email,
    TargetSelect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: InputKind,
    pub value: String,
    pub required: bool,
}

impl FormField {
    fn new(name: &'static str, label: &'static str, kind: InputKind, value: impl Into<String>) -> Self {
        Self {
            name,
            label,
            kind,
            value: value.into(),
            required: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EditorForm {
    pub field: FieldRef,
    pub field_type: FieldType,
    pub title: String,
    pub fields: Vec<FormField>,
    pub preview_image: Option<String>,
}

/// Build the form for one field.
pub fn show_editor(field: &FieldRef, field_type: FieldType, seed: &EditorSeed) -> EditorForm {
    let url = seed.url.clone().unwrap_or_default();
    let mut preview_image = None;

    let fields = match field_type {
        FieldType::Paragraph => vec![FormField::new(
            "value",
            "Text (separate paragraphs with a blank line)",
            InputKind::RichText { rows: 10 },
            normalize_paragraphs(&seed.value),
        )],
        FieldType::List => vec![FormField::new(
            "value",
            "Items (one per line)",
            InputKind::RichText { rows: 8 },
            join_list(&split_list(&seed.value)),
        )],
        FieldType::Button => vec![
            FormField::new("text", "Button text", InputKind::Line, seed.value.clone()).required(),
            FormField::new("url", "Link", InputKind::Link, url).required(),
            FormField::new(
                "target",
                "Open in",
                InputKind::TargetSelect,
                seed.target.unwrap_or_default().as_str(),
            ),
        ],
        FieldType::Menu => vec![
            FormField::new("text", "Menu label", InputKind::Line, seed.value.clone()).required(),
            FormField::new("url", "Link", InputKind::Link, url).required(),
        ],
        FieldType::Image => {
            preview_image = seed.url.clone().filter(|u| !u.is_empty());
            vec![
                FormField::new("url", "Image URL", InputKind::Link, url).required(),
                FormField::new("alt", "Alt text", InputKind::Line, seed.value.clone()),
            ]
        }
        FieldType::Url => vec![FormField::new("value", "URL", InputKind::Url, seed.value.clone())],
        FieldType::Email => {
            vec![FormField::new("value", "Email address", InputKind::Email, seed.value.clone())]
        }
        FieldType::Headline => {
            vec![FormField::new("value", "Headline", InputKind::Line, seed.value.clone()).required()]
        }
        FieldType::Text => vec![FormField::new("value", "Text", InputKind::Line, seed.value.clone())],
    };

    let title = seed
        .label
        .clone()
        .unwrap_or_else(|| humanize(&field.field_name()));

    EditorForm {
        field: field.clone(),
        field_type,
        title,
        fields,
        preview_image,
    }
}

/// `hero.ctaButton` -> `Cta button`
fn humanize(field_name: &str) -> String {
    let last = field_name.rsplit('.').next().unwrap_or(field_name);
    let mut out = String::new();
    for (i, c) in last.chars().enumerate() {
        if c.is_uppercase() && i > 0 {
            out.push(' ');
            out.extend(c.to_lowercase());
        } else if c == '_' {
            out.push(' ');
        } else if i == 0 {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Turn submitted form values into a payload for `field_type`.
pub fn parse_submission(
    field_type: FieldType,
    values: &FormValues,
) -> std::result::Result<PatchPayload, ValidationError> {
    let get = |name: &str| values.get(name).map(|v| v.trim().to_string()).unwrap_or_default();
    Ok(match field_type {
        FieldType::Paragraph => PatchPayload::Blocks {
            entries: split_paragraphs(values.get("value").map(String::as_str).unwrap_or("")),
        },
        FieldType::List => PatchPayload::Blocks {
            entries: split_list(values.get("value").map(String::as_str).unwrap_or("")),
        },
        FieldType::Button => PatchPayload::Button {
            text: get("text"),
            url: get("url"),
            target: get("target").parse()?,
        },
        FieldType::Menu => PatchPayload::Menu {
            text: get("text"),
            url: get("url"),
        },
        FieldType::Image => PatchPayload::Image {
            url: get("url"),
            alt: get("alt"),
        },
        FieldType::Headline | FieldType::Url | FieldType::Email | FieldType::Text => {
            PatchPayload::Text { value: get("value") }
        }
    })
}

// ============================================================================
// Rendering
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SaveState {
    #[default]
    Idle,
    Saving,
    Failed(String),
}

impl EditorForm {
    pub fn to_element(&self, palette: PaletteId, state: &SaveState) -> Element {
        let mut form = Element::new("form")
            .with_attr("class", "preview-form")
            .with_attr("data-editing", self.field.to_string())
            .with_attr("data-field-type", self.field_type.as_str())
            .with_attr("novalidate", "");

        if let Some(src) = &self.preview_image {
            form = form.with_child(
                Element::new("img")
                    .with_attr("class", "preview-image-preview")
                    .with_attr("src", src.as_str())
                    .with_attr("alt", ""),
            );
        }

        for field in &self.fields {
            form = form.with_child(render_field(field));
        }

        if let SaveState::Failed(msg) = state {
            form = form.with_child(
                Element::new("p")
                    .with_attr("class", "preview-error")
                    .with_attr("role", "alert")
                    .with_text(msg.as_str()),
            );
        }

        let mut save = Element::new("button")
            .with_attr("type", "submit")
            .with_attr("class", "preview-save");
        if *state == SaveState::Saving {
            save.set_attr("disabled", "");
            save = save.with_text("Saving…");
        } else {
            save = save.with_text("Save");
        }

        form = form.with_child(
            Element::new("div")
                .with_attr("class", "preview-actions")
                .with_child(
                    Element::new("button")
                        .with_attr("type", "button")
                        .with_attr("class", "preview-cancel")
                        .with_attr("data-action", "cancel")
                        .with_text("Cancel"),
                )
                .with_child(save),
        );

        let modal = Element::new("div")
            .with_attr("class", "preview-modal")
            .with_attr("role", "dialog")
            .with_attr("aria-modal", "true")
            .with_attr("aria-labelledby", "preview-editor-title")
            .with_child(
                Element::new("header")
                    .with_child(
                        Element::new("h2")
                            .with_attr("id", "preview-editor-title")
                            .with_text(format!("Edit {}", self.title)),
                    )
                    .with_child(
                        Element::new("button")
                            .with_attr("type", "button")
                            .with_attr("class", "preview-close")
                            .with_attr("data-action", "close")
                            .with_attr("aria-label", "Close")
                            .with_text("×"),
                    ),
            )
            .with_child(form);

        let mut overlay = Element::new("div")
            .with_attr("id", OVERLAY_ID)
            .with_attr("class", "preview-overlay")
            .with_attr("data-action", "outside")
            .with_child(modal);
        apply_palette(&mut overlay, palette);
        overlay
    }

    pub fn to_html(&self, palette: PaletteId, state: &SaveState) -> String {
        self.to_element(palette, state).to_html()
    }
}

fn render_field(field: &FormField) -> Element {
    let id = format!("preview-input-{}", field.name);
    let mut input = match field.kind {
        InputKind::RichText { rows } => Element::new("textarea")
            .with_attr("rows", rows.to_string())
            .with_attr("data-rich-text", "true")
            .with_text(field.value.as_str()),
        InputKind::TargetSelect => {
            let option = |value: &str, label: &str| {
                let mut o = Element::new("option").with_attr("value", value).with_text(label);
                if field.value == value {
                    o.set_attr("selected", "");
                }
                o
            };
            Element::new("select")
                .with_child(option("_self", "Same window"))
                .with_child(option("_blank", "New window"))
        }
        kind => {
            let input_type = match kind {
                InputKind::Url => "url",
                InputKind::Email => "email",
                _ => "text",
            };
            let mut el = Element::new("input")
                .with_attr("type", input_type)
                .with_attr("value", field.value.as_str());
            if kind == InputKind::Link {
                el.set_attr("inputmode", "url");
            }
            el
        }
    };
    input.set_attr("id", id.as_str());
    input.set_attr("name", field.name);
    if field.required {
        input.set_attr("required", "");
    }

    Element::new("div")
        .with_attr("class", "preview-field")
        .with_child(Element::new("label").with_attr("for", id).with_text(field.label))
        .with_child(input)
}

// ============================================================================
// Mounting
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DismissReason {
    Close,
    Cancel,
    OutsideClick,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Listener {
    OutsideClick,
    EscapeKey,
    Submit,
}

struct Mounted {
    form: EditorForm,
    palette: PaletteId,
    state: SaveState,
    listeners: Vec<Listener>,
}

/// Owner of the one overlay that may be on the page.
#[derive(Default)]
pub struct OverlayHost {
    mounted: Option<Mounted>,
}

impl OverlayHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.mounted.is_some()
    }

    pub fn form(&self) -> Option<&EditorForm> {
        self.mounted.as_ref().map(|m| &m.form)
    }

    pub fn editing(&self) -> Option<&FieldRef> {
        self.form().map(|f| &f.field)
    }

    pub fn save_state(&self) -> Option<&SaveState> {
        self.mounted.as_ref().map(|m| &m.state)
    }

    pub fn listener_count(&self) -> usize {
        self.mounted.as_ref().map_or(0, |m| m.listeners.len())
    }

    /// Mount `form`, replacing any overlay already open.
    pub fn open(&mut self, doc: &mut Document, form: EditorForm, palette: PaletteId) -> Result<()> {
        if self.is_open() {
            self.dismiss(doc, DismissReason::Close);
        }
        let body = doc
            .body_path()
            .ok_or_else(|| Error::NodeNotFound("body".to_string()))?;
        let state = SaveState::Idle;
        doc.append_child(&body, form.to_element(palette, &state));
        tracing::debug!(field = %form.field, kind = %form.field_type, "editor opened");
        self.mounted = Some(Mounted {
            form,
            palette,
            state,
            listeners: vec![Listener::OutsideClick, Listener::EscapeKey, Listener::Submit],
        });
        Ok(())
    }

    /// Change the save state and re-render the overlay in place.
    pub fn set_save_state(&mut self, doc: &mut Document, state: SaveState) {
        let Some(m) = self.mounted.as_mut() else {
            return;
        };
        m.state = state;
        if let Some(path) = overlay_path(doc) {
            if let Some(el) = doc.get_mut(&path) {
                *el = m.form.to_element(m.palette, &m.state);
            }
        }
    }

    /// Remove the overlay and its listeners. Returns false when nothing was open.
    pub fn dismiss(&mut self, doc: &mut Document, reason: DismissReason) -> bool {
        let Some(mut m) = self.mounted.take() else {
            return false;
        };
        m.listeners.clear();
        while let Some(path) = overlay_path(doc) {
            doc.remove(&path);
        }
        tracing::debug!(field = %m.form.field, ?reason, "editor closed");
        true
    }

    pub fn handle_key(&mut self, doc: &mut Document, key: &str) -> bool {
        key == "Escape" && self.dismiss(doc, DismissReason::Escape)
    }

    /// A click whose target carried `data-action`.
    pub fn handle_click(&mut self, doc: &mut Document, action: &str) -> bool {
        let reason = match action {
            "outside" => DismissReason::OutsideClick,
            "cancel" => DismissReason::Cancel,
            "close" => DismissReason::Close,
            _ => return false,
        };
        self.dismiss(doc, reason)
    }
}

fn overlay_path(doc: &Document) -> Option<NodePath> {
    doc.find_by_id(OVERLAY_ID)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FIELD_REF_ATTR;

    fn field(token: &str) -> FieldRef {
        FieldRef::parse(token).unwrap()
    }

    fn page() -> Document {
        Document::from_body(
            Element::new("body").with_child(
                Element::new("h1")
                    .with_attr(FIELD_REF_ATTR, "homePage#hero.title")
                    .with_text("Welcome"),
            ),
        )
    }

    fn names(form: &EditorForm) -> Vec<&'static str> {
        form.fields.iter().map(|f| f.name).collect()
    }

    #[test]
    fn test_form_shape_per_type() {
        let f = field("homePage#hero.cta");
        let seed = EditorSeed::default();
        assert_eq!(names(&show_editor(&f, FieldType::Button, &seed)), vec!["text", "url", "target"]);
        assert_eq!(names(&show_editor(&f, FieldType::Menu, &seed)), vec!["text", "url"]);
        assert_eq!(names(&show_editor(&f, FieldType::Image, &seed)), vec!["url", "alt"]);
        for t in [FieldType::Headline, FieldType::Text, FieldType::Url, FieldType::Email] {
            assert_eq!(names(&show_editor(&f, t, &seed)), vec!["value"]);
        }
        let para = show_editor(&f, FieldType::Paragraph, &seed);
        assert!(matches!(para.fields[0].kind, InputKind::RichText { .. }));
        assert_eq!(show_editor(&f, FieldType::Email, &seed).fields[0].kind, InputKind::Email);
    }

    #[test]
    fn test_seed_prefills_values() {
        let el = Element::new("a")
            .with_attr("href", "/book")
            .with_attr("target", "_blank")
            .with_child(Element::new("svg"))
            .with_text(" Book now ");
        let seed = EditorSeed::from_element(&el, FieldType::Button);
        assert_eq!(seed.value, "Book now");
        assert_eq!(seed.url.as_deref(), Some("/book"));
        assert_eq!(seed.target, Some(LinkTarget::NewWindow));

        let form = show_editor(&field("homePage#hero.cta"), FieldType::Button, &seed);
        assert_eq!(form.fields[2].value, "_blank");
        let html = form.to_html(PaletteId::Neutral, &SaveState::Idle);
        assert!(html.contains(r#"<option value="_blank" selected="">New window</option>"#));
    }

    #[test]
    fn test_seed_reads_nested_image_and_link() {
        let figure = Element::new("figure").with_child(
            Element::new("a")
                .with_attr("href", "/gallery")
                .with_child(Element::new("img").with_attr("src", "/pool.jpg").with_attr("alt", "Pool")),
        );
        let seed = EditorSeed::from_element(&figure, FieldType::Image);
        assert_eq!(seed.url.as_deref(), Some("/pool.jpg"));
        assert_eq!(seed.value, "Pool");

        let item = Element::new("li").with_child(Element::new("a").with_attr("href", "/rooms").with_text("Rooms"));
        let seed = EditorSeed::from_element(&item, FieldType::Menu);
        assert_eq!(seed.value, "Rooms");
        assert_eq!(seed.url.as_deref(), Some("/rooms"));
    }

    #[test]
    fn test_image_form_has_preview() {
        let img = Element::new("img").with_attr("src", "/lobby.jpg").with_attr("alt", "Lobby");
        let seed = EditorSeed::from_element(&img, FieldType::Image);
        let form = show_editor(&field("homePage#hero.image"), FieldType::Image, &seed);
        assert_eq!(form.preview_image.as_deref(), Some("/lobby.jpg"));
        assert_eq!(form.fields[1].value, "Lobby");
    }

    #[test]
    fn test_title_from_label_or_field_name() {
        let f = field("homePage#hero.ctaButton");
        assert_eq!(show_editor(&f, FieldType::Button, &EditorSeed::default()).title, "Cta button");
        let seed = EditorSeed {
            label: Some("Booking button".into()),
            ..Default::default()
        };
        assert_eq!(show_editor(&f, FieldType::Button, &seed).title, "Booking button");
    }

    #[test]
    fn test_parse_submission() {
        let values: FormValues = [("value".to_string(), "One\n\n\nTwo\n".to_string())].into();
        assert_eq!(
            parse_submission(FieldType::Paragraph, &values).unwrap(),
            PatchPayload::Blocks { entries: vec!["One".into(), "Two".into()] }
        );
        assert_eq!(
            parse_submission(FieldType::List, &values).unwrap(),
            PatchPayload::Blocks { entries: vec!["One".into(), "Two".into()] }
        );

        let values: FormValues = [
            ("text".to_string(), "Book".to_string()),
            ("url".to_string(), "/book".to_string()),
            ("target".to_string(), "_top".to_string()),
        ]
        .into();
        assert_eq!(
            parse_submission(FieldType::Button, &values),
            Err(ValidationError::InvalidTarget("_top".into()))
        );
    }

    #[test]
    fn test_every_dismiss_path_tears_down() {
        let reasons: [fn(&mut OverlayHost, &mut Document) -> bool; 4] = [
            |h, d| h.dismiss(d, DismissReason::Close),
            |h, d| h.handle_click(d, "cancel"),
            |h, d| h.handle_click(d, "outside"),
            |h, d| h.handle_key(d, "Escape"),
        ];
        for dismiss in reasons {
            let mut doc = page();
            let before = doc.clone();
            let mut host = OverlayHost::new();
            let form = show_editor(&field("homePage#hero.title"), FieldType::Headline, &EditorSeed::text("Welcome"));
            host.open(&mut doc, form, PaletteId::Cool).unwrap();
            assert!(doc.find_by_id(OVERLAY_ID).is_some());
            assert_eq!(host.listener_count(), 3);

            assert!(dismiss(&mut host, &mut doc));
            assert!(!host.is_open());
            assert_eq!(host.listener_count(), 0);
            assert_eq!(doc, before);
        }
    }

    #[test]
    fn test_other_keys_and_clicks_keep_overlay() {
        let mut doc = page();
        let mut host = OverlayHost::new();
        let form = show_editor(&field("homePage#hero.title"), FieldType::Headline, &EditorSeed::text("Welcome"));
        host.open(&mut doc, form, PaletteId::Neutral).unwrap();
        assert!(!host.handle_key(&mut doc, "Enter"));
        assert!(!host.handle_click(&mut doc, "noop"));
        assert!(host.is_open());
    }

    #[test]
    fn test_reopen_replaces_overlay() {
        let mut doc = page();
        let mut host = OverlayHost::new();
        for _ in 0..3 {
            let form = show_editor(&field("homePage#hero.title"), FieldType::Headline, &EditorSeed::text("x"));
            host.open(&mut doc, form, PaletteId::Neutral).unwrap();
        }
        assert_eq!(doc.find_all(|e| e.attr("id") == Some(OVERLAY_ID)).len(), 1);
    }

    #[test]
    fn test_save_state_rendering() {
        let mut doc = page();
        let mut host = OverlayHost::new();
        let form = show_editor(&field("homePage#hero.title"), FieldType::Headline, &EditorSeed::text("x"));
        host.open(&mut doc, form, PaletteId::Neutral).unwrap();

        host.set_save_state(&mut doc, SaveState::Saving);
        let save = doc.find(|e| e.attr("class") == Some("preview-save")).unwrap();
        assert!(doc.get(&save).unwrap().has_attr("disabled"));

        host.set_save_state(&mut doc, SaveState::Failed("Could not save".into()));
        let save = doc.find(|e| e.attr("class") == Some("preview-save")).unwrap();
        assert!(!doc.get(&save).unwrap().has_attr("disabled"));
        assert!(doc.find(|e| e.attr("class") == Some("preview-error")).is_some());
    }
}
