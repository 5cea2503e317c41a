//! Patch payload shaping.
//!
//! Turns editor input into [`PatchPayload`] values, validates them before
//! anything touches the network, and flattens them into the dotted-path
//! [`SetOperation`]s that make up one CMS commit.

use crate::error::ValidationError;
use crate::models::{FieldRef, FieldType, PatchPayload, SetOperation};
use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;
use url::Url;

// ============================================================================
// Text Splitting
// ============================================================================

fn blank_line_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\r?\n[ \t]*\r?\n").expect("valid regex"))
}

/// Split paragraph text on blank lines. Entries are trimmed and empties dropped.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    blank_line_regex()
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Split list text on single newlines. Entries are trimmed and empties dropped.
pub fn split_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn join_paragraphs(entries: &[String]) -> String {
    entries.join("\n\n")
}

pub fn join_list(entries: &[String]) -> String {
    entries.join("\n")
}

/// Canonical paragraph text: trimmed paragraphs separated by one blank line.
pub fn normalize_paragraphs(text: &str) -> String {
    join_paragraphs(&split_paragraphs(text))
}

// ============================================================================
// Validation
// ============================================================================

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"))
}

/// Accepts absolute `http(s)`, `mailto:` and `tel:` URLs, plus site-relative
/// paths and fragments.
pub fn is_valid_link(link: &str) -> bool {
    let link = link.trim();
    if link.starts_with('/') && !link.starts_with("//") {
        return !link.contains(char::is_whitespace);
    }
    if link.starts_with('#') || link.starts_with('?') {
        return !link.contains(char::is_whitespace);
    }
    match Url::parse(link) {
        Ok(url) => match url.scheme() {
            "http" | "https" => url.host_str().is_some(),
            "mailto" | "tel" => !url.path().is_empty(),
            _ => false,
        },
        Err(_) => false,
    }
}

pub fn is_valid_email(email: &str) -> bool {
    email_regex().is_match(email.trim())
}

fn expected_kind(field_type: FieldType) -> &'static [&'static str] {
    match field_type {
        FieldType::Paragraph | FieldType::List => &["blocks"],
        FieldType::Button => &["button"],
        FieldType::Menu => &["menu"],
        FieldType::Image => &["image"],
        FieldType::Headline | FieldType::Url | FieldType::Email | FieldType::Text => &["text"],
    }
}

/// Check a payload against the field it is meant for.
///
/// `required` comes from the content model; headlines, button and menu
/// labels and image URLs are always required.
pub fn validate(
    payload: &PatchPayload,
    field_type: FieldType,
    required: bool,
) -> Result<(), ValidationError> {
    if !expected_kind(field_type).contains(&payload.kind()) {
        return Err(ValidationError::PayloadMismatch {
            field_type: field_type.as_str(),
            payload: payload.kind(),
        });
    }

    match payload {
        PatchPayload::Text { value } => {
            let value = value.trim();
            if value.is_empty() {
                if required || field_type == FieldType::Headline {
                    return Err(ValidationError::Required(field_label(field_type)));
                }
                return Ok(());
            }
            match field_type {
                FieldType::Url if !is_valid_link(value) => {
                    Err(ValidationError::InvalidUrl(value.to_string()))
                }
                FieldType::Email if !is_valid_email(value) => {
                    Err(ValidationError::InvalidEmail(value.to_string()))
                }
                _ => Ok(()),
            }
        }
        PatchPayload::Blocks { entries } => {
            if required && entries.is_empty() {
                return Err(ValidationError::Required(field_label(field_type)));
            }
            Ok(())
        }
        PatchPayload::Button { text, url, .. } | PatchPayload::Menu { text, url } => {
            if text.trim().is_empty() {
                return Err(ValidationError::Required("Label"));
            }
            if url.trim().is_empty() {
                return Err(ValidationError::Required("URL"));
            }
            if !is_valid_link(url) {
                return Err(ValidationError::InvalidUrl(url.clone()));
            }
            Ok(())
        }
        PatchPayload::Image { url, .. } => {
            if url.trim().is_empty() {
                return Err(ValidationError::Required("Image URL"));
            }
            if !is_valid_link(url) {
                return Err(ValidationError::InvalidUrl(url.clone()));
            }
            Ok(())
        }
    }
}

fn field_label(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::Headline => "Headline",
        FieldType::Paragraph => "Text",
        FieldType::List => "List",
        FieldType::Url => "URL",
        FieldType::Email => "Email",
        _ => "Value",
    }
}

// ============================================================================
// Set Operations
// ============================================================================

/// Flatten a payload into the set operations of one commit.
///
/// Compound payloads set their sub-fields individually (`field.text`,
/// `field.url`, ...); everything else sets the field path directly.
pub fn to_set_operations(field: &FieldRef, payload: &PatchPayload) -> Vec<SetOperation> {
    let set = |path: String, value: Value| SetOperation { path, value };
    match payload {
        PatchPayload::Text { value } => vec![set(field.path.clone(), json!(value.trim()))],
        PatchPayload::Blocks { entries } => vec![set(field.path.clone(), json!(entries))],
        PatchPayload::Button { text, url, target } => vec![
            set(field.child_path("text"), json!(text.trim())),
            set(field.child_path("url"), json!(url.trim())),
            set(field.child_path("target"), json!(target.as_str())),
        ],
        PatchPayload::Menu { text, url } => vec![
            set(field.child_path("text"), json!(text.trim())),
            set(field.child_path("url"), json!(url.trim())),
        ],
        PatchPayload::Image { url, alt } => vec![
            set(field.child_path("url"), json!(url.trim())),
            set(field.child_path("alt"), json!(alt.trim())),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkTarget;

    fn field(path: &str) -> FieldRef {
        FieldRef::parse(&format!("homePage#{}", path)).unwrap()
    }

    #[test]
    fn test_split_paragraphs_on_blank_lines() {
        let text = "  First paragraph\nstill first.\n\n\n Second \n  \nThird\n\n";
        assert_eq!(
            split_paragraphs(text),
            vec!["First paragraph\nstill first.", "Second", "Third"]
        );
        assert!(split_paragraphs("\n\n  \n").is_empty());
    }

    #[test]
    fn test_paragraph_normalisation_is_idempotent() {
        let samples = [
            "one\n\ntwo",
            "\n\n  one  \n\n\n\ntwo\n",
            "single",
            "a\r\n\r\nb",
            "",
        ];
        for s in samples {
            let once = normalize_paragraphs(s);
            assert_eq!(normalize_paragraphs(&once), once, "input {:?}", s);
            assert_eq!(join_paragraphs(&split_paragraphs(s)), once);
        }
    }

    #[test]
    fn test_split_list_preserves_order() {
        let items = split_list("Pool\n\n  Spa  \nGym\n   \nBar");
        assert_eq!(items, vec!["Pool", "Spa", "Gym", "Bar"]);
    }

    #[test]
    fn test_button_shapes_three_sets() {
        let ops = to_set_operations(
            &field("hero.cta"),
            &PatchPayload::Button {
                text: "Book".into(),
                url: "/book".into(),
                target: LinkTarget::NewWindow,
            },
        );
        let paths: Vec<_> = ops.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["hero.cta.text", "hero.cta.url", "hero.cta.target"]);
        assert_eq!(ops[2].value, json!("_blank"));
    }

    #[test]
    fn test_image_and_menu_shape_two_sets() {
        let image = to_set_operations(
            &field("hero.image"),
            &PatchPayload::Image {
                url: "https://cdn.example.com/a.jpg".into(),
                alt: "Lobby".into(),
            },
        );
        assert_eq!(image.len(), 2);
        assert_eq!(image[0].path, "hero.image.url");
        assert_eq!(image[1].path, "hero.image.alt");

        let menu = to_set_operations(
            &field("navigation[0]"),
            &PatchPayload::Menu {
                text: "Rooms".into(),
                url: "/rooms".into(),
            },
        );
        let paths: Vec<_> = menu.iter().map(|o| o.path.as_str()).collect();
        assert_eq!(paths, vec!["navigation[0].text", "navigation[0].url"]);
    }

    #[test]
    fn test_simple_types_shape_one_set() {
        let ops = to_set_operations(&field("hero.title"), &PatchPayload::text(" Welcome Back "));
        assert_eq!(ops, vec![SetOperation { path: "hero.title".into(), value: json!("Welcome Back") }]);

        let ops = to_set_operations(
            &field("highlights"),
            &PatchPayload::Blocks { entries: vec!["Pool".into(), "Spa".into()] },
        );
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].value, json!(["Pool", "Spa"]));
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            validate(&PatchPayload::text("  "), FieldType::Headline, false),
            Err(ValidationError::Required("Headline"))
        );
        assert!(validate(&PatchPayload::text(""), FieldType::Text, false).is_ok());
        assert!(matches!(
            validate(&PatchPayload::text("not a url"), FieldType::Url, false),
            Err(ValidationError::InvalidUrl(_))
        ));
        assert!(validate(&PatchPayload::text("https://example.com/x"), FieldType::Url, false).is_ok());
        assert!(matches!(
            validate(&PatchPayload::text("nobody@"), FieldType::Email, false),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(validate(&PatchPayload::text("stay@hotel.com"), FieldType::Email, true).is_ok());
        assert!(matches!(
            validate(&PatchPayload::text("x"), FieldType::Button, false),
            Err(ValidationError::PayloadMismatch { .. })
        ));
    }

    #[test]
    fn test_link_rules() {
        assert!(is_valid_link("/rooms/deluxe"));
        assert!(is_valid_link("#contact"));
        assert!(is_valid_link("mailto:stay@hotel.com"));
        assert!(is_valid_link("tel:+15551234"));
        assert!(!is_valid_link("//evil.com"));
        assert!(!is_valid_link("javascript:alert(1)"));
        assert!(!is_valid_link("rooms page"));
    }
}
