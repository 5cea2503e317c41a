//! Reflect a saved field on the page without reloading it.
//!
//! Updates go through two phases: [`mark_pending`] flags the element while
//! the write is in flight, then either [`commit`] applies the new value once
//! the store confirmed it, or [`rollback`] clears the flag and leaves the
//! element untouched.

use crate::dom::{Document, Element, Node, NodePath};
use crate::error::{Error, Result};
use crate::models::{FieldRef, PatchPayload, FIELD_REF_ATTR};

/// Attribute carrying the in-flight state of an element.
pub const EDIT_STATE_ATTR: &str = "data-edit-state";

pub fn locate(doc: &Document, field: &FieldRef) -> Result<NodePath> {
    let token = field.to_string();
    doc.find_by_attr(FIELD_REF_ATTR, &token)
        .ok_or(Error::NodeNotFound(token))
}

pub fn mark_pending(doc: &mut Document, field: &FieldRef) -> Result<NodePath> {
    let path = locate(doc, field)?;
    if let Some(el) = doc.get_mut(&path) {
        el.set_attr(EDIT_STATE_ATTR, "pending");
    }
    Ok(path)
}

/// Apply a confirmed save and clear the pending flag.
///
/// The flag is cleared even when the payload cannot be applied.
pub fn commit(doc: &mut Document, field: &FieldRef, payload: &PatchPayload) -> Result<()> {
    let applied = apply_locally(doc, field, payload);
    clear_state(doc, field);
    applied
}

/// Forget a failed save; the element keeps its previous content.
pub fn rollback(doc: &mut Document, field: &FieldRef) {
    clear_state(doc, field);
}

fn clear_state(doc: &mut Document, field: &FieldRef) {
    if let Ok(path) = locate(doc, field) {
        if let Some(el) = doc.get_mut(&path) {
            el.remove_attr(EDIT_STATE_ATTR);
        }
    }
}

/// Write `payload` into the element carrying `field`'s reference.
pub fn apply_locally(doc: &mut Document, field: &FieldRef, payload: &PatchPayload) -> Result<()> {
    let path = locate(doc, field)?;
    let el = doc
        .get_mut(&path)
        .ok_or_else(|| Error::NodeNotFound(field.to_string()))?;
    let mismatch = || Error::TargetMismatch {
        field: field.to_string(),
        payload: payload.kind(),
    };

    match payload {
        PatchPayload::Button { text, url, target } => {
            let link = link_target(el).ok_or_else(mismatch)?;
            replace_direct_text(link, text);
            link.set_attr("href", url.as_str());
            link.set_attr("target", target.as_str());
        }
        PatchPayload::Menu { text, url } => {
            let link = link_target(el).ok_or_else(mismatch)?;
            replace_direct_text(link, text);
            link.set_attr("href", url.as_str());
        }
        PatchPayload::Image { url, alt } => {
            let img = image_target(el).ok_or_else(mismatch)?;
            img.set_attr("src", url.as_str());
            img.set_attr("alt", alt.as_str());
        }
        PatchPayload::Blocks { entries } => match el.block_item_tag() {
            Some(tag) => {
                el.children = entries
                    .iter()
                    .map(|e| Node::Element(Element::new(tag).with_text(e.as_str())))
                    .collect();
            }
            None => {
                let text = if entries.len() > 1 {
                    entries.join("\n\n")
                } else {
                    entries.first().cloned().unwrap_or_default()
                };
                el.set_text_content(text);
            }
        },
        PatchPayload::Text { value } => {
            match el.first_text_mut() {
                Some(t) => *t = value.trim().to_string(),
                None => el.children.insert(0, Node::Text(value.trim().to_string())),
            }
            refresh_contact_href(el, value);
        }
    }
    Ok(())
}

pub(crate) fn is_link(el: &Element) -> bool {
    el.tag == "a" || el.tag == "button"
}

pub(crate) fn is_image(el: &Element) -> bool {
    el.tag == "img"
}

/// The element itself when it is a link or button, else its first link descendant.
fn link_target(el: &mut Element) -> Option<&mut Element> {
    el.self_or_descendant_mut(&is_link)
}

fn image_target(el: &mut Element) -> Option<&mut Element> {
    el.self_or_descendant_mut(&is_image)
}

/// `mailto:` and `tel:` links follow the text they display.
fn refresh_contact_href(el: &mut Element, value: &str) {
    if el.tag != "a" {
        return;
    }
    let href = match el.attr("href") {
        Some(h) if h.starts_with("mailto:") => format!("mailto:{}", value.trim()),
        Some(h) if h.starts_with("tel:") => format!("tel:{}", value.trim().replace(' ', "")),
        _ => return,
    };
    el.set_attr("href", href);
}

/// Replace the first direct text child, keeping icons and other child elements.
fn replace_direct_text(el: &mut Element, text: &str) {
    let text = text.trim().to_string();
    match el.first_direct_text_mut() {
        Some(t) => *t = text,
        None => el.children.insert(0, Node::Text(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LinkTarget;

    fn page() -> Document {
        Document::from_body(
            Element::new("body")
                .with_child(
                    Element::new("h1")
                        .with_attr(FIELD_REF_ATTR, "homePage#hero.title")
                        .with_text("Welcome")
                        .with_child(Element::new("span").with_attr("class", "edit-affordance").with_text("✎")),
                )
                .with_child(
                    Element::new("a")
                        .with_attr(FIELD_REF_ATTR, "homePage#hero.cta")
                        .with_attr("href", "/book")
                        .with_child(Element::new("svg").with_attr("class", "icon"))
                        .with_text(" Book now"),
                )
                .with_child(
                    Element::new("img")
                        .with_attr(FIELD_REF_ATTR, "homePage#hero.image")
                        .with_attr("src", "/old.jpg")
                        .with_attr("alt", "Old"),
                )
                .with_child(
                    Element::new("p")
                        .with_attr(FIELD_REF_ATTR, "homePage#intro.body")
                        .with_text("Old text"),
                ),
        )
    }

    fn field(token: &str) -> FieldRef {
        FieldRef::parse(token).unwrap()
    }

    fn node<'a>(doc: &'a Document, token: &str) -> &'a Element {
        doc.get(&locate(doc, &field(token)).unwrap()).unwrap()
    }

    #[test]
    fn test_scalar_text_keeps_affordance() {
        let mut doc = page();
        apply_locally(&mut doc, &field("homePage#hero.title"), &PatchPayload::text("Welcome Back")).unwrap();
        let h1 = node(&doc, "homePage#hero.title");
        assert_eq!(h1.text_content(), "Welcome Back✎");
        assert_eq!(h1.child_elements().count(), 1);
    }

    #[test]
    fn test_button_updates_text_href_and_target() {
        let mut doc = page();
        apply_locally(
            &mut doc,
            &field("homePage#hero.cta"),
            &PatchPayload::Button {
                text: "Reserve".into(),
                url: "https://book.example.com".into(),
                target: LinkTarget::NewWindow,
            },
        )
        .unwrap();
        let a = node(&doc, "homePage#hero.cta");
        assert_eq!(a.attr("href"), Some("https://book.example.com"));
        assert_eq!(a.attr("target"), Some("_blank"));
        assert_eq!(a.text_content(), "Reserve");
        assert_eq!(a.child_elements().next().unwrap().tag, "svg");
    }

    #[test]
    fn test_image_updates_src_and_alt() {
        let mut doc = page();
        apply_locally(
            &mut doc,
            &field("homePage#hero.image"),
            &PatchPayload::Image { url: "/new.jpg".into(), alt: "Terrace".into() },
        )
        .unwrap();
        let img = node(&doc, "homePage#hero.image");
        assert_eq!(img.attr("src"), Some("/new.jpg"));
        assert_eq!(img.attr("alt"), Some("Terrace"));
    }

    #[test]
    fn test_blocks_join_with_blank_line() {
        let mut doc = page();
        let f = field("homePage#intro.body");
        apply_locally(&mut doc, &f, &PatchPayload::Blocks { entries: vec!["One".into(), "Two".into()] }).unwrap();
        assert_eq!(node(&doc, "homePage#intro.body").text_content(), "One\n\nTwo");
        apply_locally(&mut doc, &f, &PatchPayload::Blocks { entries: vec!["Only".into()] }).unwrap();
        assert_eq!(node(&doc, "homePage#intro.body").text_content(), "Only");
    }

    #[test]
    fn test_blocks_rebuild_list_items() {
        let mut doc = Document::from_body(
            Element::new("body").with_child(
                Element::new("ul")
                    .with_attr(FIELD_REF_ATTR, "room-1#amenities")
                    .with_child(Element::new("li").with_text("Pool")),
            ),
        );
        let f = field("room-1#amenities");
        apply_locally(&mut doc, &f, &PatchPayload::Blocks { entries: vec!["Spa".into(), "Gym".into()] }).unwrap();
        let ul = node(&doc, "room-1#amenities");
        let items: Vec<String> = ul.child_elements().map(|li| li.text_content()).collect();
        assert_eq!(items, vec!["Spa", "Gym"]);
        assert!(ul.child_elements().all(|c| c.tag == "li"));
    }

    #[test]
    fn test_image_payload_on_paragraph_is_rejected() {
        let mut doc = page();
        let result = apply_locally(
            &mut doc,
            &field("homePage#intro.body"),
            &PatchPayload::Image { url: "/x.jpg".into(), alt: String::new() },
        );
        assert!(matches!(result, Err(Error::TargetMismatch { .. })));
    }

    #[test]
    fn test_missing_node() {
        let mut doc = page();
        let result = apply_locally(&mut doc, &field("homePage#nothing"), &PatchPayload::text("x"));
        assert!(matches!(result, Err(Error::NodeNotFound(_))));
    }

    #[test]
    fn test_two_phase_rollback_leaves_content() {
        let mut doc = page();
        let f = field("homePage#hero.title");
        mark_pending(&mut doc, &f).unwrap();
        assert_eq!(node(&doc, "homePage#hero.title").attr(EDIT_STATE_ATTR), Some("pending"));
        rollback(&mut doc, &f);
        let h1 = node(&doc, "homePage#hero.title");
        assert_eq!(h1.attr(EDIT_STATE_ATTR), None);
        assert!(h1.text_content().starts_with("Welcome✎"));
    }

    #[test]
    fn test_two_phase_commit_applies() {
        let mut doc = page();
        let f = field("homePage#hero.title");
        mark_pending(&mut doc, &f).unwrap();
        commit(&mut doc, &f, &PatchPayload::text("Hello")).unwrap();
        let h1 = node(&doc, "homePage#hero.title");
        assert_eq!(h1.attr(EDIT_STATE_ATTR), None);
        assert!(h1.text_content().starts_with("Hello"));
    }

    #[test]
    fn test_contact_links_follow_their_text() {
        let mut doc = Document::from_body(
            Element::new("footer")
                .with_child(
                    Element::new("a")
                        .with_attr(FIELD_REF_ATTR, "siteSettings#contact.email")
                        .with_attr("href", "mailto:stay@old.example")
                        .with_text("stay@old.example"),
                )
                .with_child(
                    Element::new("a")
                        .with_attr(FIELD_REF_ATTR, "siteSettings#contact.phone")
                        .with_attr("href", "tel:+15550100")
                        .with_text("+1 555 0100"),
                ),
        );
        apply_locally(&mut doc, &field("siteSettings#contact.email"), &PatchPayload::text("hello@new.example")).unwrap();
        apply_locally(&mut doc, &field("siteSettings#contact.phone"), &PatchPayload::text(" +1 555 0199 ")).unwrap();

        let email = node(&doc, "siteSettings#contact.email");
        assert_eq!(email.text_content(), "hello@new.example");
        assert_eq!(email.attr("href"), Some("mailto:hello@new.example"));
        let phone = node(&doc, "siteSettings#contact.phone");
        assert_eq!(phone.text_content(), "+1 555 0199");
        assert_eq!(phone.attr("href"), Some("tel:+15550199"));
    }

    #[test]
    fn test_plain_link_href_untouched_by_text_save() {
        let mut doc = page();
        apply_locally(&mut doc, &field("homePage#hero.cta"), &PatchPayload::text("Reserve")).unwrap();
        assert_eq!(node(&doc, "homePage#hero.cta").attr("href"), Some("/book"));
    }

    #[test]
    fn test_failed_commit_still_clears_pending() {
        let mut doc = page();
        let f = field("homePage#hero.title");
        mark_pending(&mut doc, &f).unwrap();
        let result = commit(
            &mut doc,
            &f,
            &PatchPayload::Image { url: "/x.jpg".into(), alt: String::new() },
        );
        assert!(matches!(result, Err(Error::TargetMismatch { .. })));
        let h1 = node(&doc, "homePage#hero.title");
        assert_eq!(h1.attr(EDIT_STATE_ATTR), None);
        assert!(h1.text_content().starts_with("Welcome"));
    }
}
