//! Shared page chrome: head, site header and footer, preview banner.

use crate::dom::Element;
use crate::site::Source;

use super::preview_js::PREVIEW_SCRIPT;
use super::styles::{PREVIEW_STYLE, SITE_STYLE};

// ============================================================================
// Head
// ============================================================================

pub fn page_head(title: &str, extra: Vec<Element>, preview: bool) -> Element {
    let mut head = Element::new("head")
        .with_child(Element::new("meta").with_attr("charset", "utf-8"))
        .with_child(
            Element::new("meta")
                .with_attr("name", "viewport")
                .with_attr("content", "width=device-width, initial-scale=1"),
        )
        .with_child(Element::new("title").with_text(title))
        .with_children(extra)
        .with_child(Element::new("style").with_text(SITE_STYLE));
    if preview {
        head = head
            .with_child(Element::new("meta").with_attr("name", "robots").with_attr("content", "noindex"))
            .with_child(
                Element::new("style")
                    .with_attr("id", "preview-style")
                    .with_text(PREVIEW_STYLE),
            );
    }
    head
}

// ============================================================================
// Header & Footer
// ============================================================================

pub fn site_header(settings: &Source) -> Element {
    let mut brand = Element::new("a").with_attr("class", "brand").with_attr("href", "/");
    if !settings.text("logo.url").is_empty() {
        brand = brand.with_child(settings.image_field("logo", ""));
    }
    brand = brand.with_child(settings.text_field("span", "hotelName"));

    let nav = Element::new("nav").with_children(
        (0..settings.items("navigation").len())
            .map(|i| settings.link_field(&format!("navigation[{i}]"), "")),
    );

    settings
        .root("header")
        .with_attr("class", "site-header")
        .with_child(brand)
        .with_child(settings.text_field("span", "tagline").with_attr("class", "tagline"))
        .with_child(nav)
}

pub fn site_footer(settings: &Source) -> Element {
    let email = settings.text("contact.email");
    let phone = settings.text("contact.phone");

    let contact = Element::new("div")
        .with_attr("class", "contact")
        .with_child(settings.text_field("span", "contact.address"))
        .with_child(
            settings
                .text_field("a", "contact.phone")
                .with_attr("href", format!("tel:{}", phone.replace(' ', ""))),
        )
        .with_child(
            settings
                .text_field("a", "contact.email")
                .with_attr("href", format!("mailto:{}", email)),
        );

    settings
        .root("footer")
        .with_attr("class", "site-footer")
        .with_child(contact)
        .with_child(settings.text_field("p", "footer.copyright"))
}

// ============================================================================
// Preview
// ============================================================================

/// Banner and editor script appended to the body in preview mode.
pub fn preview_chrome(authenticated: bool) -> Vec<Element> {
    let status = if authenticated {
        "Preview mode: click any outlined text to edit"
    } else {
        "Preview mode: click any outlined text to sign in and edit"
    };
    vec![
        Element::new("div")
            .with_attr("class", "preview-banner")
            .with_attr("data-authenticated", if authenticated { "true" } else { "false" })
            .with_text(status)
            .with_child(
                Element::new("a")
                    .with_attr("href", "/api/preview/logout")
                    .with_text("Exit preview"),
            ),
        Element::new("script")
            .with_attr("id", "preview-script")
            .with_text(PREVIEW_SCRIPT),
    ]
}
