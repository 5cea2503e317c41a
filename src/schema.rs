//! Content model for the hotel site.
//!
//! Every editable field is declared with an explicit [`FieldType`], so the
//! preview editor does not have to guess from element tags or field names.
//! The name heuristics in [`crate::classify`] only apply to fields that are
//! missing from these declarations.

use crate::models::FieldType;

#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    /// Field path with array indices omitted (`amenities`, `hero.cta`).
    pub name: &'static str,
    pub title: &'static str,
    pub kind: FieldType,
    pub required: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DocumentSchema {
    pub name: &'static str,
    pub title: &'static str,
    pub fields: &'static [FieldDef],
}

const fn field(name: &'static str, title: &'static str, kind: FieldType, required: bool) -> FieldDef {
    FieldDef {
        name,
        title,
        kind,
        required,
    }
}

pub const HOME_PAGE: DocumentSchema = DocumentSchema {
    name: "homePage",
    title: "Home Page",
    fields: &[
        field("hero.title", "Hero headline", FieldType::Headline, true),
        field("hero.subtitle", "Hero subtitle", FieldType::Text, false),
        field("hero.image", "Hero image", FieldType::Image, true),
        field("hero.cta", "Hero call to action", FieldType::Button, false),
        field("intro.title", "Intro headline", FieldType::Headline, false),
        field("intro.body", "Intro text", FieldType::Paragraph, false),
        field("highlights", "Highlights", FieldType::List, false),
        field("gallery.image", "Gallery image", FieldType::Image, false),
        field("offers.title", "Offer title", FieldType::Headline, false),
        field("offers.description", "Offer description", FieldType::Paragraph, false),
        field("offers.cta", "Offer link", FieldType::Button, false),
    ],
};

pub const ROOM: DocumentSchema = DocumentSchema {
    name: "room",
    title: "Room",
    fields: &[
        field("name", "Room name", FieldType::Headline, true),
        field("summary", "Summary", FieldType::Text, false),
        field("description", "Description", FieldType::Paragraph, false),
        field("amenities", "Amenities", FieldType::List, false),
        field("image", "Main image", FieldType::Image, false),
        field("bookingLink", "Booking link", FieldType::Button, false),
        field("price", "Price from", FieldType::Text, false),
    ],
};

pub const SITE_SETTINGS: DocumentSchema = DocumentSchema {
    name: "siteSettings",
    title: "Site Settings",
    fields: &[
        field("hotelName", "Hotel name", FieldType::Text, true),
        field("tagline", "Tagline", FieldType::Text, false),
        field("description", "SEO description", FieldType::Paragraph, false),
        field("navigation", "Main navigation", FieldType::Menu, false),
        field("contact.email", "Contact email", FieldType::Email, false),
        field("contact.phone", "Phone", FieldType::Text, false),
        field("contact.address", "Address", FieldType::Text, false),
        field("bookingUrl", "Booking engine URL", FieldType::Url, false),
        field("logo", "Logo", FieldType::Image, false),
        field("footer.copyright", "Copyright line", FieldType::Text, false),
    ],
};

pub const SCHEMAS: &[DocumentSchema] = &[HOME_PAGE, ROOM, SITE_SETTINGS];

pub fn find_schema(doc_type: &str) -> Option<&'static DocumentSchema> {
    SCHEMAS.iter().find(|s| s.name == doc_type)
}

impl DocumentSchema {
    /// Look up a field by its index-free path (see [`crate::models::FieldRef::field_name`]).
    pub fn field(&self, name: &str) -> Option<&'static FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Declared kind for `field_name` on documents of `doc_type`, if any.
pub fn declared_kind(doc_type: &str, field_name: &str) -> Option<FieldType> {
    find_schema(doc_type)?.field(field_name).map(|f| f.kind)
}

pub fn is_required(doc_type: &str, field_name: &str) -> bool {
    find_schema(doc_type)
        .and_then(|s| s.field(field_name))
        .map(|f| f.required)
        .unwrap_or(false)
}
