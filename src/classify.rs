//! Field type inference for editable page elements.
//!
//! Declared kinds from [`crate::schema`] take precedence. For anything the
//! content model does not declare, the type is inferred from the element tag
//! and the field path, using an ordered rule chain where the first match
//! wins.

use crate::dom::Document;
use crate::models::{FieldRef, FieldType, FIELD_REF_ATTR, FIELD_TYPE_ATTR};
use crate::schema;

/// Attribute naming the CMS document type of the nearest document root.
pub const DOC_TYPE_ATTR: &str = "data-doc-type";

/// Infer a field type from an element tag and a field name.
///
/// Rules in priority order:
/// 1. `h1`/`h2`/`h3` -> headline
/// 2. `img`, or name contains "image" -> image
/// 3. `a`, or name contains "button" -> button
/// 4. name contains "description", "content" or "paragraph" -> paragraph
/// 5. name contains "url" or "link" -> url
/// 6. name contains "email" -> email
/// 7. otherwise text
pub fn classify(tag: &str, field_name: &str) -> FieldType {
    let tag = tag.to_ascii_uppercase();
    let name = field_name.to_ascii_lowercase();
    let has = |needle: &str| name.contains(needle);

    if matches!(tag.as_str(), "H1" | "H2" | "H3") {
        FieldType::Headline
    } else if tag == "IMG" || has("image") {
        FieldType::Image
    } else if tag == "A" || has("button") {
        FieldType::Button
    } else if has("description") || has("content") || has("paragraph") {
        FieldType::Paragraph
    } else if has("url") || has("link") {
        FieldType::Url
    } else if has("email") {
        FieldType::Email
    } else {
        FieldType::Text
    }
}

/// Declared kind when the content model knows the field, heuristic otherwise.
pub fn resolve_field_type(doc_type: Option<&str>, tag: &str, field: &FieldRef) -> FieldType {
    doc_type
        .and_then(|t| schema::declared_kind(t, &field.field_name()))
        .unwrap_or_else(|| classify(tag, &field.path))
}

/// CMS document type declared on the element at `path` or its nearest ancestor.
pub fn doc_type_of<'a>(doc: &'a Document, path: &[usize]) -> Option<&'a str> {
    doc.get(path)
        .into_iter()
        .chain(doc.ancestors(path))
        .find_map(|el| el.attr(DOC_TYPE_ATTR))
}

/// Field type of the element at `path`.
pub fn classify_node(doc: &Document, path: &[usize]) -> Option<FieldType> {
    let el = doc.get(path)?;
    let field = FieldRef::parse(el.attr(FIELD_REF_ATTR)?).ok()?;
    Some(resolve_field_type(doc_type_of(doc, path), &el.tag, &field))
}

/// Mark every editable element with its resolved field type.
///
/// Elements whose reference token does not parse are left unmarked.
/// Returns the number of elements annotated.
pub fn annotate(doc: &mut Document) -> usize {
    let paths = doc.find_all(|e| e.has_attr(FIELD_REF_ATTR));
    let mut count = 0;
    for path in paths {
        let Some(kind) = classify_node(doc, &path) else {
            tracing::debug!(?path, "skipping element with malformed field reference");
            continue;
        };
        if let Some(el) = doc.get_mut(&path) {
            el.set_attr(FIELD_TYPE_ATTR, kind.as_str());
            count += 1;
        }
    }
    count
}
