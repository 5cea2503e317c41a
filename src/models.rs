//! Data models for the hotel site and its preview editor.
//!
//! This module contains the core value types shared by the classifier, the
//! overlay, the patch client and the DOM reconciler: field references, field
//! types, patch payloads and the set operations they flatten into.

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// Attribute carrying a field reference on editable nodes.
pub const FIELD_REF_ATTR: &str = "data-field-ref";

/// Attribute the classifier writes with the resolved field type.
pub const FIELD_TYPE_ATTR: &str = "data-field-type";

// ============================================================================
// Field References
// ============================================================================

/// One addressable value inside one CMS document, encoded as `id#path`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub document_id: String,
    pub path: String,
}

fn segment_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\[\d+\])*$").expect("valid regex"))
}

impl FieldRef {
    pub fn new(document_id: impl Into<String>, path: impl Into<String>) -> Result<Self> {
        let document_id = document_id.into();
        let path = path.into();
        let token = format!("{}#{}", document_id, path);
        if document_id.trim().is_empty() || document_id.contains('#') {
            return Err(Error::InvalidFieldRef(token));
        }
        if !is_valid_path(&path) {
            return Err(Error::InvalidFieldRef(token));
        }
        Ok(Self { document_id, path })
    }

    /// Parse an `id#field.path` token.
    pub fn parse(token: &str) -> Result<Self> {
        let (id, path) = token
            .split_once('#')
            .ok_or_else(|| Error::InvalidFieldRef(token.to_string()))?;
        if path.contains('#') {
            return Err(Error::InvalidFieldRef(token.to_string()));
        }
        Self::new(id, path)
    }

    /// The path with array indices stripped, e.g. `rooms[1].title` -> `rooms.title`.
    pub fn field_name(&self) -> String {
        self.path
            .split('.')
            .map(|seg| seg.split('[').next().unwrap_or(seg))
            .collect::<Vec<_>>()
            .join(".")
    }

    /// The path extended by one child segment.
    pub fn child_path(&self, child: &str) -> String {
        format!("{}.{}", self.path, child)
    }
}

/// Dotted path of identifiers, each optionally followed by `[n]` indices.
pub fn is_valid_path(path: &str) -> bool {
    !path.is_empty() && path.split('.').all(|seg| segment_regex().is_match(seg))
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document_id, self.path)
    }
}

impl FromStr for FieldRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldRef::parse(s)
    }
}

// ============================================================================
// Field Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Headline,
    Paragraph,
    List,
    Button,
    Image,
    Menu,
    Url,
    Email,
    Text,
}

impl FieldType {
    pub const ALL: [FieldType; 9] = [
        FieldType::Headline,
        FieldType::Paragraph,
        FieldType::List,
        FieldType::Button,
        FieldType::Image,
        FieldType::Menu,
        FieldType::Url,
        FieldType::Email,
        FieldType::Text,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::Headline => "headline",
            FieldType::Paragraph => "paragraph",
            FieldType::List => "list",
            FieldType::Button => "button",
            FieldType::Image => "image",
            FieldType::Menu => "menu",
            FieldType::Url => "url",
            FieldType::Email => "email",
            FieldType::Text => "text",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown field type `{}`", s))
    }
}

// ============================================================================
// Patch Payloads
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkTarget {
    #[default]
    #[serde(rename = "_self")]
    SameWindow,
    #[serde(rename = "_blank")]
    NewWindow,
}

impl LinkTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            LinkTarget::SameWindow => "_self",
            LinkTarget::NewWindow => "_blank",
        }
    }
}

impl FromStr for LinkTarget {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "" | "_self" => Ok(LinkTarget::SameWindow),
            "_blank" => Ok(LinkTarget::NewWindow),
            other => Err(crate::error::ValidationError::InvalidTarget(other.to_string())),
        }
    }
}

/// The value written for one field, shaped by its field type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PatchPayload {
    Text { value: String },
    Blocks { entries: Vec<String> },
    Button { text: String, url: String, target: LinkTarget },
    Menu { text: String, url: String },
    Image { url: String, alt: String },
}

impl PatchPayload {
    pub fn text(value: impl Into<String>) -> Self {
        PatchPayload::Text { value: value.into() }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PatchPayload::Text { .. } => "text",
            PatchPayload::Blocks { .. } => "blocks",
            PatchPayload::Button { .. } => "button",
            PatchPayload::Menu { .. } => "menu",
            PatchPayload::Image { .. } => "image",
        }
    }
}

/// A single `set` of a dotted path inside a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetOperation {
    pub path: String,
    pub value: serde_json::Value,
}
