//! Domain types for the site document.
//!
//! The document is one JSON object. Its recognized regions are typed; the
//! dynamic regions (page `sections`, team and service records, settings) stay
//! as `serde_json::Value` trees. Unknown keys at the top level and on pages
//! and icons are carried through `extra` so a read/write cycle never drops
//! data the store does not understand.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Maximum number of icons a document may hold.
pub const MAX_ICONS: usize = 20;

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Canonical page identity key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub String);

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PageId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for PageId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Icon identity, derived from the icon name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IconId(pub String);

impl fmt::Display for IconId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for IconId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for IconId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A stored timestamp, kept as the exact string found in the document.
///
/// Documents written by other tools carry millisecond ISO strings
/// (`2024-03-01T10:00:00.000Z`) and occasionally date-only values. The text
/// is written back untouched; new stamps use the millisecond form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub String);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    /// The parsed instant, when the text is RFC 3339.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.0)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// `null` reads as the type's default, the same as an absent key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A content page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    /// URL path, e.g. `/about`. Secondary lookup key.
    #[serde(default, deserialize_with = "null_as_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    /// Legacy free-text body.
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Page {
    pub fn new(id: &str, path: &str, title: &str) -> Self {
        Self {
            id: PageId::from(id),
            path: path.to_string(),
            title: title.to_string(),
            content: String::new(),
            sections: None,
            updated_at: None,
            extra: Map::new(),
        }
    }
}

/// A reusable inline SVG icon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Icon {
    pub id: IconId,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Raw SVG markup.
    #[serde(default, deserialize_with = "null_as_default")]
    pub svg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Root of the site document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "null_as_default")]
    pub pages: Vec<Page>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub team: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub services: Vec<Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub settings: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub icons: Vec<Icon>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Document {
    /// The bootstrap document: the five site pages, everything else empty.
    fn default() -> Self {
        Self {
            pages: vec![
                Page::new("home", "/", "Home"),
                Page::new("about", "/about", "About"),
                Page::new("students", "/students", "Students & Researchers"),
                Page::new("universities", "/universities", "Universities & Partners"),
                Page::new("contact", "/contact", "Contact"),
            ],
            team: vec![],
            services: vec![],
            settings: Map::new(),
            icons: vec![],
            extra: Map::new(),
        }
    }
}

impl Document {
    /// Parse a document from an arbitrary JSON value.
    ///
    /// Only objects are accepted; anything else is a validation failure, as is
    /// an object whose recognized regions have the wrong shape.
    pub fn from_value(value: Value) -> Result<Self, crate::StoreError> {
        if !value.is_object() {
            return Err(crate::StoreError::Validation(format!(
                "document must be a JSON object, got {}",
                json_kind(&value)
            )));
        }
        serde_json::from_value(value).map_err(|e| crate::StoreError::Validation(e.to_string()))
    }

    /// The document as a generic JSON tree, for scanning.
    pub fn to_value(&self) -> Result<Value, crate::StoreError> {
        Ok(serde_json::to_value(self)?)
    }

    /// One-line summary used in logs and CLI output.
    pub fn summary(&self) -> DocumentSummary {
        DocumentSummary {
            pages: self.pages.len(),
            team: self.team.len(),
            services: self.services.len(),
            icons: self.icons.len(),
            settings: self.settings.len(),
        }
    }
}

/// Region counts of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub pages: usize,
    pub team: usize,
    pub services: usize,
    pub icons: usize,
    pub settings: usize,
}

impl fmt::Display for DocumentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pages, {} team members, {} services, {} icons, {} settings keys",
            self.pages, self.team, self.services, self.icons, self.settings
        )
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
