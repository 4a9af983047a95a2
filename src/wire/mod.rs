//! Wire document layer: the tag-based (XML) request/response bodies used by
//! the document-family endpoints, plus client-kind detection for the
//! endpoints that serve both families.

pub mod client;
pub mod xml;

pub use client::{classify, ClientKind};
pub use xml::{decode, decode_lossy, encode, encode_tree};

use thiserror::Error;

/// Field names the decoder treats as nested containers.
const NESTED_FIELDS: &[&str] = &["patient"];

/// Field names the decoder treats as repeated-item containers, with the tag
/// name each repeated item uses.
const LIST_FIELDS: &[(&str, &str)] = &[("studies", "study")];

pub(crate) fn is_nested_field(name: &str) -> bool {
    NESTED_FIELDS.contains(&name)
}

pub(crate) fn list_item_tag(name: &str) -> Option<&'static str> {
    LIST_FIELDS
        .iter()
        .find(|(field, _)| *field == name)
        .map(|(_, item)| *item)
}

#[derive(Debug, Error)]
pub enum WireError {
    /// The body could not be parsed as a tag-based document. Callers that
    /// want the legacy drop-to-empty behavior use [`decode_lossy`] instead.
    #[error("malformed XML document: {0}")]
    Malformed(String),
    #[error("invalid element name `{0}`")]
    InvalidName(String),
    #[error("XML encoding failed: {0}")]
    Encode(String),
}

impl WireError {
    pub(crate) fn malformed(err: impl std::fmt::Display) -> Self {
        Self::Malformed(err.to_string())
    }

    pub(crate) fn encode_failed(err: impl std::fmt::Display) -> Self {
        Self::Encode(err.to_string())
    }
}

/// One decoded field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Scalar text content. Empty elements decode as the empty string.
    Text(String),
    /// A nested container: the tag/text pairs of its direct children.
    Section(Vec<(String, String)>),
    /// A repeated-item container: the text of each same-named child tag.
    List(Vec<String>),
}

/// A decoded tag-based document: top-level fields in document order. The
/// root element's own name carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WireDoc {
    fields: Vec<(String, WireValue)>,
}

impl WireDoc {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub(crate) fn push(&mut self, name: String, value: WireValue) {
        self.fields.push((name, value));
    }

    fn get(&self, name: &str) -> Option<&WireValue> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    /// Scalar field lookup; `None` when absent or not a scalar.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(WireValue::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn section(&self, name: &str) -> Option<&[(String, String)]> {
        match self.get(name) {
            Some(WireValue::Section(fields)) => Some(fields.as_slice()),
            _ => None,
        }
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        match self.get(name) {
            Some(WireValue::List(items)) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WireValue)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value))
    }
}
