//! Document addressing and query types.
//!
//! Documents live in named collections. A collection is either a root
//! collection (`events`, `users`) or a sub-collection nested under a parent
//! document (`events/{id}/registrations`). Addressing is purely path-based;
//! the store itself imposes no schema on document contents.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Address of a collection in the document store.
///
/// Paths always have an odd number of segments: a collection name, followed
/// by zero or more `(document id, sub-collection name)` pairs.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CollectionPath(String);

impl CollectionPath {
    /// A root collection such as `events` or `users`.
    #[must_use]
    pub fn root(collection: &str) -> Self {
        Self(collection.to_string())
    }

    /// A sub-collection nested under a document of this collection.
    #[must_use]
    pub fn subcollection(&self, document_id: &str, collection: &str) -> Self {
        Self(format!("{}/{document_id}/{collection}", self.0))
    }

    /// The full slash-separated path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored document: its key within the collection plus its JSON payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document key, unique within its collection.
    pub id: String,
    /// Document payload.
    pub data: Value,
}

impl Document {
    /// Creates a document from a key and payload.
    #[must_use]
    pub const fn new(id: String, data: Value) -> Self {
        Self { id, data }
    }

    /// Reads a top-level string field, if present and a string.
    #[must_use]
    pub fn str_field(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// Equality filter on a single top-level field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
    /// Field name to compare.
    pub field: String,
    /// Value the field must equal.
    pub equals: Value,
}

impl FieldFilter {
    /// Filter for documents whose `field` equals `value`.
    #[must_use]
    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            equals: value.into(),
        }
    }

    /// Whether the given document satisfies this filter.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        doc.data.get(&self.field) == Some(&self.equals)
    }
}

/// Ordering over a single top-level field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    /// Field name to order by.
    pub field: String,
    /// Ascending when true, descending otherwise.
    pub ascending: bool,
}

impl OrderBy {
    /// Ascending order on `field`.
    #[must_use]
    pub fn ascending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            ascending: true,
        }
    }

    /// Descending order on `field`.
    #[must_use]
    pub fn descending(field: &str) -> Self {
        Self {
            field: field.to_string(),
            ascending: false,
        }
    }
}
