use crate::error::{DatabaseError, DatabaseErrorExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

/// Field map of a stored document.
pub type Fields = serde_json::Map<String, Value>;

/// Address of a document: collection name plus document key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentRef {
    collection: String,
    key: String,
}

impl DocumentRef {
    pub fn new(collection: impl Into<String>, key: impl Into<String>) -> Self {
        Self { collection: collection.into(), key: key.into() }
    }

    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.key)
    }
}

/// A snapshot of a stored document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    reference: DocumentRef,
    fields: Fields,
}

impl Document {
    #[must_use]
    pub const fn new(reference: DocumentRef, fields: Fields) -> Self {
        Self { reference, fields }
    }

    #[must_use]
    pub const fn reference(&self) -> &DocumentRef {
        &self.reference
    }

    /// Document key within its collection.
    #[must_use]
    pub fn id(&self) -> &str {
        self.reference.key()
    }

    #[must_use]
    pub const fn fields(&self) -> &Fields {
        &self.fields
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    #[must_use]
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Deserializes the field map into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DatabaseError> {
        serde_json::from_value(Value::Object(self.fields.clone()))
            .context(format!("Decoding {}", self.reference))
    }
}

/// Single-field predicate for [`crate::DocumentStore::query`].
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Field equals the value.
    Eq { field: String, value: Value },
    /// Field is an array holding the value.
    Contains { field: String, value: Value },
}

impl Filter {
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq { field: field.into(), value: value.into() }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Contains { field: field.into(), value: value.into() }
    }

    #[must_use]
    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Self::Eq { field, value } => fields.get(field) == Some(value),
            Self::Contains { field, value } => fields
                .get(field)
                .and_then(Value::as_array)
                .is_some_and(|items| items.contains(value)),
        }
    }
}

/// Shallow merge: every field in `patch` replaces the stored one.
pub(crate) fn merge(target: &mut Fields, patch: Fields) {
    for (name, value) in patch {
        target.insert(name, value);
    }
}
