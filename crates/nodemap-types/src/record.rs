//! Mapped objects and the field-access capability.
//!
//! Strategies never reach into an object directly. They go through
//! [`FieldAccessor`], which a host type implements once from its own
//! declaration. [`Document`] is a ready-made dynamic record for callers that
//! do not have a concrete type.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::value::Value;

/// In-memory identity of a mapped object.
///
/// Objects refer to each other through keys, never through owning pointers.
/// The id registry turns a key into a resolved path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentKey(Uuid);

impl DocumentKey {
    /// Generate a fresh, time-ordered key (UUID v7).
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Wrap an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        write!(f, "doc:{}", &simple[simple.len() - 8..])
    }
}

/// How an object names its parent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParentRef {
    /// A mapped object whose path the id registry knows.
    Document(DocumentKey),
    /// An already-resolved absolute path.
    Path(String),
}

impl ParentRef {
    /// Interpret a parent field value.
    ///
    /// References name a document; non-empty strings are taken as paths.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Reference(key) => Some(Self::Document(*key)),
            Value::String(path) if !path.is_empty() => Some(Self::Path(path.clone())),
            _ => None,
        }
    }
}

/// Get/set capability over an object's named fields.
///
/// Unknown fields read as [`Value::Null`].
pub trait FieldAccessor {
    /// Stable in-memory key of this object.
    fn key(&self) -> DocumentKey;

    /// Read a field.
    fn get(&self, field: &str) -> Value;

    /// Write a field.
    fn set(&mut self, field: &str, value: Value);
}

/// A dynamic object: a class name plus a bag of named field values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    key: DocumentKey,
    class_name: String,
    fields: BTreeMap<String, Value>,
}

impl Document {
    /// Create an empty document of the given class with a fresh key.
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            key: DocumentKey::generate(),
            class_name: class_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Create an empty document with a known key, e.g. when loading.
    pub fn with_key(key: DocumentKey, class_name: impl Into<String>) -> Self {
        Self {
            key,
            class_name: class_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field assignment.
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value.into());
        self
    }

    /// Class this document is mapped as.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// All non-null fields in name order.
    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }
}

impl FieldAccessor for Document {
    fn key(&self) -> DocumentKey {
        self.key
    }

    fn get(&self, field: &str) -> Value {
        self.fields.get(field).cloned().unwrap_or_default()
    }

    fn set(&mut self, field: &str, value: Value) {
        if value.is_null() {
            self.fields.remove(field);
        } else {
            self.fields.insert(field.to_string(), value);
        }
    }
}
