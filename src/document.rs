//! Documents - typed records stored under a string key in a named collection.
//!
//! The store only ever sees a key and a JSON object body ([`Fields`]). The key
//! is authoritative: it is never written into the body, and when a body is
//! turned back into a typed value the key overrides whatever id the body holds.
//!
//! ## Example
//!
//! ```ignore
//! use stockroom::Document;
//!
//! #[derive(Clone, Serialize, Deserialize, Document)]
//! #[document(collection = "equipment")]
//! struct Part {
//!     #[document(id)]
//!     pub code: String,
//!     pub name: String,
//! }
//! ```

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// A document body: the fields stored under a key.
pub type Fields = Map<String, Value>;

/// One document as delivered by the store: its key and body.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Fields,
}

impl StoredDocument {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}

/// Trait for types stored as documents.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Collection name (e.g. "equipment").
    const COLLECTION: &'static str;

    /// Name of the serialized field carrying the key.
    const ID_FIELD: &'static str;

    /// The document key.
    fn id(&self) -> &str;

    /// Serialize into a body, leaving the key out.
    fn to_fields(&self) -> Result<Fields, StoreError> {
        match serde_json::to_value(self)? {
            Value::Object(mut fields) => {
                fields.remove(Self::ID_FIELD);
                Ok(fields)
            }
            other => Err(StoreError::Serde(format!(
                "{} must serialize to an object, got {}",
                Self::COLLECTION,
                other
            ))),
        }
    }

    /// Rebuild from a key and body. The key wins over any id in the body.
    fn from_document(id: &str, mut fields: Fields) -> Result<Self, StoreError> {
        fields.insert(Self::ID_FIELD.to_string(), Value::String(id.to_string()));
        Ok(serde_json::from_value(Value::Object(fields))?)
    }
}
