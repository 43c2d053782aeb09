//! View configuration.

use serde::{Deserialize, Serialize};

use crate::record::Record;
use crate::Document;

/// Settings for an [`InventoryView`](crate::InventoryView).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Store collection holding the records.
    pub collection: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            collection: Record::COLLECTION.to_string(),
        }
    }
}

impl ViewConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Parse from JSON. Missing keys take their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
