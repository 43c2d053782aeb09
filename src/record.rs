//! The inventory record and the string-keyed form state that produces it.

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::Document;

/// One inventory item (spare part or piece of equipment).
///
/// The `id` is the store key. Bodies written by other clients may carry
/// numbers as strings, counts as floats, nulls, or leave fields out; those
/// are coerced on read with the same rules as form input.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, Document)]
#[document(collection = "equipment")]
#[serde(default, rename_all = "camelCase")]
pub struct Record {
    #[document(id)]
    pub id: String,
    #[serde(deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(deserialize_with = "lenient_text")]
    pub brand: String,
    #[serde(deserialize_with = "lenient_count")]
    pub count: u64,
    #[serde(deserialize_with = "lenient_price")]
    pub bought_price: f64,
    #[serde(deserialize_with = "lenient_price")]
    pub sold_price: f64,
}

impl Record {
    pub fn new(id: impl Into<String>, name: impl Into<String>, brand: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            brand: brand.into(),
            ..Self::default()
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = count;
        self
    }

    pub fn with_prices(mut self, bought_price: f64, sold_price: f64) -> Self {
        self.bought_price = coerce_price(bought_price);
        self.sold_price = coerce_price(sold_price);
        self
    }

    /// Case-insensitive substring match against `id` or `name`.
    pub fn matches_search(&self, needle_lowercase: &str) -> bool {
        needle_lowercase.is_empty()
            || self.id.to_lowercase().contains(needle_lowercase)
            || self.name.to_lowercase().contains(needle_lowercase)
    }
}

/// Parse a quantity typed by the user. Anything unparseable is zero.
///
/// Fractions are truncated and negatives clamp to zero.
pub fn parse_count(input: &str) -> u64 {
    match input.trim().parse::<f64>() {
        Ok(value) => coerce_count(value),
        Err(_) => 0,
    }
}

/// Parse a price typed by the user. Anything unparseable is zero.
pub fn parse_price(input: &str) -> f64 {
    match input.trim().parse::<f64>() {
        Ok(value) => coerce_price(value),
        Err(_) => 0.0,
    }
}

fn coerce_count(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.trunc() as u64
    } else {
        0
    }
}

fn coerce_price(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Scalar as another client may have written it.
#[derive(Deserialize)]
#[serde(untagged)]
enum Loose {
    Number(f64),
    Text(String),
    Flag(bool),
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Number(value)) => coerce_count(value),
        Some(Loose::Text(text)) => parse_count(&text),
        Some(Loose::Flag(_)) | None => 0,
    })
}

fn lenient_price<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Number(value)) => coerce_price(value),
        Some(Loose::Text(text)) => parse_price(&text),
        Some(Loose::Flag(_)) | None => 0.0,
    })
}

fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<Loose>::deserialize(deserializer)? {
        Some(Loose::Text(text)) => text,
        Some(Loose::Number(value)) => value.to_string(),
        Some(Loose::Flag(flag)) => flag.to_string(),
        None => String::new(),
    })
}

fn format_price(value: f64) -> String {
    format!("{}", value)
}

/// Form state for a new item, before trimming, parsing and validation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RecordDraft {
    pub id: String,
    pub name: String,
    pub brand: String,
    pub count: String,
    pub bought_price: String,
    pub sold_price: String,
}

impl RecordDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Turn the draft into a candidate record.
    ///
    /// `id`, `name` and `brand` must be non-empty after trimming and are
    /// checked in that order. Numeric fields never fail: bad input is zero.
    pub fn validate(&self) -> Result<Record, ValidationError> {
        let id = required("id", &self.id)?;
        let name = required("name", &self.name)?;
        let brand = required("brand", &self.brand)?;

        Ok(Record {
            id,
            name,
            brand,
            count: parse_count(&self.count),
            bought_price: parse_price(&self.bought_price),
            sold_price: parse_price(&self.sold_price),
        })
    }
}

fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(trimmed.to_string())
    }
}

/// Edit form state for an existing record. The id cannot be changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditDraft {
    id: String,
    pub name: String,
    pub brand: String,
    pub count: String,
    pub bought_price: String,
    pub sold_price: String,
}

impl EditDraft {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            brand: record.brand.clone(),
            count: record.count.to_string(),
            bought_price: format_price(record.bought_price),
            sold_price: format_price(record.sold_price),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Coerce every field to its type. Never fails.
    pub fn to_record(&self) -> Record {
        Record {
            id: self.id.clone(),
            name: self.name.clone(),
            brand: self.brand.clone(),
            count: parse_count(&self.count),
            bought_price: parse_price(&self.bought_price),
            sold_price: parse_price(&self.sold_price),
        }
    }
}

impl From<&Record> for EditDraft {
    fn from(record: &Record) -> Self {
        Self::from_record(record)
    }
}
