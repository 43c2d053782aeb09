//! View parameters - the user-controlled search, filter and sort state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Ordering applied to the filtered records before grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortMode {
    /// Keep filter-pass order.
    #[default]
    None,
    #[serde(rename = "sold_asc")]
    SoldPriceAsc,
    #[serde(rename = "sold_desc")]
    SoldPriceDesc,
    CountAsc,
    CountDesc,
}

impl SortMode {
    pub const ALL: [SortMode; 5] = [
        SortMode::None,
        SortMode::SoldPriceAsc,
        SortMode::SoldPriceDesc,
        SortMode::CountAsc,
        SortMode::CountDesc,
    ];

    /// Wire name used by sort controls.
    pub fn as_str(&self) -> &'static str {
        match self {
            SortMode::None => "none",
            SortMode::SoldPriceAsc => "sold_asc",
            SortMode::SoldPriceDesc => "sold_desc",
            SortMode::CountAsc => "count_asc",
            SortMode::CountDesc => "count_desc",
        }
    }
}

impl fmt::Display for SortMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown sort mode `{0}`")]
pub struct UnknownSortMode(pub String);

impl FromStr for SortMode {
    type Err = UnknownSortMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownSortMode(s.to_string()))
    }
}

/// Search, brand filter, sort mode and quantity ceiling.
///
/// `max_count: None` means "whatever the largest quantity in the mirror is
/// right now"; it is resolved at projection time, never stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ViewParameters {
    pub search_text: String,
    pub brand_filter: Option<String>,
    pub sort_mode: SortMode,
    pub max_count: Option<u64>,
}

impl ViewParameters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_search_text(&mut self, text: impl Into<String>) {
        self.search_text = text.into();
    }

    pub fn set_brand_filter(&mut self, brand: Option<String>) {
        self.brand_filter = brand;
    }

    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.sort_mode = mode;
    }

    pub fn set_max_count(&mut self, max_count: Option<u64>) {
        self.max_count = max_count;
    }

    /// Reset every field to its default in one step.
    pub fn clear_all(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}
