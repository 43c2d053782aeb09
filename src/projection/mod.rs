//! Projections - the grouped, filtered, sorted view derived from the mirror.
//!
//! A projection is a pure function of a record set and [`ViewParameters`].
//! It is never patched in place; any change to either input produces a new
//! one. [`ProjectionCache`] memoizes the last result keyed by mirror revision
//! and parameters.
//!
//! ## Steps
//!
//! 1. distinct brands, sorted
//! 2. observed max count (0 when empty)
//! 3. effective ceiling = `max_count` or the observed max
//! 4. filter: search on id/name, brand, `count <= ceiling`
//! 5. sort by sort mode (stable)
//! 6. group by brand in first-seen order
//!
//! ## Example
//!
//! ```
//! use stockroom::{project, Record, ViewParameters};
//!
//! let records = vec![
//!     Record::new("A1", "Filter", "Acme"),
//!     Record::new("B2", "Valve", "Bosch"),
//! ];
//! let mut params = ViewParameters::new();
//! params.set_search_text("fil");
//!
//! let projection = project(&records, &params);
//! assert_eq!(projection.len(), 1);
//! assert_eq!(projection.groups[0].brand, "Acme");
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::params::{SortMode, ViewParameters};
use crate::record::Record;

/// Records sharing one brand, in projection order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandGroup {
    pub brand: String,
    pub records: Vec<Record>,
}

/// Label/value pair for a brand filter control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandOption {
    pub label: String,
    pub value: String,
}

/// Derived, read-only view of the mirror.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub groups: Vec<BrandGroup>,
    /// Every brand in the mirror, not just those that passed the filter.
    pub distinct_brands: Vec<String>,
    pub observed_max_count: u64,
    /// The ceiling the filter actually used.
    pub effective_max_count: u64,
}

impl Projection {
    /// Total number of records across all groups.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Records in projection order, groups flattened.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.groups.iter().flat_map(|g| g.records.iter())
    }

    pub fn group(&self, brand: &str) -> Option<&BrandGroup> {
        self.groups.iter().find(|g| g.brand == brand)
    }

    pub fn brand_options(&self) -> Vec<BrandOption> {
        self.distinct_brands
            .iter()
            .map(|brand| BrandOption {
                label: brand.clone(),
                value: brand.clone(),
            })
            .collect()
    }

    /// Upper bound for a quantity slider: the observed max, or 1 when that
    /// is 0 so the control still has a range.
    pub fn slider_ceiling(&self) -> u64 {
        self.observed_max_count.max(1)
    }
}

/// Compute the projection of `records` under `params`.
pub fn project(records: &[Record], params: &ViewParameters) -> Projection {
    let distinct_brands: Vec<String> = records
        .iter()
        .map(|r| r.brand.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let observed_max_count = records.iter().map(|r| r.count).max().unwrap_or(0);
    let effective_max_count = params.max_count.unwrap_or(observed_max_count);

    let mut filtered = filter(records, params, effective_max_count);
    sort(&mut filtered, params.sort_mode);

    Projection {
        groups: group_by_brand(filtered),
        distinct_brands,
        observed_max_count,
        effective_max_count,
    }
}

fn filter<'a>(records: &'a [Record], params: &ViewParameters, ceiling: u64) -> Vec<&'a Record> {
    let needle = params.search_text.to_lowercase();
    records
        .iter()
        .filter(|r| r.matches_search(&needle))
        .filter(|r| match &params.brand_filter {
            Some(brand) => r.brand == *brand,
            None => true,
        })
        .filter(|r| r.count <= ceiling)
        .collect()
}

fn sort(records: &mut [&Record], mode: SortMode) {
    match mode {
        SortMode::None => {}
        SortMode::SoldPriceAsc => records.sort_by(|a, b| a.sold_price.total_cmp(&b.sold_price)),
        SortMode::SoldPriceDesc => records.sort_by(|a, b| b.sold_price.total_cmp(&a.sold_price)),
        SortMode::CountAsc => records.sort_by_key(|r| r.count),
        SortMode::CountDesc => records.sort_by(|a, b| b.count.cmp(&a.count)),
    }
}

fn group_by_brand(records: Vec<&Record>) -> Vec<BrandGroup> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<BrandGroup> = Vec::new();

    for record in records {
        let slot = *index.entry(record.brand.as_str()).or_insert_with(|| {
            groups.push(BrandGroup {
                brand: record.brand.clone(),
                records: Vec::new(),
            });
            groups.len() - 1
        });
        groups[slot].records.push(record.clone());
    }

    groups
}

/// Memo of the last projection, keyed by mirror revision and parameters.
#[derive(Debug, Default)]
pub struct ProjectionCache {
    key: Option<(u64, ViewParameters)>,
    value: Arc<Projection>,
    computed: usize,
}

impl ProjectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached projection if `revision` and `params` match the last
    /// call, otherwise recompute from `records`.
    pub fn get_or_compute(
        &mut self,
        revision: u64,
        params: &ViewParameters,
        records: &[Record],
    ) -> Arc<Projection> {
        let fresh = matches!(&self.key, Some((rev, p)) if *rev == revision && p == params);
        if !fresh {
            self.value = Arc::new(project(records, params));
            self.key = Some((revision, params.clone()));
            self.computed += 1;
        }
        Arc::clone(&self.value)
    }

    /// How many times a projection was actually computed.
    pub fn computed(&self) -> usize {
        self.computed
    }

    pub fn invalidate(&mut self) {
        self.key = None;
    }
}
