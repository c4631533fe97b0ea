use std::collections::BTreeSet;

use crate::error::{DashError, Result};
use crate::models::{Dataset, Transaction};

/// Default step for nudging a discount bound.
pub const DEFAULT_DISCOUNT_STEP: f64 = 0.01;

/// User-controlled predicates over the dataset. Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterState {
    pub categories: BTreeSet<String>,
    pub regions: BTreeSet<String>,
    pub discount_lo: f64,
    pub discount_hi: f64,
}

/// Rows that satisfy every predicate, in original order.
#[derive(Debug, Clone)]
pub struct FilteredView<'a> {
    pub rows: Vec<&'a Transaction>,
}

impl<'a> FilteredView<'a> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, f: impl Fn(&Transaction) -> f64) -> Vec<f64> {
        self.rows.iter().map(|r| f(r)).collect()
    }
}

/// Initial filter values taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct FilterArgs {
    pub categories: Vec<String>,
    pub regions: Vec<String>,
    pub min_discount: Option<f64>,
    pub max_discount: Option<f64>,
}

impl FilterState {
    /// Everything selected, discount range spanning the whole dataset.
    pub fn defaults(dataset: &Dataset) -> Self {
        let (lo, hi) = dataset.discount_bounds();
        Self {
            categories: dataset.categories.iter().cloned().collect(),
            regions: dataset.regions.iter().cloned().collect(),
            discount_lo: lo,
            discount_hi: hi,
        }
    }

    /// Defaults overridden by whatever the user passed at startup.
    pub fn from_args(dataset: &Dataset, args: &FilterArgs) -> Result<Self> {
        let mut state = Self::defaults(dataset);
        if !args.categories.is_empty() {
            state.categories = args.categories.iter().cloned().collect();
        }
        if !args.regions.is_empty() {
            state.regions = args.regions.iter().cloned().collect();
        }
        if let Some(lo) = args.min_discount {
            state.discount_lo = lo;
        }
        if let Some(hi) = args.max_discount {
            state.discount_hi = hi;
        }
        if state.discount_lo > state.discount_hi {
            return Err(DashError::Other(format!(
                "--min-discount ({}) is greater than --max-discount ({})",
                state.discount_lo, state.discount_hi
            )));
        }
        Ok(state)
    }

    pub fn matches(&self, row: &Transaction) -> bool {
        self.categories.contains(&row.category)
            && self.regions.contains(&row.region)
            && self.discount_lo <= row.discount
            && row.discount <= self.discount_hi
    }

    /// Select the rows of `dataset` matching all three predicates. Does not
    /// modify the dataset; the same state always yields the same view.
    pub fn apply<'a>(&self, dataset: &'a Dataset) -> FilteredView<'a> {
        let rows: Vec<&Transaction> = dataset.rows.iter().filter(|r| self.matches(r)).collect();
        tracing::debug!(selected = rows.len(), total = dataset.rows.len(), "filter applied");
        FilteredView { rows }
    }

    pub fn toggle_category(&mut self, name: &str) {
        toggle(&mut self.categories, name);
    }

    pub fn toggle_region(&mut self, name: &str) {
        toggle(&mut self.regions, name);
    }

    /// Move the lower bound by `delta`, keeping it within the dataset bounds
    /// and not above the upper bound.
    pub fn nudge_lo(&mut self, delta: f64, bounds: (f64, f64)) {
        let next = round_step(self.discount_lo + delta);
        self.discount_lo = next.max(bounds.0).min(self.discount_hi);
    }

    /// Move the upper bound by `delta`, keeping it within the dataset bounds
    /// and not below the lower bound.
    pub fn nudge_hi(&mut self, delta: f64, bounds: (f64, f64)) {
        let next = round_step(self.discount_hi + delta);
        self.discount_hi = next.min(bounds.1).max(self.discount_lo);
    }

    pub fn is_default(&self, dataset: &Dataset) -> bool {
        *self == Self::defaults(dataset)
    }
}

fn toggle(set: &mut BTreeSet<String>, name: &str) {
    if !set.remove(name) {
        set.insert(name.to_string());
    }
}

// Keeps repeated nudges from accumulating float noise like 0.30000000000000004.
fn round_step(v: f64) -> f64 {
    (v * 1e6).round() / 1e6
}
