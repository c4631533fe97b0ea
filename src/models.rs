use chrono::NaiveDate;

/// Source fields of one input row after column normalization and coercion.
#[derive(Debug, Clone)]
pub struct SourceRow {
    pub price: f64,
    pub quantity: f64,
    pub discount: f64,
    pub category: String,
    pub region: String,
    pub order_date: Option<NaiveDate>,
    /// Every source cell as text, aligned with `Dataset::columns`.
    pub raw: Vec<String>,
}

/// One transaction record with its derived financial columns.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub price: f64,
    pub quantity: f64,
    pub discount: f64,
    pub category: String,
    pub region: String,
    pub order_date: Option<NaiveDate>,
    pub raw: Vec<String>,
    pub revenue: f64,
    pub discount_value: f64,
    pub profit: f64,
    pub profit_margin: f64,
}

impl Transaction {
    /// `discount > 0`. NaN discounts count as not discounted.
    pub fn is_discounted(&self) -> bool {
        self.discount > 0.0
    }
}

/// The loaded, derived, read-only table.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub source: String,
    /// Normalized (trimmed, lowercased) source column names.
    pub columns: Vec<String>,
    pub rows: Vec<Transaction>,
    /// Distinct categories in order of first appearance.
    pub categories: Vec<String>,
    /// Distinct regions in order of first appearance.
    pub regions: Vec<String>,
    /// Number of non-empty `order_date` cells that failed to parse.
    pub date_parse_warnings: usize,
    pub has_order_date: bool,
}

impl Dataset {
    /// Build a dataset from already-derived rows, computing the distinct
    /// category and region lists.
    pub fn from_rows(source: impl Into<String>, columns: Vec<String>, rows: Vec<Transaction>) -> Self {
        let mut categories: Vec<String> = Vec::new();
        let mut regions: Vec<String> = Vec::new();
        for row in &rows {
            if !categories.contains(&row.category) {
                categories.push(row.category.clone());
            }
            if !regions.contains(&row.region) {
                regions.push(row.region.clone());
            }
        }
        let has_order_date = columns.iter().any(|c| c == "order_date");
        Self {
            source: source.into(),
            columns,
            rows,
            categories,
            regions,
            date_parse_warnings: 0,
            has_order_date,
        }
    }

    /// Min and max discount over the whole dataset, ignoring NaN.
    /// `(0.0, 0.0)` when there is no finite discount.
    pub fn discount_bounds(&self) -> (f64, f64) {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for d in self.rows.iter().map(|r| r.discount).filter(|d| !d.is_nan()) {
            lo = lo.min(d);
            hi = hi.max(d);
        }
        if lo > hi {
            (0.0, 0.0)
        } else {
            (lo, hi)
        }
    }
}
