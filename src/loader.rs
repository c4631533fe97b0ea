use std::path::Path;
use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};

use crate::derive::derive;
use crate::error::{DashError, Result};
use crate::models::{Dataset, SourceRow};

pub const REQUIRED_COLUMNS: [&str; 5] = ["price", "quantity", "discount", "category", "region"];
pub const DATE_COLUMN: &str = "order_date";

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn normalize_column(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Coerce a numeric cell. Empty or unparseable cells become NaN.
pub fn parse_number(raw: &str) -> f64 {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    if s.is_empty() {
        return f64::NAN;
    }
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return inner.trim().parse::<f64>().map(|v| -v).unwrap_or(f64::NAN);
    }
    s.parse().unwrap_or(f64::NAN)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse an order date, returning `None` for anything unrecognized.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    // Fractional seconds / offsets: keep only the leading date-time part.
    let head = raw.get(..19).unwrap_or(raw);
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(head, fmt) {
            return Some(dt.date());
        }
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    None
}

fn column_index(columns: &[String], name: &str) -> Result<usize> {
    columns
        .iter()
        .position(|c| c == name)
        .ok_or_else(|| DashError::MissingColumn(name.to_string()))
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Read a CSV file, normalize its header, coerce the typed columns and derive
/// the financial columns for every row.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    if !path.exists() {
        return Err(DashError::MissingInput(path.to_path_buf()));
    }

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let columns: Vec<String> = reader.headers()?.iter().map(normalize_column).collect();

    let mut required = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = column_index(&columns, name)?;
    }
    let [price_idx, quantity_idx, discount_idx, category_idx, region_idx] = required;
    let date_idx = columns.iter().position(|c| c == DATE_COLUMN);

    let mut rows = Vec::new();
    let mut date_parse_warnings = 0;

    for record in reader.records() {
        let record = record?;
        let cell = |i: usize| record.get(i).unwrap_or("");

        let order_date = match date_idx {
            Some(i) => {
                let raw = cell(i);
                let parsed = parse_date(raw);
                if parsed.is_none() && !raw.trim().is_empty() {
                    date_parse_warnings += 1;
                }
                parsed
            }
            None => None,
        };

        let raw: Vec<String> = (0..columns.len()).map(|i| cell(i).to_string()).collect();

        rows.push(derive(SourceRow {
            price: parse_number(cell(price_idx)),
            quantity: parse_number(cell(quantity_idx)),
            discount: parse_number(cell(discount_idx)),
            category: cell(category_idx).to_string(),
            region: cell(region_idx).to_string(),
            order_date,
            raw,
        }));
    }

    let mut dataset = Dataset::from_rows(path.display().to_string(), columns, rows);
    dataset.date_parse_warnings = date_parse_warnings;

    tracing::info!(
        path = %path.display(),
        rows = dataset.rows.len(),
        categories = dataset.categories.len(),
        regions = dataset.regions.len(),
        "dataset loaded"
    );
    if date_parse_warnings > 0 {
        tracing::warn!(count = date_parse_warnings, "unparseable order_date values set to missing");
    }

    Ok(dataset)
}

// ---------------------------------------------------------------------------
// Process-wide cache
// ---------------------------------------------------------------------------

/// Holds the first successfully loaded dataset. Failed loads are not cached.
pub struct DatasetCache {
    cell: OnceLock<Dataset>,
}

impl DatasetCache {
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Return the cached dataset, loading it from `path` on first use.
    /// Once populated, later calls return the same dataset without touching disk.
    pub fn get_or_load(&self, path: &Path) -> Result<&Dataset> {
        if let Some(dataset) = self.cell.get() {
            return Ok(dataset);
        }
        let dataset = load_dataset(path)?;
        Ok(self.cell.get_or_init(|| dataset))
    }
}

static DATASET: DatasetCache = DatasetCache::new();

pub fn load_cached(path: &Path) -> Result<&'static Dataset> {
    DATASET.get_or_load(path)
}
