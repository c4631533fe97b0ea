use crate::filter::FilteredView;
use crate::fmt::decimal;
use crate::loader::DATE_COLUMN;
use crate::models::Transaction;
use crate::stats;

pub const PREVIEW_ROWS: usize = 10;
pub const HISTOGRAM_BINS: usize = 25;
pub const DERIVED_COLUMNS: &[&str] = &["revenue", "discount_value", "profit", "profit_margin"];

// ---------------------------------------------------------------------------
// Headline metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HeadlineMetrics {
    pub row_count: usize,
    pub avg_discount: f64,
    pub total_revenue: f64,
    pub total_profit: f64,
    pub avg_profit_margin: f64,
}

pub fn headline_metrics(view: &FilteredView) -> HeadlineMetrics {
    HeadlineMetrics {
        row_count: view.len(),
        avg_discount: stats::mean(&view.column(|r| r.discount)),
        total_revenue: stats::sum(&view.column(|r| r.revenue)),
        total_profit: stats::sum(&view.column(|r| r.profit)),
        avg_profit_margin: stats::mean(&view.column(|r| r.profit_margin)),
    }
}

// ---------------------------------------------------------------------------
// Preview table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PreviewTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Typed columns render from the coerced fields; other columns return `None`.
fn coerced_cell(column: &str, r: &Transaction) -> Option<String> {
    let cell = match column {
        "price" => decimal(r.price, 2),
        "quantity" => decimal(r.quantity, 2),
        "discount" => decimal(r.discount, 3),
        "category" => r.category.clone(),
        "region" => r.region.clone(),
        DATE_COLUMN => r
            .order_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        _ => return None,
    };
    Some(cell)
}

/// First `limit` rows of the view: source cells followed by derived columns.
pub fn preview(source_columns: &[String], view: &FilteredView, limit: usize) -> PreviewTable {
    let mut columns: Vec<String> = source_columns.to_vec();
    columns.extend(DERIVED_COLUMNS.iter().map(|c| c.to_string()));

    let rows = view
        .rows
        .iter()
        .take(limit)
        .map(|r| {
            let mut cells: Vec<String> = source_columns
                .iter()
                .enumerate()
                .map(|(i, column)| {
                    coerced_cell(column, r)
                        .unwrap_or_else(|| r.raw.get(i).cloned().unwrap_or_default())
                })
                .collect();
            cells.push(decimal(r.revenue, 2));
            cells.push(decimal(r.discount_value, 2));
            cells.push(decimal(r.profit, 2));
            cells.push(decimal(r.profit_margin, 4));
            cells
        })
        .collect();

    PreviewTable { columns, rows }
}

// ---------------------------------------------------------------------------
// Discount histogram
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HistogramSeries {
    pub name: String,
    pub counts: Vec<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct DiscountHistogram {
    /// `bins + 1` edges; empty when the view has no discount values.
    pub edges: Vec<f64>,
    pub series: Vec<HistogramSeries>,
}

impl DiscountHistogram {
    pub fn bin_count(&self) -> usize {
        self.edges.len().saturating_sub(1)
    }

    pub fn totals(&self) -> Vec<u64> {
        let mut totals = vec![0; self.bin_count()];
        for s in &self.series {
            for (t, c) in totals.iter_mut().zip(&s.counts) {
                *t += c;
            }
        }
        totals
    }
}

/// Equal-width bins over the view's discount range, counts split by category.
/// The last bin is closed on the right so the maximum is counted.
pub fn discount_histogram(view: &FilteredView, bins: usize) -> DiscountHistogram {
    if view.is_empty() {
        return DiscountHistogram::default();
    }
    let values = stats::sorted(&view.column(|r| r.discount));
    let (Some(&first), Some(&last)) = (values.first(), values.last()) else {
        return DiscountHistogram::default();
    };
    let bins = bins.max(1);
    let (lo, hi) = if first == last {
        (first - 0.5, last + 0.5)
    } else {
        (first, last)
    };
    let width = (hi - lo) / bins as f64;
    let edges: Vec<f64> = (0..=bins).map(|i| lo + width * i as f64).collect();

    let mut series: Vec<HistogramSeries> = Vec::new();
    for row in view.rows.iter().filter(|r| !r.discount.is_nan()) {
        let idx = (((row.discount - lo) / width).floor() as usize).min(bins - 1);
        let pos = match series.iter().position(|s| s.name == row.category) {
            Some(p) => p,
            None => {
                series.push(HistogramSeries {
                    name: row.category.clone(),
                    counts: vec![0; bins],
                });
                series.len() - 1
            }
        };
        series[pos].counts[idx] += 1;
    }

    DiscountHistogram { edges, series }
}

// ---------------------------------------------------------------------------
// Scatter plots
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ScatterSeries {
    pub name: String,
    pub points: Vec<(f64, f64)>,
}

#[derive(Debug, Clone)]
pub struct ScatterPlot {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub series: Vec<ScatterSeries>,
}

impl ScatterPlot {
    /// `(x_min, x_max, y_min, y_max)` over all points, `None` when empty.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self.series.iter().flat_map(|s| s.points.iter());
        let &(x0, y0) = points.next()?;
        Some(points.fold((x0, x0, y0, y0), |(a, b, c, d), &(x, y)| {
            (a.min(x), b.max(x), c.min(y), d.max(y))
        }))
    }
}

fn scatter(
    view: &FilteredView,
    title: &'static str,
    y_label: &'static str,
    y: impl Fn(&Transaction) -> f64,
    group: impl Fn(&Transaction) -> &str,
) -> ScatterPlot {
    let mut series: Vec<ScatterSeries> = Vec::new();
    for row in &view.rows {
        let point = (row.discount, y(row));
        if !point.0.is_finite() || !point.1.is_finite() {
            continue;
        }
        let name = group(row);
        match series.iter_mut().find(|s| s.name == name) {
            Some(s) => s.points.push(point),
            None => series.push(ScatterSeries {
                name: name.to_string(),
                points: vec![point],
            }),
        }
    }
    ScatterPlot {
        title,
        x_label: "discount",
        y_label,
        series,
    }
}

/// Discount vs revenue, one series per category.
pub fn revenue_scatter(view: &FilteredView) -> ScatterPlot {
    scatter(view, "Revenue vs Discount", "revenue", |r| r.revenue, |r| r.category.as_str())
}

/// Discount vs profit, one series per region.
pub fn profit_scatter(view: &FilteredView) -> ScatterPlot {
    scatter(view, "Profit vs Discount", "profit", |r| r.profit, |r| r.region.as_str())
}

// ---------------------------------------------------------------------------
// Discount by region (box plot)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BoxStats {
    pub group: String,
    pub count: usize,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    /// Furthest observations within 1.5 IQR of the box.
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: usize,
}

pub fn box_stats(group: &str, values: &[f64]) -> BoxStats {
    let sorted = stats::sorted(values);
    let q1 = stats::quantile_sorted(&sorted, 0.25);
    let median = stats::quantile_sorted(&sorted, 0.5);
    let q3 = stats::quantile_sorted(&sorted, 0.75);
    let iqr = q3 - q1;
    let lo_fence = q1 - 1.5 * iqr;
    let hi_fence = q3 + 1.5 * iqr;
    let inside: Vec<f64> = sorted
        .iter()
        .copied()
        .filter(|v| *v >= lo_fence && *v <= hi_fence)
        .collect();
    BoxStats {
        group: group.to_string(),
        count: sorted.len(),
        min: sorted.first().copied().unwrap_or(f64::NAN),
        q1,
        median,
        q3,
        max: sorted.last().copied().unwrap_or(f64::NAN),
        lower_whisker: inside.first().copied().unwrap_or(f64::NAN),
        upper_whisker: inside.last().copied().unwrap_or(f64::NAN),
        outliers: sorted.len() - inside.len(),
    }
}

/// Discount distribution per region, regions in order of first appearance.
pub fn discount_by_region(view: &FilteredView) -> Vec<BoxStats> {
    let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
    for row in &view.rows {
        match groups.iter_mut().find(|(name, _)| *name == row.region) {
            Some((_, values)) => values.push(row.discount),
            None => groups.push((row.region.clone(), vec![row.discount])),
        }
    }
    groups
        .iter()
        .map(|(name, values)| box_stats(name, values))
        .collect()
}

// ---------------------------------------------------------------------------
// Profit by category, discounted vs non-discounted
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryProfit {
    pub category: String,
    /// Mean profit of rows with `discount > 0`; `None` when there are none.
    pub discounted: Option<f64>,
    /// Mean profit of the remaining rows; `None` when there are none.
    pub non_discounted: Option<f64>,
}

/// Mean profit per (category, discounted) pair, categories sorted by name.
pub fn profit_by_category(view: &FilteredView) -> Vec<CategoryProfit> {
    let mut categories: Vec<&str> = view.rows.iter().map(|r| r.category.as_str()).collect();
    categories.sort_unstable();
    categories.dedup();

    categories
        .into_iter()
        .map(|cat| {
            let in_cat = view.rows.iter().filter(|r| r.category == cat);
            let (disc, non): (Vec<&&Transaction>, Vec<&&Transaction>) =
                in_cat.partition(|r| r.is_discounted());
            let mean_profit = |rows: &[&&Transaction]| {
                if rows.is_empty() {
                    None
                } else {
                    let profits: Vec<f64> = rows.iter().map(|r| r.profit).collect();
                    Some(stats::mean(&profits))
                }
            };
            CategoryProfit {
                category: cat.to_string(),
                discounted: mean_profit(&disc),
                non_discounted: mean_profit(&non),
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Correlation heatmap
// ---------------------------------------------------------------------------

pub const CORRELATION_COLUMNS: [&str; 4] = ["discount", "revenue", "profit", "quantity"];

#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub labels: [&'static str; 4],
    pub values: [[f64; 4]; 4],
}

pub fn correlation(view: &FilteredView) -> CorrelationMatrix {
    let columns = [
        view.column(|r| r.discount),
        view.column(|r| r.revenue),
        view.column(|r| r.profit),
        view.column(|r| r.quantity),
    ];
    let mut values = [[f64::NAN; 4]; 4];
    for i in 0..4 {
        for j in i..4 {
            let c = stats::pearson(&columns[i], &columns[j]);
            values[i][j] = c;
            values[j][i] = c;
        }
    }
    CorrelationMatrix {
        labels: CORRELATION_COLUMNS,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::sample;
    use crate::filter::FilterState;
    use crate::models::Dataset;

    fn two_rows() -> Dataset {
        Dataset::from_rows(
            "test",
            vec![
                "price".into(),
                "quantity".into(),
                "discount".into(),
                "category".into(),
                "region".into(),
            ],
            vec![
                sample(100.0, 2.0, 0.1, "A", "X"),
                sample(50.0, 1.0, 0.0, "B", "Y"),
            ],
        )
    }

    fn mixed() -> Dataset {
        Dataset::from_rows(
            "test",
            vec![],
            vec![
                sample(10.0, 1.0, 0.0, "Sports", "North"),
                sample(10.0, 2.0, 0.2, "Books", "South"),
                sample(20.0, 1.0, 0.4, "Sports", "North"),
                sample(30.0, 3.0, 0.0, "Books", "North"),
                sample(5.0, 4.0, 0.1, "Sports", "South"),
            ],
        )
    }

    #[test]
    fn test_metrics_two_row_example() {
        let ds = two_rows();
        let view = FilterState::defaults(&ds).apply(&ds);
        let m = headline_metrics(&view);
        assert!((m.avg_discount - 0.05).abs() < 1e-12);
        assert_eq!(m.total_revenue, 250.0);
        assert!((m.total_profit - 230.0).abs() < 1e-9);
        assert!((m.avg_profit_margin - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_metrics_on_empty_view() {
        let ds = two_rows();
        let mut state = FilterState::defaults(&ds);
        state.categories.clear();
        let view = state.apply(&ds);
        let m = headline_metrics(&view);
        assert_eq!(m.row_count, 0);
        assert_eq!(m.total_revenue, 0.0);
        assert_eq!(m.total_profit, 0.0);
        assert!(m.avg_discount.is_nan());
        assert!(m.avg_profit_margin.is_nan());
    }

    #[test]
    fn test_metrics_skip_nan_margin() {
        let ds = Dataset::from_rows(
            "test",
            vec![],
            vec![sample(0.0, 1.0, 0.1, "A", "X"), sample(10.0, 1.0, 0.5, "A", "X")],
        );
        let view = FilterState::defaults(&ds).apply(&ds);
        let m = headline_metrics(&view);
        assert_eq!(m.avg_profit_margin, 0.5);
    }

    #[test]
    fn test_preview_appends_derived_columns() {
        let ds = two_rows();
        let view = FilterState::defaults(&ds).apply(&ds);
        let p = preview(&ds.columns, &view, PREVIEW_ROWS);
        assert_eq!(p.columns.len(), 9);
        assert_eq!(p.columns[5], "revenue");
        assert_eq!(p.rows.len(), 2);
        assert_eq!(p.rows[0][5], "200.00");
        assert_eq!(p.rows[0][8], "0.9000");
    }

    #[test]
    fn test_preview_shows_coerced_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.csv");
        std::fs::write(
            &path,
            "price,quantity,discount,category,region,order_date,note\n\
             \"$1,000\",1,0.1,A,X,garbage,first\n\
             20,2,0,B,Y,2024-05-01,second\n",
        )
        .unwrap();
        let ds = crate::loader::load_dataset(&path).unwrap();
        let view = FilterState::defaults(&ds).apply(&ds);
        let p = preview(&ds.columns, &view, PREVIEW_ROWS);

        assert_eq!(&p.rows[0][..7], ["1000.00", "1.00", "0.100", "A", "X", "", "first"]);
        assert_eq!(p.rows[0][7], "1000.00");
        assert_eq!(p.rows[1][5], "2024-05-01");
        assert_eq!(p.rows[1][6], "second");
    }

    #[test]
    fn test_preview_limits_rows_in_order() {
        let rows = (0..15)
            .map(|i| sample(i as f64 + 1.0, 1.0, 0.0, "A", "X"))
            .collect();
        let ds = Dataset::from_rows("test", vec![], rows);
        let view = FilterState::defaults(&ds).apply(&ds);
        let p = preview(&ds.columns, &view, PREVIEW_ROWS);
        assert_eq!(p.rows.len(), 10);
        assert_eq!(p.rows[0][0], "1.00");
        assert_eq!(p.rows[9][0], "10.00");
    }

    #[test]
    fn test_histogram_counts_all_rows() {
        let ds = mixed();
        let view = FilterState::defaults(&ds).apply(&ds);
        let h = discount_histogram(&view, HISTOGRAM_BINS);
        assert_eq!(h.edges.len(), 26);
        assert_eq!(h.edges[0], 0.0);
        assert!((h.edges[25] - 0.4).abs() < 1e-12);
        assert_eq!(h.totals().iter().sum::<u64>(), 5);
        // max value lands in the last bin
        assert_eq!(h.totals()[24], 1);
        assert_eq!(h.totals()[0], 2);
        assert_eq!(h.series[0].name, "Sports");
        assert_eq!(h.series[0].counts.iter().sum::<u64>(), 3);
    }

    #[test]
    fn test_histogram_single_value_and_empty() {
        let ds = Dataset::from_rows("test", vec![], vec![sample(1.0, 1.0, 0.2, "A", "X")]);
        let view = FilterState::defaults(&ds).apply(&ds);
        let h = discount_histogram(&view, 25);
        assert_eq!(h.totals().iter().sum::<u64>(), 1);

        let empty = FilteredView { rows: vec![] };
        let h = discount_histogram(&empty, 25);
        assert_eq!(h.bin_count(), 0);
        assert!(h.series.is_empty());
    }

    #[test]
    fn test_scatter_groups() {
        let ds = mixed();
        let view = FilterState::defaults(&ds).apply(&ds);
        let rev = revenue_scatter(&view);
        assert_eq!(rev.series.len(), 2);
        assert_eq!(rev.series[0].name, "Sports");
        assert_eq!(rev.series[0].points[1], (0.4, 20.0));
        let prof = profit_scatter(&view);
        assert_eq!(prof.series[0].name, "North");
        assert_eq!(prof.series[0].points.len(), 3);
        assert_eq!(rev.bounds(), Some((0.0, 0.4, 10.0, 90.0)));
        assert_eq!(revenue_scatter(&FilteredView { rows: vec![] }).bounds(), None);
    }

    #[test]
    fn test_box_stats() {
        let b = box_stats("X", &[0.1, 0.2, 0.3, 0.4, 5.0]);
        assert_eq!(b.count, 5);
        assert_eq!(b.median, 0.3);
        assert!((b.q1 - 0.2).abs() < 1e-12);
        assert!((b.q3 - 0.4).abs() < 1e-12);
        assert_eq!(b.upper_whisker, 0.4);
        assert_eq!(b.lower_whisker, 0.1);
        assert_eq!(b.outliers, 1);
        assert_eq!(b.max, 5.0);
    }

    #[test]
    fn test_discount_by_region_order() {
        let ds = mixed();
        let view = FilterState::defaults(&ds).apply(&ds);
        let boxes = discount_by_region(&view);
        assert_eq!(boxes.len(), 2);
        assert_eq!(boxes[0].group, "North");
        assert_eq!(boxes[0].count, 3);
        assert_eq!(boxes[1].group, "South");
    }

    #[test]
    fn test_profit_by_category() {
        let ds = mixed();
        let view = FilterState::defaults(&ds).apply(&ds);
        let bars = profit_by_category(&view);
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].category, "Books");
        assert_eq!(bars[0].non_discounted, Some(90.0));
        assert!((bars[0].discounted.unwrap() - 16.0).abs() < 1e-9);
        assert_eq!(bars[1].category, "Sports");
        assert_eq!(bars[1].non_discounted, Some(10.0));
        // (12 + 18) / 2
        assert!((bars[1].discounted.unwrap() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_profit_by_category_missing_group() {
        let ds = two_rows();
        let view = FilterState::defaults(&ds).apply(&ds);
        let bars = profit_by_category(&view);
        assert_eq!(bars[0].non_discounted, None);
        assert_eq!(bars[1].discounted, None);
    }

    #[test]
    fn test_correlation_matrix() {
        let ds = mixed();
        let view = FilterState::defaults(&ds).apply(&ds);
        let c = correlation(&view);
        for i in 0..4 {
            assert!((c.values[i][i] - 1.0).abs() < 1e-12);
            for j in 0..4 {
                assert_eq!(c.values[i][j], c.values[j][i]);
            }
        }
        assert!(c.values[1][2] > 0.9);
    }

    #[test]
    fn test_correlation_on_empty_view() {
        let c = correlation(&FilteredView { rows: vec![] });
        assert!(c.values.iter().flatten().all(|v| v.is_nan()));
    }
}
