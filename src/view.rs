use crate::filter::FilterState;
use crate::insights::{self, Insights};
use crate::models::Dataset;
use crate::reports::{
    self, BoxStats, CategoryProfit, CorrelationMatrix, DiscountHistogram, HeadlineMetrics,
    PreviewTable, ScatterPlot, HISTOGRAM_BINS, PREVIEW_ROWS,
};

/// Everything a surface needs to draw one filter state. Owns its data, so it
/// can outlive the borrow of the dataset it was built from.
#[derive(Debug, Clone)]
pub struct ViewModel {
    pub total_rows: usize,
    pub metrics: HeadlineMetrics,
    pub preview: PreviewTable,
    pub histogram: DiscountHistogram,
    pub revenue_scatter: ScatterPlot,
    pub profit_scatter: ScatterPlot,
    pub region_boxes: Vec<BoxStats>,
    pub category_profit: Vec<CategoryProfit>,
    pub correlation: CorrelationMatrix,
    pub insights: Insights,
}

/// Build the full view model for `filter` over `dataset`.
pub fn render(dataset: &Dataset, filter: &FilterState) -> ViewModel {
    let view = filter.apply(dataset);
    ViewModel {
        total_rows: dataset.rows.len(),
        metrics: reports::headline_metrics(&view),
        preview: reports::preview(&dataset.columns, &view, PREVIEW_ROWS),
        histogram: reports::discount_histogram(&view, HISTOGRAM_BINS),
        revenue_scatter: reports::revenue_scatter(&view),
        profit_scatter: reports::profit_scatter(&view),
        region_boxes: reports::discount_by_region(&view),
        category_profit: reports::profit_by_category(&view),
        correlation: reports::correlation(&view),
        insights: insights::narrate(&view),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::sample;
    use crate::insights::DiscountComparison;

    fn dataset() -> Dataset {
        Dataset::from_rows(
            "test",
            vec![],
            vec![
                sample(100.0, 2.0, 0.1, "A", "X"),
                sample(50.0, 1.0, 0.0, "B", "Y"),
            ],
        )
    }

    #[test]
    fn test_render_defaults() {
        let ds = dataset();
        let vm = render(&ds, &FilterState::defaults(&ds));
        assert_eq!(vm.total_rows, 2);
        assert_eq!(vm.metrics.row_count, 2);
        assert_eq!(vm.preview.rows.len(), 2);
        assert_eq!(vm.histogram.bin_count(), HISTOGRAM_BINS);
        assert!(matches!(vm.insights.comparison, DiscountComparison::Compared { .. }));
    }

    #[test]
    fn test_render_empty_view_degrades() {
        let ds = dataset();
        let mut filter = FilterState::defaults(&ds);
        filter.regions.clear();
        let vm = render(&ds, &filter);
        assert_eq!(vm.metrics.row_count, 0);
        assert_eq!(vm.metrics.total_revenue, 0.0);
        assert!(vm.preview.rows.is_empty());
        assert_eq!(vm.histogram.bin_count(), 0);
        assert!(vm.revenue_scatter.series.is_empty());
        assert!(vm.region_boxes.is_empty());
        assert!(vm.category_profit.is_empty());
        assert_eq!(vm.insights.comparison, DiscountComparison::CannotCompare);
    }

    #[test]
    fn test_render_does_not_mutate_dataset() {
        let ds = dataset();
        let before: Vec<f64> = ds.rows.iter().map(|r| r.profit).collect();
        let mut filter = FilterState::defaults(&ds);
        filter.discount_lo = 0.05;
        let a = render(&ds, &filter);
        let b = render(&ds, &filter);
        assert_eq!(a.metrics.row_count, b.metrics.row_count);
        assert_eq!(a.preview.rows, b.preview.rows);
        let after: Vec<f64> = ds.rows.iter().map(|r| r.profit).collect();
        assert_eq!(before, after);
    }
}
