use chrono::{Datelike, Month};

use crate::filter::FilteredView;
use crate::fmt::{money, percent};
use crate::models::Transaction;
use crate::stats;

/// Discounted (`discount > 0`) vs non-discounted (`discount == 0`) comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscountComparison {
    /// Percent change in mean quantity, and margin difference in percentage points.
    Compared { sales_boost: f64, profit_diff: f64 },
    /// No non-discounted rows to compare against.
    CannotCompare,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Success,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsightLine {
    pub tone: Tone,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeasonalPeak {
    pub month: u32,
    pub avg_discount: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insights {
    pub comparison: DiscountComparison,
    pub seasonal_peak: Option<SeasonalPeak>,
    /// Category with the highest mean profit among discounted rows.
    pub top_discounted_category: Option<(String, f64)>,
}

fn mean_of(rows: &[&Transaction], f: impl Fn(&Transaction) -> f64) -> f64 {
    let values: Vec<f64> = rows.iter().map(|r| f(r)).collect();
    stats::mean(&values)
}

pub fn compare_discounts(view: &FilteredView) -> DiscountComparison {
    let discounted: Vec<&Transaction> = view.rows.iter().copied().filter(|r| r.discount > 0.0).collect();
    let non_discounted: Vec<&Transaction> =
        view.rows.iter().copied().filter(|r| r.discount == 0.0).collect();

    if non_discounted.is_empty() {
        return DiscountComparison::CannotCompare;
    }

    let qty_disc = mean_of(&discounted, |r| r.quantity);
    let qty_non = mean_of(&non_discounted, |r| r.quantity);
    let margin_disc = mean_of(&discounted, |r| r.profit_margin);
    let margin_non = mean_of(&non_discounted, |r| r.profit_margin);

    DiscountComparison::Compared {
        sales_boost: (qty_disc - qty_non) / qty_non * 100.0,
        profit_diff: (margin_disc - margin_non) * 100.0,
    }
}

/// Calendar month with the highest mean discount among dated rows.
pub fn seasonal_peak(view: &FilteredView) -> Option<SeasonalPeak> {
    let mut by_month: [Vec<f64>; 12] = Default::default();
    for row in &view.rows {
        if let Some(date) = row.order_date {
            by_month[date.month0() as usize].push(row.discount);
        }
    }
    by_month
        .iter()
        .enumerate()
        .map(|(i, values)| (i as u32 + 1, stats::mean(values)))
        .filter(|(_, avg)| !avg.is_nan())
        .fold(None, |best: Option<SeasonalPeak>, (month, avg)| match best {
            Some(b) if b.avg_discount >= avg => Some(b),
            _ => Some(SeasonalPeak {
                month,
                avg_discount: avg,
            }),
        })
}

pub fn top_discounted_category(view: &FilteredView) -> Option<(String, f64)> {
    let mut groups: Vec<(&str, Vec<f64>)> = Vec::new();
    for row in view.rows.iter().filter(|r| r.is_discounted()) {
        match groups.iter_mut().find(|(name, _)| *name == row.category) {
            Some((_, profits)) => profits.push(row.profit),
            None => groups.push((row.category.as_str(), vec![row.profit])),
        }
    }
    groups
        .into_iter()
        .map(|(name, profits)| (name, stats::mean(&profits)))
        .filter(|(_, avg)| !avg.is_nan())
        .fold(None, |best: Option<(String, f64)>, (name, avg)| match best {
            Some(b) if b.1 >= avg => Some(b),
            _ => Some((name.to_string(), avg)),
        })
}

pub fn narrate(view: &FilteredView) -> Insights {
    Insights {
        comparison: compare_discounts(view),
        seasonal_peak: seasonal_peak(view),
        top_discounted_category: top_discounted_category(view),
    }
}

impl Insights {
    pub fn lines(&self) -> Vec<InsightLine> {
        let mut lines = Vec::new();
        match self.comparison {
            DiscountComparison::Compared {
                sales_boost,
                profit_diff,
            } => {
                let text = if sales_boost.is_finite() {
                    let verb = if sales_boost >= 0.0 { "increase" } else { "decrease" };
                    format!(
                        "Discounts {verb} average quantity sold by {:.1}% on average.",
                        sales_boost.abs()
                    )
                } else {
                    "Quantity sold could not be compared between discounted and non-discounted sales."
                        .to_string()
                };
                lines.push(InsightLine {
                    tone: Tone::Success,
                    text,
                });

                let text = if profit_diff.is_finite() {
                    let verb = if profit_diff <= 0.0 { "shrink" } else { "grow" };
                    format!(
                        "Profit margins {verb} by about {:.1} percentage points when discounts are applied.",
                        profit_diff.abs()
                    )
                } else {
                    "Profit margins could not be compared between discounted and non-discounted sales."
                        .to_string()
                };
                lines.push(InsightLine {
                    tone: Tone::Warning,
                    text,
                });
            }
            DiscountComparison::CannotCompare => lines.push(InsightLine {
                tone: Tone::Info,
                text: "All items have discounts - cannot compare with non-discounted sales."
                    .to_string(),
            }),
        }

        if let Some(peak) = &self.seasonal_peak {
            let name = u8::try_from(peak.month)
                .ok()
                .and_then(|m| Month::try_from(m).ok())
                .map(|m| m.name())
                .unwrap_or("?");
            lines.push(InsightLine {
                tone: Tone::Info,
                text: format!(
                    "Discounts peak in {name}, averaging {} off.",
                    percent(peak.avg_discount, 1)
                ),
            });
        }

        if let Some((category, profit)) = &self.top_discounted_category {
            lines.push(InsightLine {
                tone: Tone::Info,
                text: format!(
                    "{category} earns the highest average profit on discounted orders ({}).",
                    money(*profit)
                ),
            });
        }

        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::sample;
    use crate::filter::FilterState;
    use crate::models::Dataset;
    use chrono::NaiveDate;

    fn view_of(ds: &Dataset) -> FilteredView<'_> {
        FilterState::defaults(ds).apply(ds)
    }

    #[test]
    fn test_comparison_values() {
        let ds = Dataset::from_rows(
            "test",
            vec![],
            vec![
                sample(100.0, 3.0, 0.2, "A", "X"),
                sample(100.0, 2.0, 0.0, "A", "X"),
            ],
        );
        match compare_discounts(&view_of(&ds)) {
            DiscountComparison::Compared {
                sales_boost,
                profit_diff,
            } => {
                assert!((sales_boost - 50.0).abs() < 1e-9);
                assert!((profit_diff + 20.0).abs() < 1e-9);
            }
            other => panic!("unexpected {other:?}"),
        }
        let lines = narrate(&view_of(&ds)).lines();
        assert_eq!(
            lines[0].text,
            "Discounts increase average quantity sold by 50.0% on average."
        );
        assert_eq!(
            lines[1].text,
            "Profit margins shrink by about 20.0 percentage points when discounts are applied."
        );
        assert_eq!(lines[1].tone, Tone::Warning);
    }

    #[test]
    fn test_all_discounted_cannot_compare() {
        let ds = Dataset::from_rows(
            "test",
            vec![],
            vec![sample(10.0, 1.0, 0.1, "A", "X"), sample(10.0, 1.0, 0.3, "B", "X")],
        );
        let insights = narrate(&view_of(&ds));
        assert_eq!(insights.comparison, DiscountComparison::CannotCompare);
        assert!(insights.lines()[0].text.contains("cannot compare"));
    }

    #[test]
    fn test_empty_view_cannot_compare() {
        let view = FilteredView { rows: vec![] };
        let insights = narrate(&view);
        assert_eq!(insights.comparison, DiscountComparison::CannotCompare);
        assert_eq!(insights.seasonal_peak, None);
        assert_eq!(insights.top_discounted_category, None);
    }

    #[test]
    fn test_no_discounted_rows_gives_nan_ratio() {
        let ds = Dataset::from_rows("test", vec![], vec![sample(10.0, 1.0, 0.0, "A", "X")]);
        let insights = narrate(&view_of(&ds));
        match insights.comparison {
            DiscountComparison::Compared { sales_boost, .. } => assert!(sales_boost.is_nan()),
            other => panic!("unexpected {other:?}"),
        }
        assert!(insights.lines()[0].text.contains("could not be compared"));
    }

    #[test]
    fn test_seasonal_peak() {
        let mut rows = vec![
            sample(10.0, 1.0, 0.1, "A", "X"),
            sample(10.0, 1.0, 0.4, "A", "X"),
            sample(10.0, 1.0, 0.2, "A", "X"),
        ];
        rows[0].order_date = NaiveDate::from_ymd_opt(2024, 1, 3);
        rows[1].order_date = NaiveDate::from_ymd_opt(2024, 11, 29);
        let ds = Dataset::from_rows("test", vec![], rows);
        let peak = seasonal_peak(&view_of(&ds)).unwrap();
        assert_eq!(peak.month, 11);
        assert_eq!(peak.avg_discount, 0.4);
        let lines = narrate(&view_of(&ds)).lines();
        assert!(lines.iter().any(|l| l.text == "Discounts peak in November, averaging 40.0% off."));
    }

    #[test]
    fn test_top_discounted_category() {
        let ds = Dataset::from_rows(
            "test",
            vec![],
            vec![
                sample(10.0, 1.0, 0.1, "Books", "X"),
                sample(100.0, 1.0, 0.5, "Electronics", "X"),
                sample(500.0, 1.0, 0.0, "Garden", "X"),
            ],
        );
        let (name, profit) = top_discounted_category(&view_of(&ds)).unwrap();
        assert_eq!(name, "Electronics");
        assert_eq!(profit, 50.0);
    }
}
