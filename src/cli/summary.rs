use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{Context, FilterOpts};
use crate::error::Result;
use crate::filter::{FilterArgs, FilterState};
use crate::fmt::{decimal, money, money_whole, number, percent};
use crate::insights::Tone;
use crate::models::Dataset;
use crate::reports::{
    BoxStats, CategoryProfit, CorrelationMatrix, DiscountHistogram, HeadlineMetrics,
    PreviewTable, ScatterPlot,
};
use crate::stats;
use crate::view::{render, ViewModel};

pub fn run(ctx: &Context, opts: &FilterOpts) -> Result<()> {
    let dataset = ctx.dataset()?;
    let filter = FilterState::from_args(dataset, &FilterArgs::from(opts))?;
    println!("{}", format_summary(dataset, &filter, &render(dataset, &filter)));
    Ok(())
}

// ---------------------------------------------------------------------------
// Pure formatting functions (view model -> String)
// ---------------------------------------------------------------------------

fn heading(title: &str) -> String {
    format!("\n{}", title.bold().yellow())
}

pub fn describe_filter(dataset: &Dataset, filter: &FilterState) -> String {
    let list = |all: &[String], selected: &std::collections::BTreeSet<String>| {
        if all.iter().all(|v| selected.contains(v)) && selected.len() == all.len() {
            "all".to_string()
        } else if selected.is_empty() {
            "none".to_string()
        } else {
            selected.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    };
    format!(
        "Categories: {} | Regions: {} | Discount: {} to {}",
        list(&dataset.categories, &filter.categories),
        list(&dataset.regions, &filter.regions),
        decimal(filter.discount_lo, 2),
        decimal(filter.discount_hi, 2),
    )
}

pub fn format_summary(dataset: &Dataset, filter: &FilterState, vm: &ViewModel) -> String {
    let mut out = Vec::new();
    out.push(format!("{}", "E-Commerce Discount Analysis".bold()));
    out.push(format!("Source: {}", dataset.source));
    out.push(describe_filter(dataset, filter));
    out.push(format!(
        "Rows: {} of {}",
        number(vm.metrics.row_count),
        number(vm.total_rows)
    ));
    if dataset.date_parse_warnings > 0 {
        out.push(format!(
            "{} {} order_date values could not be parsed and were left empty.",
            "Warning:".yellow(),
            number(dataset.date_parse_warnings)
        ));
    }

    out.push(heading("Key Metrics"));
    out.push(format_metrics(&vm.metrics));

    out.push(heading("Dataset Preview"));
    out.push(format_preview(&vm.preview));

    out.push(heading("Discount Distribution by Category"));
    out.push(format_histogram(&vm.histogram));

    out.push(heading("Revenue vs Discount"));
    out.push(format_scatter(&vm.revenue_scatter));
    out.push(heading("Profit vs Discount"));
    out.push(format_scatter(&vm.profit_scatter));

    out.push(heading("Discount Patterns by Region"));
    out.push(format_boxes(&vm.region_boxes));

    out.push(heading("Average Profit by Category (Discounted vs Non-Discounted)"));
    out.push(format_category_profit(&vm.category_profit));

    out.push(heading("Correlation Heatmap"));
    out.push(format_correlation(&vm.correlation));

    out.push(heading("Key Insights"));
    for line in vm.insights.lines() {
        let tag = match line.tone {
            Tone::Success => "+".green().bold(),
            Tone::Warning => "!".yellow().bold(),
            Tone::Info => "i".blue().bold(),
        };
        out.push(format!("  {tag} {}", line.text));
    }

    out.join("\n")
}

pub fn format_metrics(m: &HeadlineMetrics) -> String {
    let mut table = Table::new();
    table.set_header(vec!["Average Discount", "Total Revenue", "Total Profit", "Avg Profit Margin"]);
    table.add_row(vec![
        percent(m.avg_discount, 2),
        money_whole(m.total_revenue),
        money_whole(m.total_profit),
        percent(m.avg_profit_margin, 1),
    ]);
    table.to_string()
}

pub fn format_preview(p: &PreviewTable) -> String {
    if p.rows.is_empty() {
        return "No rows match the current filters.".to_string();
    }
    let mut table = Table::new();
    table.set_header(p.columns.clone());
    for row in &p.rows {
        table.add_row(row.clone());
    }
    table.to_string()
}

pub fn format_histogram(h: &DiscountHistogram) -> String {
    if h.bin_count() == 0 {
        return "No discount values to plot.".to_string();
    }
    let mut table = Table::new();
    let mut header = vec!["Discount".to_string(), "Total".to_string()];
    header.extend(h.series.iter().map(|s| s.name.clone()));
    table.set_header(header);
    let totals = h.totals();
    for (i, total) in totals.iter().enumerate() {
        let mut row = vec![
            Cell::new(format!("{} - {}", decimal(h.edges[i], 3), decimal(h.edges[i + 1], 3))),
            Cell::new(total),
        ];
        row.extend(h.series.iter().map(|s| Cell::new(s.counts[i])));
        table.add_row(row);
    }
    table.to_string()
}

pub fn format_scatter(plot: &ScatterPlot) -> String {
    if plot.series.is_empty() {
        return "No points to plot.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec![
        "Series".to_string(),
        "Points".to_string(),
        format!("Mean {}", plot.x_label),
        format!("Mean {}", plot.y_label),
        "Correlation".to_string(),
    ]);
    for s in &plot.series {
        let xs: Vec<f64> = s.points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = s.points.iter().map(|p| p.1).collect();
        table.add_row(vec![
            s.name.clone(),
            number(s.points.len()),
            percent(stats::mean(&xs), 1),
            money(stats::mean(&ys)),
            decimal(stats::pearson(&xs, &ys), 2),
        ]);
    }
    table.to_string()
}

pub fn format_boxes(boxes: &[BoxStats]) -> String {
    if boxes.is_empty() {
        return "No rows match the current filters.".to_string();
    }
    let mut table = Table::new();
    table.set_header(vec!["Region", "Count", "Min", "Q1", "Median", "Q3", "Max", "Outliers"]);
    for b in boxes {
        table.add_row(vec![
            b.group.clone(),
            number(b.count),
            percent(b.min, 1),
            percent(b.q1, 1),
            percent(b.median, 1),
            percent(b.q3, 1),
            percent(b.max, 1),
            number(b.outliers),
        ]);
    }
    table.to_string()
}

pub fn format_category_profit(rows: &[CategoryProfit]) -> String {
    if rows.is_empty() {
        return "No rows match the current filters.".to_string();
    }
    let cell = |v: Option<f64>| v.map(money).unwrap_or_else(|| "-".to_string());
    let mut table = Table::new();
    table.set_header(vec!["Category", "Discounted", "Non-Discounted"]);
    for r in rows {
        table.add_row(vec![r.category.clone(), cell(r.discounted), cell(r.non_discounted)]);
    }
    table.to_string()
}

pub fn format_correlation(c: &CorrelationMatrix) -> String {
    let mut table = Table::new();
    let mut header = vec![String::new()];
    header.extend(c.labels.iter().map(|l| l.to_string()));
    table.set_header(header);
    for (i, label) in c.labels.iter().enumerate() {
        let mut row = vec![label.to_string()];
        row.extend(c.values[i].iter().map(|v| decimal(*v, 2)));
        table.add_row(row);
    }
    table.to_string()
}
