use std::collections::BTreeSet;
use std::io::IsTerminal;

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Cell, Chart, Dataset as ChartData, GraphType,
        Paragraph, Row, Table, Tabs, Wrap,
    },
    Frame,
};

use crate::cli::{summary, Context, FilterOpts};
use crate::error::Result;
use crate::filter::{FilterArgs, FilterState};
use crate::fmt::{decimal, money_whole, number, percent};
use crate::insights::Tone;
use crate::models::Dataset;
use crate::reports::{BoxStats, ScatterPlot};
use crate::tui::{
    coolwarm, money_span, run_screen, series_color, wrapped_line_count, Screen, ScreenAction,
    FOCUS_STYLE, FOOTER_STYLE, HEADER_STYLE, SELECTED_STYLE,
};
use crate::view::{render, ViewModel};

const TITLE: &str = " 💸 E-Commerce Discount Analysis Dashboard";
const SUBTITLE: &str =
    " Analyze how discounts affect sales, profit, and customer behavior across categories and regions.";
const EMPTY_VIEW: &str = "No rows match the current filters.";
const SIDEBAR_WIDTH: u16 = 32;
/// Width of the ` ▲ ` marker in front of each insight.
const INSIGHT_PREFIX_WIDTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Categories,
    Regions,
    DiscountLow,
    DiscountHigh,
}

impl Focus {
    fn next(self) -> Self {
        match self {
            Self::Categories => Self::Regions,
            Self::Regions => Self::DiscountLow,
            Self::DiscountLow => Self::DiscountHigh,
            Self::DiscountHigh => Self::Categories,
        }
    }

    fn prev(self) -> Self {
        match self {
            Self::Categories => Self::DiscountHigh,
            Self::Regions => Self::Categories,
            Self::DiscountLow => Self::Regions,
            Self::DiscountHigh => Self::DiscountLow,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Overview,
    DiscountImpact,
    Regional,
    Correlations,
}

const TABS: [Tab; 4] = [Tab::Overview, Tab::DiscountImpact, Tab::Regional, Tab::Correlations];

impl Tab {
    fn title(self) -> &'static str {
        match self {
            Self::Overview => "📊 Overview",
            Self::DiscountImpact => "💸 Discount Impact",
            Self::Regional => "🌍 Regional Analysis",
            Self::Correlations => "🔍 Correlations",
        }
    }

    fn index(self) -> usize {
        TABS.iter().position(|t| *t == self).unwrap_or(0)
    }

    fn shifted(self, delta: isize) -> Self {
        let n = TABS.len() as isize;
        TABS[(self.index() as isize + delta).rem_euclid(n) as usize]
    }
}

pub struct Dashboard<'a> {
    dataset: &'a Dataset,
    bounds: (f64, f64),
    step: f64,
    filter: FilterState,
    view: ViewModel,
    focus: Focus,
    category_cursor: usize,
    region_cursor: usize,
    tab: Tab,
    status_message: Option<String>,
}

impl<'a> Dashboard<'a> {
    pub fn new(dataset: &'a Dataset, filter: FilterState, step: f64) -> Self {
        let view = render(dataset, &filter);
        let status_message = (dataset.date_parse_warnings > 0).then(|| {
            format!(
                "{} order_date values could not be parsed and were left empty.",
                number(dataset.date_parse_warnings)
            )
        });
        Self {
            dataset,
            bounds: dataset.discount_bounds(),
            step,
            filter,
            view,
            focus: Focus::Categories,
            category_cursor: 0,
            region_cursor: 0,
            tab: Tab::Overview,
            status_message,
        }
    }

    fn refresh(&mut self) {
        self.view = render(self.dataset, &self.filter);
    }

    fn options(&self) -> &'a [String] {
        match self.focus {
            Focus::Categories => &self.dataset.categories,
            Focus::Regions => &self.dataset.regions,
            _ => &[],
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        let len = self.options().len();
        if len == 0 {
            return;
        }
        let cursor = match self.focus {
            Focus::Categories => &mut self.category_cursor,
            Focus::Regions => &mut self.region_cursor,
            _ => return,
        };
        *cursor = (*cursor as isize + delta).clamp(0, len as isize - 1) as usize;
    }

    fn toggle_at_cursor(&mut self) {
        match self.focus {
            Focus::Categories => {
                if let Some(name) = self.dataset.categories.get(self.category_cursor) {
                    self.filter.toggle_category(name);
                }
            }
            Focus::Regions => {
                if let Some(name) = self.dataset.regions.get(self.region_cursor) {
                    self.filter.toggle_region(name);
                }
            }
            _ => return,
        }
        self.refresh();
    }

    fn select_all(&mut self, on: bool) {
        let options = self.options();
        let set = match self.focus {
            Focus::Categories => &mut self.filter.categories,
            Focus::Regions => &mut self.filter.regions,
            _ => return,
        };
        *set = if on {
            options.iter().cloned().collect()
        } else {
            BTreeSet::new()
        };
        self.refresh();
    }

    fn horizontal(&mut self, direction: f64, big: bool) {
        let step = if big { self.step * 10.0 } else { self.step };
        match self.focus {
            Focus::DiscountLow => self.filter.nudge_lo(direction * step, self.bounds),
            Focus::DiscountHigh => self.filter.nudge_hi(direction * step, self.bounds),
            Focus::Categories | Focus::Regions => {
                self.tab = self.tab.shifted(direction as isize);
                return;
            }
        }
        self.refresh();
    }

    fn reset(&mut self) {
        self.filter = FilterState::defaults(self.dataset);
        self.refresh();
        self.status_message = Some("Filters reset.".to_string());
    }

    // -----------------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------------

    fn draw_home(&self, frame: &mut Frame) {
        let area = frame.area();
        let [header_area, subtitle_area, body_area, hints_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new(TITLE).style(HEADER_STYLE), header_area);
        frame.render_widget(Paragraph::new(SUBTITLE).style(FOOTER_STYLE), subtitle_area);

        let [sidebar_area, main_area] =
            Layout::horizontal([Constraint::Length(SIDEBAR_WIDTH), Constraint::Fill(1)])
                .areas(body_area);

        self.draw_sidebar(frame, sidebar_area);

        let insights_height = self.insights_height(main_area.width);
        let [metrics_area, tabs_area, content_area, insights_area] = Layout::vertical([
            Constraint::Length(4),
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(insights_height),
        ])
        .areas(main_area);

        self.draw_metrics(frame, metrics_area);

        let titles: Vec<&str> = TABS.iter().map(|t| t.title()).collect();
        frame.render_widget(
            Tabs::new(titles)
                .select(self.tab.index())
                .highlight_style(HEADER_STYLE)
                .divider("│"),
            tabs_area,
        );

        match self.tab {
            Tab::Overview => self.draw_overview(frame, content_area),
            Tab::DiscountImpact => self.draw_impact(frame, content_area),
            Tab::Regional => self.draw_regional(frame, content_area),
            Tab::Correlations => self.draw_correlations(frame, content_area),
        }

        self.draw_insights(frame, insights_area);

        if let Some(msg) = &self.status_message {
            frame.render_widget(
                Paragraph::new(format!(" {msg}")).style(Style::default().fg(Color::Yellow)),
                hints_area,
            );
        } else {
            frame.render_widget(
                Paragraph::new(
                    " Tab=focus  Up/Down=move  Space=toggle  a/n=all/none  Left/Right=adjust  1-4=tab  r=reset  q=quit",
                )
                .style(FOOTER_STYLE),
                hints_area,
            );
        }
    }

    fn draw_sidebar(&self, frame: &mut Frame, area: Rect) {
        let [title_area, categories_area, regions_area, discount_area] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Fill(1),
            Constraint::Length(5),
        ])
        .areas(area);

        let title = if self.filter.is_default(self.dataset) {
            " 🔍 Filters".to_string()
        } else {
            " 🔍 Filters (modified)".to_string()
        };
        frame.render_widget(
            Paragraph::new(title).style(Style::default().add_modifier(Modifier::BOLD)),
            title_area,
        );
        draw_selector(
            frame,
            categories_area,
            "Categories",
            &self.dataset.categories,
            &self.filter.categories,
            self.category_cursor,
            self.focus == Focus::Categories,
        );
        draw_selector(
            frame,
            regions_area,
            "Regions",
            &self.dataset.regions,
            &self.filter.regions,
            self.region_cursor,
            self.focus == Focus::Regions,
        );
        self.draw_discount_range(frame, discount_area);
    }

    fn draw_discount_range(&self, frame: &mut Frame, area: Rect) {
        let focused = matches!(self.focus, Focus::DiscountLow | Focus::DiscountHigh);
        let block = Block::bordered()
            .title("Discount Range")
            .border_style(if focused { FOCUS_STYLE } else { FOOTER_STYLE });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let value_style = |f: Focus| {
            if self.focus == f {
                SELECTED_STYLE
            } else {
                Style::default()
            }
        };
        let lines = vec![
            Line::from(vec![
                Span::raw(" Low   "),
                Span::styled(format!(" {} ", decimal(self.filter.discount_lo, 2)), value_style(Focus::DiscountLow)),
            ]),
            Line::from(vec![
                Span::raw(" High  "),
                Span::styled(format!(" {} ", decimal(self.filter.discount_hi, 2)), value_style(Focus::DiscountHigh)),
            ]),
            Line::from(Span::styled(
                format!(
                    " {}",
                    range_slider(
                        self.filter.discount_lo,
                        self.filter.discount_hi,
                        self.bounds,
                        inner.width.saturating_sub(2) as usize,
                    )
                ),
                Style::default().fg(Color::Cyan),
            )),
        ];
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_metrics(&self, frame: &mut Frame, area: Rect) {
        let m = &self.view.metrics;
        let areas: [Rect; 4] = Layout::horizontal([Constraint::Percentage(25); 4]).areas(area);
        let cards: [(&str, Span<'static>); 4] = [
            ("Average Discount", Span::raw(percent(m.avg_discount, 2))),
            ("Total Revenue", money_span(m.total_revenue)),
            ("Total Profit", money_span(m.total_profit)),
            ("Avg Profit Margin", Span::raw(percent(m.avg_profit_margin, 1))),
        ];
        for ((title, value), card_area) in cards.into_iter().zip(areas) {
            let block = Block::bordered()
                .title(title)
                .border_style(FOOTER_STYLE);
            let lines = vec![
                Line::from(Span::styled(
                    value.content,
                    value.style.add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    format!("{} of {} rows", number(m.row_count), number(self.view.total_rows)),
                    FOOTER_STYLE,
                )),
            ];
            frame.render_widget(Paragraph::new(lines).block(block), card_area);
        }
    }

    fn draw_overview(&self, frame: &mut Frame, area: Rect) {
        let preview_height = (self.view.preview.rows.len() as u16 + 3).max(4);
        let [preview_area, histogram_area] =
            Layout::vertical([Constraint::Length(preview_height), Constraint::Fill(1)]).areas(area);

        let block = Block::bordered().title("Dataset Preview").border_style(FOOTER_STYLE);
        let preview = &self.view.preview;
        if preview.rows.is_empty() {
            frame.render_widget(Paragraph::new(EMPTY_VIEW).block(block), preview_area);
        } else {
            let header = Row::new(preview.columns.iter().map(|c| Cell::from(c.clone())))
                .style(Style::new().fg(Color::DarkGray).add_modifier(Modifier::BOLD));
            let rows: Vec<Row> = preview
                .rows
                .iter()
                .map(|r| Row::new(r.iter().map(|c| Cell::from(c.clone()))))
                .collect();
            let widths = vec![Constraint::Fill(1); preview.columns.len()];
            frame.render_widget(Table::new(rows, widths).header(header).block(block), preview_area);
        }

        self.draw_histogram(frame, histogram_area);
    }

    fn draw_histogram(&self, frame: &mut Frame, area: Rect) {
        let h = &self.view.histogram;
        let block = Block::bordered()
            .title("Discount Distribution by Category")
            .border_style(FOOTER_STYLE);
        let bins = h.bin_count();
        if bins == 0 {
            frame.render_widget(Paragraph::new(EMPTY_VIEW).block(block), area);
            return;
        }

        let lo = h.edges[0];
        let hi = h.edges[bins];
        let bin_width = (hi - lo) / bins as f64;
        let series_count = h.series.len().max(1) as f64;

        // Series sit side by side within each bin.
        let points: Vec<Vec<(f64, f64)>> = h
            .series
            .iter()
            .enumerate()
            .map(|(k, s)| {
                s.counts
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| **c > 0)
                    .map(|(i, c)| {
                        let x = h.edges[i] + bin_width * (k as f64 + 0.5) / series_count;
                        (x, *c as f64)
                    })
                    .collect()
            })
            .collect();
        let y_max = points
            .iter()
            .flatten()
            .map(|p| p.1)
            .fold(1.0, f64::max);

        let datasets: Vec<ChartData> = h
            .series
            .iter()
            .zip(&points)
            .enumerate()
            .map(|(k, (s, pts))| {
                ChartData::default()
                    .name(s.name.clone())
                    .marker(Marker::HalfBlock)
                    .graph_type(GraphType::Bar)
                    .style(Style::default().fg(series_color(k)))
                    .data(pts)
            })
            .collect();

        let chart = Chart::new(datasets)
            .block(block)
            .x_axis(
                Axis::default()
                    .title("discount")
                    .style(FOOTER_STYLE)
                    .bounds([lo, hi])
                    .labels(vec![
                        percent(lo, 0),
                        percent((lo + hi) / 2.0, 0),
                        percent(hi, 0),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("count")
                    .style(FOOTER_STYLE)
                    .bounds([0.0, y_max * 1.1])
                    .labels(vec!["0".to_string(), format!("{y_max:.0}")]),
            );
        frame.render_widget(chart, area);
    }

    fn draw_impact(&self, frame: &mut Frame, area: Rect) {
        let [left, right] =
            Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
        draw_scatter(frame, left, &self.view.revenue_scatter);
        draw_scatter(frame, right, &self.view.profit_scatter);
    }

    fn draw_regional(&self, frame: &mut Frame, area: Rect) {
        let box_height = (self.view.region_boxes.len() as u16 + 3).max(4);
        let [box_area, bar_area] =
            Layout::vertical([Constraint::Length(box_height), Constraint::Fill(1)]).areas(area);
        self.draw_region_boxes(frame, box_area);
        self.draw_category_profit(frame, bar_area);
    }

    fn draw_region_boxes(&self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .title("Discount Patterns by Region")
            .border_style(FOOTER_STYLE);
        let boxes = &self.view.region_boxes;
        if boxes.is_empty() {
            frame.render_widget(Paragraph::new(EMPTY_VIEW).block(block), area);
            return;
        }
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let lo = boxes.iter().map(|b| b.min).fold(f64::INFINITY, f64::min);
        let hi = boxes.iter().map(|b| b.max).fold(f64::NEG_INFINITY, f64::max);
        let label_width = boxes.iter().map(|b| b.group.chars().count()).max().unwrap_or(6) + 2;
        let stats_width = 36;
        let strip_width = (inner.width as usize)
            .saturating_sub(label_width + stats_width)
            .max(10);

        let mut lines: Vec<Line> = boxes
            .iter()
            .enumerate()
            .map(|(k, b)| {
                Line::from(vec![
                    Span::raw(format!(" {:<w$}", b.group, w = label_width - 1)),
                    Span::styled(box_strip(b, lo, hi, strip_width), Style::default().fg(series_color(k))),
                    Span::styled(
                        format!(
                            "  median {}  IQR {}-{}  n={}",
                            percent(b.median, 1),
                            percent(b.q1, 1),
                            percent(b.q3, 1),
                            number(b.count)
                        ),
                        FOOTER_STYLE,
                    ),
                ])
            })
            .collect();

        let lo_label = percent(lo, 0);
        let hi_label = percent(hi, 0);
        let gap = strip_width.saturating_sub(lo_label.len() + hi_label.len());
        lines.push(Line::from(Span::styled(
            format!("{}{lo_label}{}{hi_label}", " ".repeat(label_width), " ".repeat(gap)),
            FOOTER_STYLE,
        )));
        frame.render_widget(Paragraph::new(lines), inner);
    }

    fn draw_category_profit(&self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .title("Average Profit by Category (Discounted vs Non-Discounted)")
            .border_style(FOOTER_STYLE);
        let rows = &self.view.category_profit;
        if rows.is_empty() {
            frame.render_widget(Paragraph::new(EMPTY_VIEW).block(block), area);
            return;
        }
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [legend_area, chart_area] =
            Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(inner);
        let discounted_style = Style::default().fg(series_color(0));
        let non_discounted_style = Style::default().fg(series_color(1));
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" ■ Discounted", discounted_style),
                Span::raw("   "),
                Span::styled("■ Non-Discounted", non_discounted_style),
            ])),
            legend_area,
        );

        let group_width = (chart_area.width as usize / rows.len()).saturating_sub(2);
        let bar_width = (group_width / 2).clamp(1, 12) as u16;

        let bar = |value: Option<f64>, style: Style| {
            let height = value
                .filter(|v| v.is_finite())
                .map(|v| v.max(0.0).round() as u64)
                .unwrap_or(0);
            let text = value.map(money_whole).unwrap_or_else(|| "-".to_string());
            Bar::default().value(height).text_value(text).style(style)
        };

        let mut chart = BarChart::default()
            .bar_width(bar_width)
            .bar_gap(0)
            .group_gap(2);
        for r in rows {
            let bars = vec![
                bar(r.discounted, discounted_style),
                bar(r.non_discounted, non_discounted_style),
            ];
            chart = chart.data(
                BarGroup::default()
                    .label(Line::from(r.category.clone()))
                    .bars(&bars),
            );
        }
        frame.render_widget(chart, chart_area);
    }

    fn draw_correlations(&self, frame: &mut Frame, area: Rect) {
        let c = &self.view.correlation;
        let block = Block::bordered()
            .title("Correlation Heatmap")
            .border_style(FOOTER_STYLE);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let [table_area, scale_area] =
            Layout::vertical([Constraint::Length(6), Constraint::Length(1)]).areas(inner);

        let bold = Style::new().add_modifier(Modifier::BOLD);
        let header = Row::new(
            std::iter::once(Cell::from(""))
                .chain(c.labels.iter().map(|l| Cell::from(format!("{l:^10}")))),
        )
        .style(bold);
        let rows: Vec<Row> = c
            .labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                let cells = std::iter::once(Cell::from(Span::styled(label.to_string(), bold))).chain(
                    c.values[i].iter().map(|v| {
                        Cell::from(format!("{:^10}", decimal(*v, 2)))
                            .style(Style::default().bg(coolwarm(*v)).fg(Color::Black))
                    }),
                );
                Row::new(cells)
            })
            .collect();
        let widths = vec![Constraint::Length(10); c.labels.len() + 1];
        frame.render_widget(Table::new(rows, widths).header(header).column_spacing(1), table_area);

        let mut scale = vec![Span::styled(" -1.0 ", FOOTER_STYLE)];
        for i in 0..=20 {
            let v = -1.0 + i as f64 * 0.1;
            scale.push(Span::styled(" ", Style::default().bg(coolwarm(v))));
        }
        scale.push(Span::styled(" 1.0", FOOTER_STYLE));
        frame.render_widget(Paragraph::new(Line::from(scale)), scale_area);
    }

    /// Rows needed by the insights block: two borders plus each sentence
    /// wrapped at the inner width less its icon prefix.
    fn insights_height(&self, width: u16) -> u16 {
        let text_width = (width as usize).saturating_sub(2 + INSIGHT_PREFIX_WIDTH);
        let lines: u16 = self
            .view
            .insights
            .lines()
            .iter()
            .map(|l| wrapped_line_count(&l.text, text_width))
            .sum();
        lines + 2
    }

    fn draw_insights(&self, frame: &mut Frame, area: Rect) {
        let block = Block::bordered()
            .title(Span::styled("💡 Key Insights", HEADER_STYLE))
            .border_style(FOOTER_STYLE);
        let lines: Vec<Line> = self
            .view
            .insights
            .lines()
            .into_iter()
            .map(|l| {
                let (icon, color) = match l.tone {
                    Tone::Success => ("▲", Color::Rgb(80, 220, 100)),
                    Tone::Warning => ("▼", Color::Yellow),
                    Tone::Info => ("•", Color::Cyan),
                };
                Line::from(vec![
                    Span::styled(format!(" {icon} "), Style::default().fg(color)),
                    Span::raw(l.text),
                ])
            })
            .collect();
        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            area,
        );
    }
}

impl Screen for Dashboard<'_> {
    fn draw(&mut self, frame: &mut Frame) {
        self.draw_home(frame);
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) -> ScreenAction {
        self.status_message = None;
        let big = modifiers.contains(KeyModifiers::SHIFT);
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return ScreenAction::Close,
            KeyCode::Tab => self.focus = self.focus.next(),
            KeyCode::BackTab => self.focus = self.focus.prev(),
            KeyCode::Char(c @ '1'..='4') => self.tab = TABS[(c as u8 - b'1') as usize],
            KeyCode::Char(']') => self.tab = self.tab.shifted(1),
            KeyCode::Char('[') => self.tab = self.tab.shifted(-1),
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::Char(' ') | KeyCode::Enter => self.toggle_at_cursor(),
            KeyCode::Char('a') => self.select_all(true),
            KeyCode::Char('n') => self.select_all(false),
            KeyCode::Left | KeyCode::Char('h') => self.horizontal(-1.0, big),
            KeyCode::Right | KeyCode::Char('l') => self.horizontal(1.0, big),
            KeyCode::Char('r') => self.reset(),
            _ => {}
        }
        ScreenAction::Continue
    }
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

fn draw_selector(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    options: &[String],
    selected: &BTreeSet<String>,
    cursor: usize,
    focused: bool,
) {
    let chosen = options.iter().filter(|o| selected.contains(*o)).count();
    let block = Block::bordered()
        .title(format!("{title} ({chosen}/{})", options.len()))
        .border_style(if focused { FOCUS_STYLE } else { FOOTER_STYLE });
    let visible = block.inner(area).height as usize;
    let start = if visible > 0 && cursor >= visible {
        cursor + 1 - visible
    } else {
        0
    };
    let lines: Vec<Line> = options
        .iter()
        .enumerate()
        .skip(start)
        .take(visible)
        .map(|(i, name)| {
            let mark = if selected.contains(name) { "[x]" } else { "[ ]" };
            let style = if focused && i == cursor {
                SELECTED_STYLE
            } else {
                Style::default()
            };
            Line::styled(format!(" {mark} {name}"), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn draw_scatter(frame: &mut Frame, area: Rect, plot: &ScatterPlot) {
    let block = Block::bordered().title(plot.title).border_style(FOOTER_STYLE);
    let Some((x0, x1, y0, y1)) = plot.bounds() else {
        frame.render_widget(Paragraph::new(EMPTY_VIEW).block(block), area);
        return;
    };
    let x_bounds = padded(x0, x1);
    let y_bounds = padded(y0, y1);

    let datasets: Vec<ChartData> = plot
        .series
        .iter()
        .enumerate()
        .map(|(k, s)| {
            ChartData::default()
                .name(s.name.clone())
                .marker(Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(series_color(k)))
                .data(&s.points)
        })
        .collect();

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .title(plot.x_label)
                .style(FOOTER_STYLE)
                .bounds(x_bounds)
                .labels(vec![percent(x_bounds[0], 0), percent(x_bounds[1], 0)]),
        )
        .y_axis(
            Axis::default()
                .title(plot.y_label)
                .style(FOOTER_STYLE)
                .bounds(y_bounds)
                .labels(vec![money_whole(y_bounds[0]), money_whole(y_bounds[1])]),
        );
    frame.render_widget(chart, area);
}

/// Axis bounds with 5% headroom; a degenerate range gets a small window.
fn padded(lo: f64, hi: f64) -> [f64; 2] {
    let span = hi - lo;
    let pad = if span.abs() < 1e-12 {
        lo.abs().max(1.0) * 0.05
    } else {
        span * 0.05
    };
    [lo - pad, hi + pad]
}

/// Horizontal box-and-whisker glyphs for one group, scaled to `[lo, hi]`.
pub(crate) fn box_strip(b: &BoxStats, lo: f64, hi: f64, width: usize) -> String {
    if width == 0 || b.count == 0 {
        return " ".repeat(width);
    }
    let span = hi - lo;
    let last = (width - 1) as f64;
    let pos = |v: f64| -> usize {
        if span <= 0.0 || !v.is_finite() {
            width / 2
        } else {
            (((v - lo) / span) * last).round().clamp(0.0, last) as usize
        }
    };
    let (lw, q1, med, q3, uw) = (
        pos(b.lower_whisker),
        pos(b.q1),
        pos(b.median),
        pos(b.q3),
        pos(b.upper_whisker),
    );

    let mut cells = vec![' '; width];
    for c in cells.iter_mut().take(q1).skip(lw) {
        *c = '─';
    }
    for c in cells.iter_mut().take(uw + 1).skip(q3 + 1) {
        *c = '─';
    }
    for c in cells.iter_mut().take(q3 + 1).skip(q1) {
        *c = '█';
    }
    if lw < q1 {
        cells[lw] = '├';
    }
    if uw > q3 {
        cells[uw] = '┤';
    }
    cells[med] = '┃';
    cells.into_iter().collect()
}

/// Track with the selected `[lo, hi]` window highlighted.
fn range_slider(lo: f64, hi: f64, bounds: (f64, f64), width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let span = bounds.1 - bounds.0;
    let last = (width - 1) as f64;
    let pos = |v: f64| -> usize {
        if span <= 0.0 || !v.is_finite() {
            0
        } else {
            (((v - bounds.0) / span) * last).round().clamp(0.0, last) as usize
        }
    };
    let (a, b) = (pos(lo), pos(hi).max(pos(lo)));
    (0..width)
        .map(|i| {
            if i == a || i == b {
                '●'
            } else if i > a && i < b {
                '━'
            } else {
                '─'
            }
        })
        .collect()
}

pub fn run(ctx: &Context, opts: &FilterOpts) -> Result<()> {
    if !std::io::stdout().is_terminal() {
        return summary::run(ctx, opts);
    }
    let dataset = ctx.dataset()?;
    let filter = FilterState::from_args(dataset, &FilterArgs::from(opts))?;
    let mut dashboard = Dashboard::new(dataset, filter, ctx.settings.discount_step);
    tracing::info!(rows = dataset.rows.len(), "dashboard opened");
    run_screen(&mut dashboard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::sample;
    use crate::reports::box_stats;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn dataset() -> Dataset {
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
                sample(100.0, 2.0, 0.1, "Electronics", "North"),
                sample(50.0, 1.0, 0.0, "Books", "South"),
                sample(80.0, 3.0, 0.3, "Electronics", "South"),
                sample(20.0, 5.0, 0.2, "Sports", "North"),
            ],
        )
    }

    fn screen_text(dashboard: &mut Dashboard) -> String {
        let mut terminal = Terminal::new(TestBackend::new(160, 50)).unwrap();
        terminal.draw(|f| dashboard.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    fn press(d: &mut Dashboard, code: KeyCode) -> ScreenAction {
        d.handle_key(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_toggle_category_refilters() {
        let ds = dataset();
        let mut d = Dashboard::new(&ds, FilterState::defaults(&ds), 0.01);
        assert_eq!(d.view.metrics.row_count, 4);
        press(&mut d, KeyCode::Char(' '));
        assert!(!d.filter.categories.contains("Electronics"));
        assert_eq!(d.view.metrics.row_count, 2);
        press(&mut d, KeyCode::Char(' '));
        assert_eq!(d.view.metrics.row_count, 4);
    }

    #[test]
    fn test_select_none_and_all_regions() {
        let ds = dataset();
        let mut d = Dashboard::new(&ds, FilterState::defaults(&ds), 0.01);
        press(&mut d, KeyCode::Tab);
        press(&mut d, KeyCode::Char('n'));
        assert_eq!(d.view.metrics.row_count, 0);
        assert_eq!(d.view.metrics.total_revenue, 0.0);
        press(&mut d, KeyCode::Char('a'));
        assert_eq!(d.view.metrics.row_count, 4);
    }

    #[test]
    fn test_discount_bounds_nudge() {
        let ds = dataset();
        let mut d = Dashboard::new(&ds, FilterState::defaults(&ds), 0.05);
        press(&mut d, KeyCode::Tab);
        press(&mut d, KeyCode::Tab);
        press(&mut d, KeyCode::Right);
        assert!((d.filter.discount_lo - 0.05).abs() < 1e-9);
        assert_eq!(d.view.metrics.row_count, 3);
        press(&mut d, KeyCode::Tab);
        d.handle_key(KeyCode::Left, KeyModifiers::SHIFT);
        assert!((d.filter.discount_hi - 0.05).abs() < 1e-9);
        assert_eq!(d.view.metrics.row_count, 0);
        press(&mut d, KeyCode::Char('r'));
        assert_eq!(d.view.metrics.row_count, 4);
        assert_eq!(d.status_message.as_deref(), Some("Filters reset."));
    }

    #[test]
    fn test_tab_switching_and_quit() {
        let ds = dataset();
        let mut d = Dashboard::new(&ds, FilterState::defaults(&ds), 0.01);
        press(&mut d, KeyCode::Char('3'));
        assert_eq!(d.tab, Tab::Regional);
        press(&mut d, KeyCode::Char(']'));
        assert_eq!(d.tab, Tab::Correlations);
        press(&mut d, KeyCode::Char(']'));
        assert_eq!(d.tab, Tab::Overview);
        press(&mut d, KeyCode::Left);
        assert_eq!(d.tab, Tab::Correlations);
        assert!(matches!(press(&mut d, KeyCode::Char('q')), ScreenAction::Close));
    }

    #[test]
    fn test_cursor_stays_in_range() {
        let ds = dataset();
        let mut d = Dashboard::new(&ds, FilterState::defaults(&ds), 0.01);
        for _ in 0..10 {
            press(&mut d, KeyCode::Down);
        }
        assert_eq!(d.category_cursor, 2);
        press(&mut d, KeyCode::Up);
        assert_eq!(d.category_cursor, 1);
    }

    #[test]
    fn test_every_tab_draws() {
        let ds = dataset();
        let mut d = Dashboard::new(&ds, FilterState::defaults(&ds), 0.01);
        let text = screen_text(&mut d);
        assert!(text.contains("Total Revenue"));
        assert!(text.contains("Dataset Preview"));
        assert!(text.contains("Key Insights"));
        for key in ['2', '3', '4'] {
            press(&mut d, KeyCode::Char(key));
            screen_text(&mut d);
        }
        assert!(screen_text(&mut d).contains("Correlation Heatmap"));
    }

    #[test]
    fn test_empty_view_draws_every_tab() {
        let ds = dataset();
        let mut filter = FilterState::defaults(&ds);
        filter.categories.clear();
        let mut d = Dashboard::new(&ds, filter, 0.01);
        for key in ['1', '2', '3', '4'] {
            press(&mut d, KeyCode::Char(key));
            let text = screen_text(&mut d);
            assert!(text.contains("Total Revenue"));
        }
        press(&mut d, KeyCode::Char('1'));
        assert!(screen_text(&mut d).contains(EMPTY_VIEW));
    }

    #[test]
    fn test_date_warning_shown_on_open() {
        let mut ds = dataset();
        ds.date_parse_warnings = 2;
        let d = Dashboard::new(&ds, FilterState::defaults(&ds), 0.01);
        assert!(d.status_message.as_deref().unwrap().contains("2 order_date values"));
    }

    #[test]
    fn test_insights_height_matches_wrap_width() {
        let ds = dataset();
        let d = Dashboard::new(&ds, FilterState::defaults(&ds), 0.01);
        let lines = d.view.insights.lines();
        let width: u16 = 60;
        let expected: u16 = lines
            .iter()
            .map(|l| textwrap::wrap(&l.text, 55).len() as u16)
            .sum();
        assert_eq!(d.insights_height(width), expected + 2);
        assert_eq!(d.insights_height(2), lines.len() as u16 + 2);
    }

    #[test]
    fn test_box_strip_glyphs() {
        let b = box_stats("X", &[0.0, 0.1, 0.2, 0.3, 0.4]);
        let strip = box_strip(&b, 0.0, 0.4, 9);
        assert_eq!(strip.chars().count(), 9);
        assert!(strip.starts_with('├'));
        assert!(strip.ends_with('┤'));
        assert_eq!(strip.chars().nth(4), Some('┃'));
        assert_eq!(box_strip(&box_stats("Y", &[]), 0.0, 1.0, 5), "     ");
    }

    #[test]
    fn test_range_slider_marks_window() {
        let s = range_slider(0.25, 0.75, (0.0, 1.0), 5);
        assert_eq!(s, "─●━●─");
        assert_eq!(range_slider(0.0, 0.0, (0.0, 0.0), 3), "●──");
    }

    #[test]
    fn test_padded_degenerate_range() {
        assert_eq!(padded(0.0, 0.0), [-0.05, 0.05]);
        let [a, b] = padded(0.0, 10.0);
        assert_eq!((a, b), (-0.5, 10.5));
    }
}
