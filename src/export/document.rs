//! Paginated document output
//!
//! [`DocumentLayout`] decides what goes on which page: a leading summary
//! section, then one section per product with its detail table and chart.
//! A [`DocumentRenderer`] turns that layout into bytes. [`TextRenderer`]
//! produces a plain-text document with form-feed page breaks and
//! [`super::PdfRenderer`] a PDF.

use anyhow::{Context, Result};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing::info;

use crate::reports::{ChartSpec, ReportDocument, ReportMetadata, Table, TableKind};
use crate::utils::{format_amount, format_cell};

/// One page-starting section of the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub tables: Vec<Table>,
    pub charts: Vec<ChartSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLayout {
    pub metadata: ReportMetadata,
    pub sections: Vec<Section>,
}

impl DocumentLayout {
    pub fn from_report(doc: &ReportDocument) -> Self {
        let mut sections = Vec::new();

        let summary_charts: Vec<ChartSpec> = doc
            .charts
            .iter()
            .filter(|c| c.series.len() > 1)
            .cloned()
            .collect();
        sections.push(Section {
            heading: "Summary".to_string(),
            tables: doc.summary().cloned().into_iter().collect(),
            charts: summary_charts,
        });

        let details = doc.tables.iter().filter_map(|t| match &t.kind {
            TableKind::Detail { product } => Some((product, t)),
            TableKind::Summary => None,
        });

        for (idx, (product, table)) in details.enumerate() {
            sections.push(Section {
                heading: format!("{}. Product: {}", idx + 1, product),
                tables: vec![table.clone()],
                charts: product_chart(doc, product).into_iter().collect(),
            });
        }

        Self {
            metadata: doc.metadata.clone(),
            sections,
        }
    }

    pub fn page_count(&self) -> usize {
        self.sections.len()
    }
}

/// The product's own chart, or its series cut out of a combined chart
fn product_chart(doc: &ReportDocument, product: &str) -> Option<ChartSpec> {
    let chart = doc.chart_for(product)?;
    let series = chart.series.iter().find(|s| s.name == product)?.clone();
    Some(ChartSpec {
        title: format!("Price projection: {}", product),
        x_label: chart.x_label.clone(),
        y_label: chart.y_label.clone(),
        series: vec![series],
    })
}

/// Rendering sink for a laid-out document
pub trait DocumentRenderer {
    fn render(&self, layout: &DocumentLayout, out: &mut dyn Write) -> Result<()>;
}

/// Plain-text renderer: one page per section, separated by form feeds
#[derive(Debug, Clone)]
pub struct TextRenderer {
    pub chart_width: usize,
    pub chart_height: usize,
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self {
            chart_width: 60,
            chart_height: 12,
        }
    }
}

const PAGE_BREAK: char = '\x0c';
const MARKERS: [char; 6] = ['*', '+', 'o', 'x', '#', '@'];

impl DocumentRenderer for TextRenderer {
    fn render(&self, layout: &DocumentLayout, out: &mut dyn Write) -> Result<()> {
        let decimals = layout.metadata.decimals;
        let pages = layout.page_count();

        for (page, section) in layout.sections.iter().enumerate() {
            if page > 0 {
                write!(out, "{}", PAGE_BREAK)?;
            }
            if page == 0 {
                writeln!(out, "{}", layout.metadata.title)?;
                writeln!(out, "{}", "=".repeat(layout.metadata.title.chars().count()))?;
                writeln!(out, "Horizon: period {}", layout.metadata.horizon)?;
                writeln!(out, "Products: {}", layout.metadata.product_count)?;
                writeln!(out, "Inflation series: {}", layout.metadata.series_version)?;
                if let Some(at) = layout.metadata.generated_at {
                    writeln!(out, "Generated at: {}", at.format("%Y-%m-%d %H:%M:%S UTC"))?;
                }
                writeln!(out)?;
            }

            writeln!(out, "{}", section.heading)?;
            writeln!(out, "{}", "-".repeat(section.heading.chars().count()))?;
            writeln!(out)?;

            for table in &section.tables {
                writeln!(out, "{}", render_table(table, decimals))?;
                writeln!(out)?;
            }
            for chart in &section.charts {
                writeln!(out, "{}", self.render_chart(chart, decimals))?;
            }

            writeln!(out, "Page {} of {}", page + 1, pages)?;
        }

        Ok(())
    }
}

impl TextRenderer {
    /// Character plot of all series on shared axes.
    pub fn render_chart(&self, chart: &ChartSpec, decimals: u32) -> String {
        let width = self.chart_width.max(2);
        let height = self.chart_height.max(2);

        let points: Vec<(usize, u32, f64)> = chart
            .series
            .iter()
            .enumerate()
            .flat_map(|(si, s)| {
                s.points
                    .iter()
                    .map(move |(p, v)| (si, p.0, v.to_f64().unwrap_or_default()))
            })
            .collect();

        let mut lines = vec![chart.title.clone()];
        if points.is_empty() {
            lines.push("(no data)".to_string());
            return lines.join("\n");
        }

        let p_min = points.iter().map(|(_, p, _)| *p).min().unwrap_or(0);
        let p_max = points.iter().map(|(_, p, _)| *p).max().unwrap_or(0);
        let v_min = points.iter().map(|(_, _, v)| *v).fold(f64::INFINITY, f64::min);
        let mut v_max = points.iter().map(|(_, _, v)| *v).fold(f64::NEG_INFINITY, f64::max);
        if v_max <= v_min {
            v_max = v_min + 1.0;
        }

        let mut grid = vec![vec![' '; width]; height];
        for (si, period, value) in &points {
            let x = if p_max == p_min {
                0
            } else {
                ((period - p_min) as usize * (width - 1)) / (p_max - p_min) as usize
            };
            let frac = (value - v_min) / (v_max - v_min);
            let y = (height - 1) - (frac * (height - 1) as f64).round() as usize;
            grid[y.min(height - 1)][x] = MARKERS[si % MARKERS.len()];
        }

        let top = format_amount(decimal_of(v_max), decimals);
        let bottom = format_amount(decimal_of(v_min), decimals);
        let label_width = top.len().max(bottom.len());

        for (row, cells) in grid.iter().enumerate() {
            let label = if row == 0 {
                top.as_str()
            } else if row == height - 1 {
                bottom.as_str()
            } else {
                ""
            };
            let line: String = cells.iter().collect();
            lines.push(format!("{:>w$} |{}", label, line.trim_end(), w = label_width));
        }
        lines.push(format!("{:>w$} +{}", "", "-".repeat(width), w = label_width));

        let first = p_min.to_string();
        let last = p_max.to_string();
        let gap = width.saturating_sub(first.len() + last.len());
        lines.push(format!(
            "{:>w$}  {}{}{}   ({})",
            "",
            first,
            " ".repeat(gap),
            last,
            chart.x_label,
            w = label_width
        ));

        let legend: Vec<String> = chart
            .series
            .iter()
            .enumerate()
            .map(|(si, s)| format!("{} {}", MARKERS[si % MARKERS.len()], s.name))
            .collect();
        lines.push(format!("{}: {}", chart.y_label, legend.join("   ")));

        lines.join("\n")
    }
}

fn decimal_of(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

fn render_table(table: &Table, decimals: u32) -> String {
    let mut builder = Builder::default();
    builder.push_record(table.columns.iter().cloned());
    for row in &table.rows {
        let mut record = Vec::with_capacity(row.cells.len() + 1);
        record.push(row.key.clone());
        record.extend(row.cells.iter().map(|c| format_cell(c, decimals)));
        builder.push_record(record);
    }

    let mut rendered = builder.build();
    rendered.with(Style::ascii());
    rendered.to_string()
}

/// Lay out `doc` and render it into the file at `path`.
pub fn write_document<P: AsRef<Path>>(
    doc: &ReportDocument,
    path: P,
    renderer: &dyn DocumentRenderer,
) -> Result<()> {
    let path = path.as_ref();
    info!("Writing report document: {:?}", path);

    let layout = DocumentLayout::from_report(doc);
    let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
    let mut writer = BufWriter::new(file);
    renderer.render(&layout, &mut writer)?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {:?}", path))?;
    Ok(())
}
