//! PDF document output
//!
//! Sections start on a fresh page. Tables wider than the page are split into
//! column groups that repeat the key column, and long tables continue on the
//! next page under a repeated header. Charts are drawn as vector line plots.

use anyhow::{anyhow, Result};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point, Rgb,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::io::Write;
use tracing::debug;

use super::document::{DocumentLayout, DocumentRenderer};
use crate::reports::{ChartSpec, ReportMetadata, Table};
use crate::utils::{format_amount, format_cell};

const PT_TO_MM: f32 = 0.3528;
/// Courier advance width as a fraction of the font size
const COURIER_ADVANCE: f32 = 0.6;

const PALETTE: [(f32, f32, f32); 6] = [
    (0.12, 0.47, 0.71),
    (1.00, 0.50, 0.05),
    (0.17, 0.63, 0.17),
    (0.84, 0.15, 0.16),
    (0.58, 0.40, 0.74),
    (0.55, 0.34, 0.29),
];

/// One laid-out element of a PDF page
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Title(String),
    Heading(String),
    Line(String),
    Row { cells: Vec<String>, header: bool },
    Chart(ChartSpec),
    Gap,
}

/// A4 portrait PDF renderer; lengths in millimetres, font sizes in points
#[derive(Debug, Clone)]
pub struct PdfRenderer {
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
    pub font_size: f32,
    pub chart_height: f32,
    pub key_column_width: f32,
    pub value_column_width: f32,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            page_width: 210.0,
            page_height: 297.0,
            margin: 15.0,
            font_size: 9.0,
            chart_height: 95.0,
            key_column_width: 40.0,
            value_column_width: 24.0,
        }
    }
}

struct Fonts {
    regular: IndirectFontRef,
    mono: IndirectFontRef,
    mono_bold: IndirectFontRef,
    bold: IndirectFontRef,
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, layout: &DocumentLayout, out: &mut dyn Write) -> Result<()> {
        let pages = self.paginate(layout);
        debug!(
            "PDF layout: {} sections on {} pages",
            layout.sections.len(),
            pages.len()
        );

        let (doc, first_page, first_layer) = PdfDocument::new(
            layout.metadata.title.as_str(),
            Mm(self.page_width),
            Mm(self.page_height),
            "Layer 1",
        );
        let fonts = Fonts {
            regular: add_font(&doc, BuiltinFont::Helvetica)?,
            bold: add_font(&doc, BuiltinFont::HelveticaBold)?,
            mono: add_font(&doc, BuiltinFont::Courier)?,
            mono_bold: add_font(&doc, BuiltinFont::CourierBold)?,
        };

        let total = pages.len();
        for (idx, blocks) in pages.iter().enumerate() {
            let layer = if idx == 0 {
                doc.get_page(first_page).get_layer(first_layer)
            } else {
                let (page, layer) =
                    doc.add_page(Mm(self.page_width), Mm(self.page_height), "Layer 1");
                doc.get_page(page).get_layer(layer)
            };
            self.draw_page(&layer, &fonts, blocks, layout.metadata.decimals);
            self.draw_footer(&layer, &fonts, idx + 1, total);
        }

        let bytes = doc
            .save_to_bytes()
            .map_err(|e| anyhow!("Failed to encode PDF: {}", e))?;
        out.write_all(&bytes)?;
        Ok(())
    }
}

impl PdfRenderer {
    /// Assign every block of the layout to a page.
    pub fn paginate(&self, layout: &DocumentLayout) -> Vec<Vec<Block>> {
        let mut pager = Pager::new(self);

        for (idx, section) in layout.sections.iter().enumerate() {
            pager.break_page();
            if idx == 0 {
                pager.push(Block::Title(layout.metadata.title.clone()));
                for line in metadata_lines(&layout.metadata) {
                    pager.push(Block::Line(line));
                }
                pager.gap();
            }
            pager.push(Block::Heading(section.heading.clone()));

            let continued = format!("{} (continued)", section.heading);
            for table in &section.tables {
                for (header, rows) in self.column_groups(table, layout.metadata.decimals) {
                    let header_row = Block::Row {
                        cells: header,
                        header: true,
                    };
                    if !pager.fits_all(&[&header_row, &Block::Line(String::new())]) {
                        pager.break_page();
                        pager.push(Block::Heading(continued.clone()));
                    }
                    pager.push(header_row.clone());

                    for cells in rows {
                        let row = Block::Row {
                            cells,
                            header: false,
                        };
                        if !pager.fits(&row) {
                            pager.break_page();
                            pager.push(Block::Heading(continued.clone()));
                            pager.push(header_row.clone());
                        }
                        pager.push(row);
                    }
                    pager.gap();
                }
            }

            for chart in &section.charts {
                let block = Block::Chart(chart.clone());
                if !pager.fits(&block) {
                    pager.break_page();
                    pager.push(Block::Heading(continued.clone()));
                }
                pager.push(block);
            }
        }

        pager.finish()
    }

    /// Split a table into groups of columns that fit the page width.
    ///
    /// Each group repeats the key column; cells are already formatted.
    pub fn column_groups(&self, table: &Table, decimals: u32) -> Vec<(Vec<String>, Vec<Vec<String>>)> {
        let per_group = self.values_per_group();
        let value_columns = table.columns.len().saturating_sub(1);
        let key_header = table.columns.first().cloned().unwrap_or_default();

        let starts: Vec<usize> = if value_columns == 0 {
            vec![0]
        } else {
            (0..value_columns).step_by(per_group).collect()
        };

        starts
            .into_iter()
            .map(|start| {
                let end = (start + per_group).min(value_columns);
                let mut header = vec![key_header.clone()];
                header.extend(table.columns.iter().skip(1 + start).take(end - start).cloned());

                let rows = table
                    .rows
                    .iter()
                    .map(|row| {
                        let mut cells = vec![row.key.clone()];
                        cells.extend(
                            (start..end).map(|c| {
                                row.cells.get(c).map(|cell| format_cell(cell, decimals)).unwrap_or_default()
                            }),
                        );
                        cells
                    })
                    .collect();
                (header, rows)
            })
            .collect()
    }

    fn values_per_group(&self) -> usize {
        let room = self.content_width() - self.key_column_width;
        ((room / self.value_column_width).floor() as usize).max(1)
    }

    fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    fn line_height(&self) -> f32 {
        self.font_size * 1.4 * PT_TO_MM
    }

    /// Height available to blocks, above the footer line
    fn usable_height(&self) -> f32 {
        self.page_height - 2.0 * self.margin - 2.0 * self.line_height()
    }

    fn block_height(&self, block: &Block) -> f32 {
        let line = self.line_height();
        match block {
            Block::Title(_) => line * 2.2,
            Block::Heading(_) => line * 1.8,
            Block::Line(_) | Block::Row { .. } => line,
            Block::Chart(_) => self.chart_height,
            Block::Gap => line * 0.6,
        }
    }

    fn draw_page(&self, layer: &PdfLayerReference, fonts: &Fonts, blocks: &[Block], decimals: u32) {
        let mut y = self.page_height - self.margin;
        let line = self.line_height();

        for block in blocks {
            let height = self.block_height(block);
            match block {
                Block::Title(text) => {
                    layer.use_text(text.as_str(), self.font_size * 1.8, Mm(self.margin), Mm(y - line * 1.5), &fonts.bold);
                }
                Block::Heading(text) => {
                    layer.use_text(text.as_str(), self.font_size * 1.3, Mm(self.margin), Mm(y - line * 1.2), &fonts.bold);
                }
                Block::Line(text) => {
                    layer.use_text(text.as_str(), self.font_size, Mm(self.margin), Mm(y - line * 0.8), &fonts.regular);
                }
                Block::Row { cells, header } => {
                    let font = if *header { &fonts.mono_bold } else { &fonts.mono };
                    self.draw_row(layer, font, cells, y - line * 0.8);
                    if *header {
                        set_stroke(layer, (0.0, 0.0, 0.0), 0.3);
                        layer.add_line(polyline(&[
                            (self.margin, y - line),
                            (self.page_width - self.margin, y - line),
                        ]));
                    }
                }
                Block::Chart(chart) => self.draw_chart(layer, fonts, chart, y, decimals),
                Block::Gap => {}
            }
            y -= height;
        }
    }

    fn draw_row(&self, layer: &PdfLayerReference, font: &IndirectFontRef, cells: &[String], baseline: f32) {
        let char_width = COURIER_ADVANCE * self.font_size * PT_TO_MM;

        if let Some(key) = cells.first() {
            let max_chars = (self.key_column_width / char_width).floor() as usize;
            layer.use_text(truncate(key, max_chars), self.font_size, Mm(self.margin), Mm(baseline), font);
        }

        let max_chars = ((self.value_column_width - 1.0) / char_width).floor() as usize;
        for (idx, cell) in cells.iter().skip(1).enumerate() {
            let text = truncate(cell, max_chars);
            let right = self.margin + self.key_column_width + (idx as f32 + 1.0) * self.value_column_width;
            let x = right - text.chars().count() as f32 * char_width;
            layer.use_text(text, self.font_size, Mm(x), Mm(baseline), font);
        }
    }

    fn draw_chart(&self, layer: &PdfLayerReference, fonts: &Fonts, chart: &ChartSpec, top: f32, decimals: u32) {
        let line = self.line_height();
        layer.use_text(chart.title.as_str(), self.font_size * 1.1, Mm(self.margin), Mm(top - line), &fonts.bold);

        let left = self.margin + 22.0;
        let right = self.page_width - self.margin;
        let plot_top = top - line * 2.0;
        let plot_bottom = top - self.chart_height + line * 3.5;

        set_stroke(layer, (0.0, 0.0, 0.0), 0.5);
        layer.add_line(polyline(&[(left, plot_top), (left, plot_bottom), (right, plot_bottom)]));

        let values = chart.series.iter().flat_map(|s| s.points.iter());
        let (Some(p_min), Some(p_max)) = (
            values.clone().map(|(p, _)| p.0).min(),
            values.clone().map(|(p, _)| p.0).max(),
        ) else {
            layer.use_text("(no data)", self.font_size, Mm(left + 2.0), Mm(plot_bottom + line), &fonts.regular);
            return;
        };
        let v_min = values.clone().map(|(_, v)| *v).min().unwrap_or_default();
        let v_max = values.map(|(_, v)| *v).max().unwrap_or_default();

        let lo = v_min.to_f64().unwrap_or_default();
        let hi = v_max.to_f64().unwrap_or_default();
        let (lo, hi) = if hi > lo { (lo, hi) } else { (lo - 1.0, lo + 1.0) };
        let span = f64::from(p_max - p_min).max(1.0);

        let to_x = |period: u32| left + ((f64::from(period - p_min) / span) as f32) * (right - left);
        let to_y = |value: Decimal| {
            let frac = (value.to_f64().unwrap_or(lo) - lo) / (hi - lo);
            plot_bottom + (frac as f32) * (plot_top - plot_bottom)
        };

        for (idx, series) in chart.series.iter().enumerate() {
            let color = PALETTE[idx % PALETTE.len()];
            set_stroke(layer, color, 0.8);
            let points: Vec<(f32, f32)> = series.points.iter().map(|(p, v)| (to_x(p.0), to_y(*v))).collect();
            match points.as_slice() {
                [] => {}
                [(x, y)] => {
                    layer.add_line(polyline(&[(x - 1.0, *y), (x + 1.0, *y)]));
                    layer.add_line(polyline(&[(*x, y - 1.0), (*x, y + 1.0)]));
                }
                _ => layer.add_line(polyline(&points)),
            }
        }

        let small = self.font_size * 0.85;
        let label_y = plot_bottom - line;
        layer.use_text(format_amount(v_max, decimals), small, Mm(self.margin), Mm(plot_top - line * 0.5), &fonts.regular);
        layer.use_text(format_amount(v_min, decimals), small, Mm(self.margin), Mm(plot_bottom), &fonts.regular);
        layer.use_text(p_min.to_string(), small, Mm(left), Mm(label_y), &fonts.regular);
        layer.use_text(p_max.to_string(), small, Mm(right - 8.0), Mm(label_y), &fonts.regular);
        layer.use_text(chart.x_label.as_str(), small, Mm((left + right) / 2.0 - 5.0), Mm(label_y), &fonts.regular);

        let legend_y = label_y - line * 1.2;
        let mut x = left;
        for (idx, series) in chart.series.iter().enumerate() {
            set_stroke(layer, PALETTE[idx % PALETTE.len()], 1.2);
            layer.add_line(polyline(&[(x, legend_y + 1.0), (x + 6.0, legend_y + 1.0)]));
            layer.use_text(series.name.as_str(), small, Mm(x + 8.0), Mm(legend_y), &fonts.regular);
            x += 12.0 + series.name.chars().count() as f32 * small * 0.5 * PT_TO_MM;
            if x > right - 20.0 {
                break;
            }
        }
    }

    fn draw_footer(&self, layer: &PdfLayerReference, fonts: &Fonts, page: usize, total: usize) {
        let text = format!("Page {} of {}", page, total);
        let x = self.page_width - self.margin - 25.0;
        layer.set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));
        layer.use_text(text, self.font_size * 0.85, Mm(x), Mm(self.margin * 0.6), &fonts.regular);
    }
}

/// Tracks blocks placed on the current page
struct Pager<'a> {
    renderer: &'a PdfRenderer,
    pages: Vec<Vec<Block>>,
    current: Vec<Block>,
    used: f32,
}

impl<'a> Pager<'a> {
    fn new(renderer: &'a PdfRenderer) -> Self {
        Self {
            renderer,
            pages: Vec::new(),
            current: Vec::new(),
            used: 0.0,
        }
    }

    fn fits(&self, block: &Block) -> bool {
        self.fits_all(&[block])
    }

    fn fits_all(&self, blocks: &[&Block]) -> bool {
        let needed: f32 = blocks.iter().map(|b| self.renderer.block_height(b)).sum();
        self.current.is_empty() || self.used + needed <= self.renderer.usable_height()
    }

    fn push(&mut self, block: Block) {
        self.used += self.renderer.block_height(&block);
        self.current.push(block);
    }

    /// Spacing is dropped at the bottom of a page
    fn gap(&mut self) {
        if self.fits(&Block::Gap) {
            self.push(Block::Gap);
        }
    }

    fn break_page(&mut self) {
        if !self.current.is_empty() {
            self.pages.push(std::mem::take(&mut self.current));
            self.used = 0.0;
        }
    }

    fn finish(mut self) -> Vec<Vec<Block>> {
        self.break_page();
        self.pages
    }
}

fn metadata_lines(metadata: &ReportMetadata) -> Vec<String> {
    let mut lines = vec![
        format!("Horizon: period {}", metadata.horizon),
        format!("Products: {}", metadata.product_count),
        format!("Inflation series: {}", metadata.series_version),
    ];
    if let Some(at) = metadata.generated_at {
        lines.push(format!("Generated at: {}", at.format("%Y-%m-%d %H:%M:%S UTC")));
    }
    lines
}

fn add_font(doc: &printpdf::PdfDocumentReference, font: BuiltinFont) -> Result<IndirectFontRef> {
    doc.add_builtin_font(font)
        .map_err(|e| anyhow!("Failed to load PDF font: {}", e))
}

fn set_stroke(layer: &PdfLayerReference, (r, g, b): (f32, f32, f32), thickness: f32) {
    layer.set_outline_color(Color::Rgb(Rgb::new(r, g, b, None)));
    layer.set_outline_thickness(thickness);
}

fn polyline(points: &[(f32, f32)]) -> Line {
    Line {
        points: points
            .iter()
            .map(|(x, y)| (Point::new(Mm(*x), Mm(*y)), false))
            .collect(),
        is_closed: false,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        text.chars().take(max_chars.saturating_sub(1)).chain(std::iter::once('~')).collect()
    }
}
