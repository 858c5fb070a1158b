//! Renderer-agnostic report representation
//!
//! Tables hold already-rounded values; adapters decide how a cell looks, never
//! what it contains.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::inflation::Period;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDocument {
    pub metadata: ReportMetadata,
    pub tables: Vec<Table>,
    pub charts: Vec<ChartSpec>,
}

impl ReportDocument {
    /// Stamp the generation time, kept apart from the data tables.
    pub fn with_generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.metadata.generated_at = Some(at);
        self
    }

    pub fn summary(&self) -> Option<&Table> {
        self.tables
            .iter()
            .find(|t| matches!(t.kind, TableKind::Summary))
    }

    pub fn detail(&self, product: &str) -> Option<&Table> {
        self.tables.iter().find(|t| match &t.kind {
            TableKind::Detail { product: p } => p == product,
            TableKind::Summary => false,
        })
    }

    /// Chart showing `product`: its own chart, or the combined one.
    pub fn chart_for(&self, product: &str) -> Option<&ChartSpec> {
        self.charts
            .iter()
            .find(|c| c.series.len() == 1 && c.series[0].name == product)
            .or_else(|| {
                self.charts
                    .iter()
                    .find(|c| c.series.iter().any(|s| s.name == product))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMetadata {
    pub title: String,
    pub horizon: Period,
    pub series_version: String,
    pub product_count: usize,
    pub decimals: u32,
    /// Wall-clock stamp; `None` until the caller sets it
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TableKind {
    Summary,
    Detail { product: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub name: String,
    pub kind: TableKind,
    /// Header labels; the first names the row-key column
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub key: String,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Cell {
    Empty,
    Text(String),
    Amount(Decimal),
    /// Percentage points (5.00 means 5%)
    Percent(Decimal),
}

impl Cell {
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Cell::Amount(v) | Cell::Percent(v) => Some(*v),
            Cell::Empty | Cell::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSpec {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<ChartSeries>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<(Period, Decimal)>,
}
