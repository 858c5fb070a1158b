use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook, Data, DataType, Range, Reader, Xlsx};
use std::path::Path;
use tracing::{debug, info, warn};

use super::values::{cell_period, cell_price, cell_rate, cell_text};
use super::SourceData;
use crate::catalog::{Catalog, Product};
use crate::inflation::{InflationSeries, Period};

const PRODUCT_SHEET_PATTERNS: [&str; 3] = ["product", "catalog", "items"];
const INFLATION_SHEET_PATTERNS: [&str; 3] = ["inflation", "rate", "cpi"];

/// Column mapping for the products sheet
#[derive(Debug, Clone)]
struct ProductColumns {
    name: usize,
    price: usize,
    base_period: Option<usize>,
    category: Option<usize>,
}

impl ProductColumns {
    fn from_header(header: &[Data]) -> Option<Self> {
        let mut name = None;
        let mut price = None;
        let mut base_period = None;
        let mut category = None;

        for (idx, cell) in header.iter().enumerate() {
            let text = cell.to_string().trim().to_lowercase();

            if name.is_none() && (text.contains("product") || text == "name" || text == "sku") {
                name = Some(idx);
            }
            if price.is_none() && text.contains("price") {
                price = Some(idx);
            }
            if base_period.is_none() && (text.contains("period") || text.contains("month")) {
                base_period = Some(idx);
            }
            if category.is_none() && (text.contains("category") || text.contains("group")) {
                category = Some(idx);
            }
        }

        Some(Self {
            name: name?,
            price: price?,
            base_period,
            category,
        })
    }
}

/// Column mapping for the inflation sheet
#[derive(Debug, Clone)]
struct SeriesColumns {
    period: usize,
    rate: usize,
}

impl SeriesColumns {
    fn from_header(header: &[Data]) -> Option<Self> {
        let texts: Vec<String> = header
            .iter()
            .map(|c| c.to_string().trim().to_lowercase())
            .collect();
        let period = texts
            .iter()
            .position(|t| t.contains("period") || t.contains("month"))?;
        let rate = texts
            .iter()
            .position(|t| t.contains("rate") || t.contains("inflation"))?;
        Some(Self { period, rate })
    }
}

/// Read a catalog and inflation series from one workbook.
///
/// The products sheet needs a name and a price column; a base period column
/// is optional and defaults to the series' first period. The inflation sheet
/// needs period and rate columns.
pub fn parse_source_workbook<P: AsRef<Path>>(path: P) -> Result<SourceData> {
    let path = path.as_ref();
    info!("Parsing source workbook: {:?}", path);

    let mut workbook: Xlsx<_> = open_workbook(path).context("Failed to open Excel file")?;
    let sheet_names = workbook.sheet_names();

    let series_sheet = find_sheet(&sheet_names, &INFLATION_SHEET_PATTERNS)
        .ok_or_else(|| anyhow!("No inflation sheet found (sheets: {:?})", sheet_names))?;
    let product_sheet = find_sheet(&sheet_names, &PRODUCT_SHEET_PATTERNS)
        .or_else(|| {
            sheet_names
                .iter()
                .find(|n| **n != series_sheet)
                .cloned()
        })
        .ok_or_else(|| anyhow!("No products sheet found (sheets: {:?})", sheet_names))?;

    info!(
        "Using sheets: products='{}', inflation='{}'",
        product_sheet, series_sheet
    );

    let range = workbook
        .worksheet_range(&series_sheet)
        .with_context(|| format!("Failed to read worksheet '{}'", series_sheet))?;
    let series = parse_series_range(&range)
        .with_context(|| format!("Invalid inflation sheet '{}'", series_sheet))?;

    let default_period = series.first_period().unwrap_or(Period(0));
    let range = workbook
        .worksheet_range(&product_sheet)
        .with_context(|| format!("Failed to read worksheet '{}'", product_sheet))?;
    let catalog = parse_products_range(&range, default_period)
        .with_context(|| format!("Invalid products sheet '{}'", product_sheet))?;

    Ok(SourceData { catalog, series })
}

/// Read only the inflation sheet of a workbook
pub fn parse_series_workbook<P: AsRef<Path>>(path: P) -> Result<InflationSeries> {
    let path = path.as_ref();
    info!("Parsing inflation workbook: {:?}", path);

    let mut workbook: Xlsx<_> = open_workbook(path).context("Failed to open Excel file")?;
    let sheet_names = workbook.sheet_names();
    let sheet = find_sheet(&sheet_names, &INFLATION_SHEET_PATTERNS)
        .or_else(|| sheet_names.first().cloned())
        .ok_or_else(|| anyhow!("No sheets found in workbook"))?;

    let range = workbook
        .worksheet_range(&sheet)
        .with_context(|| format!("Failed to read worksheet '{}'", sheet))?;
    parse_series_range(&range).with_context(|| format!("Invalid inflation sheet '{}'", sheet))
}

fn find_sheet(sheet_names: &[String], patterns: &[&str]) -> Option<String> {
    patterns.iter().find_map(|pattern| {
        sheet_names
            .iter()
            .find(|name| name.to_lowercase().contains(pattern))
            .cloned()
    })
}

fn parse_products_range(range: &Range<Data>, default_period: Period) -> Result<Catalog> {
    let mut rows = range.rows().enumerate();

    let (header_idx, columns) = rows
        .by_ref()
        .find_map(|(idx, row)| ProductColumns::from_header(row).map(|c| (idx, c)))
        .ok_or_else(|| anyhow!("Could not find header row with product and price columns"))?;
    debug!("Product columns (header row {}): {:?}", header_idx + 1, columns);

    let mut catalog = Catalog::new();
    for (idx, row) in rows {
        let row_num = idx + 1;
        if row.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let name = row.get(columns.name).and_then(cell_text);
        let Some(name) = name else {
            warn!("Skipping row {}: no product name", row_num);
            continue;
        };

        let price_cell = row
            .get(columns.price)
            .ok_or_else(|| anyhow!("Row {}: missing price", row_num))?;
        let price = cell_price(price_cell).with_context(|| format!("Row {} ('{}')", row_num, name))?;

        let base_period = match columns.base_period.and_then(|c| row.get(c)) {
            Some(Data::Empty) | None => default_period,
            Some(cell) => {
                cell_period(cell).with_context(|| format!("Row {} ('{}')", row_num, name))?
            }
        };

        let category = columns
            .category
            .and_then(|c| row.get(c))
            .and_then(cell_text);

        let product = Product::new(name, price, base_period, category)
            .with_context(|| format!("Row {}", row_num))?;
        catalog
            .add(product)
            .with_context(|| format!("Row {}", row_num))?;
    }

    info!("Parsed {} products", catalog.len());
    Ok(catalog)
}

fn parse_series_range(range: &Range<Data>) -> Result<InflationSeries> {
    let mut rows = range.rows().enumerate();

    let (header_idx, columns) = rows
        .by_ref()
        .find_map(|(idx, row)| SeriesColumns::from_header(row).map(|c| (idx, c)))
        .ok_or_else(|| anyhow!("Could not find header row with period and rate columns"))?;
    debug!("Series columns (header row {}): {:?}", header_idx + 1, columns);

    let mut entries = Vec::new();
    for (idx, row) in rows {
        let row_num = idx + 1;
        let period_cell = row.get(columns.period).unwrap_or(&Data::Empty);
        let rate_cell = row.get(columns.rate).unwrap_or(&Data::Empty);
        if period_cell.is_empty() && rate_cell.is_empty() {
            continue;
        }

        let period = cell_period(period_cell).with_context(|| format!("Row {}", row_num))?;
        let rate = cell_rate(rate_cell).with_context(|| format!("Row {}", row_num))?;
        entries.push((period, rate));
    }

    info!("Parsed {} inflation entries", entries.len());
    Ok(InflationSeries::new(entries)?)
}
