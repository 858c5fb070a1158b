use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook};
use std::path::Path;
use tracing::info;

pub const PRODUCT_HEADERS: [&str; 4] = ["Product", "Price", "Base Period", "Category"];
pub const SERIES_HEADERS: [&str; 2] = ["Period", "Rate"];

/// Months covered by the sample inflation sheet
const TEMPLATE_MONTHS: u32 = 12;

/// Write an input workbook with the expected sheets, headers and sample rows
pub fn write_template<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Writing input template: {:?}", path);

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let products = workbook.add_worksheet();
    products.set_name("Products")?;
    for (col, header) in PRODUCT_HEADERS.iter().enumerate() {
        products.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    products.set_column_width(0, 24)?;
    let samples = [("Coffee 500g", 8.90, 0u32, "Groceries"), ("Rice 5kg", 21.50, 0, "Groceries")];
    for (idx, (name, price, base, category)) in samples.iter().enumerate() {
        let row = idx as u32 + 1;
        products.write_string(row, 0, *name)?;
        products.write_number(row, 1, *price)?;
        products.write_number(row, 2, *base as f64)?;
        products.write_string(row, 3, *category)?;
    }

    let inflation = workbook.add_worksheet();
    inflation.set_name("Inflation")?;
    for (col, header) in SERIES_HEADERS.iter().enumerate() {
        inflation.write_string_with_format(0, col as u16, *header, &header_format)?;
    }
    for period in 0..=TEMPLATE_MONTHS {
        let row = period + 1;
        let rate = if period == 0 { 0.0 } else { 0.004 };
        inflation.write_number(row, 0, period as f64)?;
        inflation.write_number(row, 1, rate)?;
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save template {:?}", path))?;
    Ok(())
}
