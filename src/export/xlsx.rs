use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_xlsxwriter::{Chart, ChartType, Format, Workbook, Worksheet};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

use crate::reports::{Cell, ChartSpec, ReportDocument, Table, TableKind};

/// Excel's limit on sheet name length
const MAX_SHEET_NAME: usize = 31;

/// Write each report table to its own sheet, with line charts.
///
/// Per-product charts go into the product's detail sheet; a combined chart is
/// placed below the summary table and reads its series from the summary rows.
pub fn write_workbook<P: AsRef<Path>>(doc: &ReportDocument, path: P) -> Result<()> {
    let path = path.as_ref();
    info!("Writing report workbook: {:?}", path);

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let amount_format = Format::new().set_num_format(amount_pattern(doc.metadata.decimals));
    let percent_format = Format::new().set_num_format(percent_pattern(doc.metadata.decimals));

    let names = sheet_names(&doc.tables);

    for (table, sheet_name) in doc.tables.iter().zip(&names) {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(sheet_name)
            .with_context(|| format!("Invalid sheet name '{}'", sheet_name))?;

        write_table(worksheet, table, &header_format, &amount_format, &percent_format)?;

        for chart in charts_for_table(doc, table) {
            insert_chart(worksheet, sheet_name, table, chart)?;
        }

        debug!("Wrote sheet '{}' ({} rows)", sheet_name, table.rows.len());
    }

    workbook
        .save(path)
        .with_context(|| format!("Failed to save workbook {:?}", path))?;
    Ok(())
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &Table,
    header_format: &Format,
    amount_format: &Format,
    percent_format: &Format,
) -> Result<()> {
    for (col, header) in table.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, header, header_format)?;
    }
    worksheet.set_column_width(0, first_column_width(table))?;

    for (idx, row) in table.rows.iter().enumerate() {
        let r = idx as u32 + 1;
        worksheet.write_string(r, 0, &row.key)?;

        for (c, cell) in row.cells.iter().enumerate() {
            let col = c as u16 + 1;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string(r, col, s)?;
                }
                Cell::Amount(v) => {
                    worksheet.write_number_with_format(r, col, to_number(*v), amount_format)?;
                }
                Cell::Percent(v) => {
                    worksheet.write_number_with_format(r, col, to_number(*v), percent_format)?;
                }
            }
        }
    }

    Ok(())
}

fn charts_for_table<'a>(doc: &'a ReportDocument, table: &Table) -> Vec<&'a ChartSpec> {
    match &table.kind {
        TableKind::Summary => doc.charts.iter().filter(|c| c.series.len() > 1).collect(),
        TableKind::Detail { product } => doc
            .charts
            .iter()
            .filter(|c| c.series.len() == 1 && &c.series[0].name == product)
            .collect(),
    }
}

fn insert_chart(
    worksheet: &mut Worksheet,
    sheet_name: &str,
    table: &Table,
    spec: &ChartSpec,
) -> Result<()> {
    let last_row = table.rows.len() as u32;
    if last_row == 0 {
        return Ok(());
    }

    let mut chart = Chart::new(ChartType::Line);
    chart.title().set_name(spec.title.as_str());
    chart.x_axis().set_name(spec.x_label.as_str());
    chart.y_axis().set_name(spec.y_label.as_str());

    match &table.kind {
        TableKind::Detail { .. } => {
            // Period keys in column 0, prices in the "Price" column
            let price_col = table
                .columns
                .iter()
                .position(|c| c == "Price")
                .unwrap_or(2) as u16;
            chart
                .add_series()
                .set_name(spec.series[0].name.as_str())
                .set_categories((sheet_name, 1, 0, last_row, 0))
                .set_values((sheet_name, 1, price_col, last_row, price_col));

            let anchor_col = table.columns.len() as u16 + 1;
            worksheet.insert_chart(1, anchor_col, &chart)?;
        }
        TableKind::Summary => {
            let last_col = (table.columns.len() - 1) as u16;
            for series in &spec.series {
                if let Some(idx) = table.rows.iter().position(|r| r.key == series.name) {
                    let r = idx as u32 + 1;
                    chart
                        .add_series()
                        .set_name(series.name.as_str())
                        .set_categories((sheet_name, 0, 1, 0, last_col))
                        .set_values((sheet_name, r, 1, r, last_col));
                }
            }
            worksheet.insert_chart(last_row + 2, 0, &chart)?;
        }
    }

    Ok(())
}

/// Sheet names derived from table names, made valid and unique for Excel.
///
/// Excel forbids `[]:*?/\`, caps names at 31 characters and compares them
/// case-insensitively.
pub fn sheet_names(tables: &[Table]) -> Vec<String> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(tables.len());

    for table in tables {
        let cleaned: String = table
            .name
            .chars()
            .map(|c| match c {
                '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
                other => other,
            })
            .collect();
        let cleaned = cleaned.trim().trim_matches('\'').to_string();
        let base = if cleaned.is_empty() {
            "Sheet".to_string()
        } else {
            cleaned
        };

        let mut candidate = truncate_chars(&base, MAX_SHEET_NAME);
        let mut n = 2;
        while taken.contains(&candidate.to_lowercase()) {
            let suffix = format!(" ({})", n);
            candidate = format!(
                "{}{}",
                truncate_chars(&base, MAX_SHEET_NAME - suffix.len()),
                suffix
            );
            n += 1;
        }

        taken.insert(candidate.to_lowercase());
        names.push(candidate);
    }

    names
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect::<String>().trim_end().to_string()
}

fn first_column_width(table: &Table) -> f64 {
    let longest = table
        .rows
        .iter()
        .map(|r| r.key.chars().count())
        .chain(table.columns.first().map(|c| c.chars().count()))
        .max()
        .unwrap_or(8);
    (longest.max(8) + 2) as f64
}

fn amount_pattern(decimals: u32) -> String {
    if decimals == 0 {
        "#,##0".to_string()
    } else {
        format!("#,##0.{}", "0".repeat(decimals as usize))
    }
}

fn percent_pattern(decimals: u32) -> String {
    // Cells hold percentage points, so the % sign is a literal
    if decimals == 0 {
        "0\"%\"".to_string()
    } else {
        format!("0.{}\"%\"", "0".repeat(decimals as usize))
    }
}

fn to_number(value: Decimal) -> f64 {
    value.to_f64().unwrap_or_default()
}
