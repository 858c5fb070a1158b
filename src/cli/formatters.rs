//! Output formatting module for CLI display
//!
//! Keeps terminal presentation apart from the report document, which stays
//! renderer-agnostic.

use colored::Colorize;
use priceforecast::catalog::Catalog;
use priceforecast::inflation::InflationSeries;
use priceforecast::reports::{ReportDocument, TableKind};
use priceforecast::utils::{format_amount, format_cell, format_percent};
use rust_decimal::Decimal;
use tabled::{
    builder::Builder,
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

/// Format the summary table (one row per product, one column per period)
pub fn format_summary_table(doc: &ReportDocument) -> String {
    let mut output = String::new();
    let decimals = doc.metadata.decimals;

    output.push_str(&format!(
        "\n{} {} - horizon {}\n\n",
        "📈".cyan().bold(),
        doc.metadata.title.bold(),
        doc.metadata.horizon
    ));

    let Some(summary) = doc.summary() else {
        return output;
    };

    let mut builder = Builder::default();
    builder.push_record(summary.columns.iter().cloned());
    for row in &summary.rows {
        let mut record = vec![row.key.clone()];
        record.extend(row.cells.iter().map(|c| format_cell(c, decimals)));
        builder.push_record(record);
    }

    let mut table = builder.build();
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());
    output.push_str(&table.to_string());
    output.push('\n');

    output.push_str(&format_changes(doc));
    output
}

/// Final price and change from base per product, taken from the detail tables
fn format_changes(doc: &ReportDocument) -> String {
    let decimals = doc.metadata.decimals;
    let mut output = format!("\n{} Change from base\n", "━".repeat(40).bright_black());

    for table in &doc.tables {
        let TableKind::Detail { product } = &table.kind else {
            continue;
        };
        let Some(last) = table.rows.last() else {
            continue;
        };

        let price = last.cells.get(1).and_then(|c| c.as_decimal());
        let change = last.cells.get(2).and_then(|c| c.as_decimal());

        let price_str = price
            .map(|p| format_amount(p, decimals))
            .unwrap_or_else(|| "N/A".to_string());
        let change_str = match change {
            Some(pct) if pct > Decimal::ZERO => format_percent(pct, decimals).red().to_string(),
            Some(pct) if pct < Decimal::ZERO => format_percent(pct, decimals).green().to_string(),
            Some(pct) => format_percent(pct, decimals),
            None => "n/a".to_string(),
        };

        output.push_str(&format!(
            "{:<30} {:>14}  {}\n",
            product.bold(),
            price_str,
            change_str
        ));
    }

    output
}

/// Format catalog and series coverage for `describe`
pub fn format_description(catalog: &Catalog, series: &InflationSeries) -> String {
    #[derive(Tabled)]
    struct ProductRow {
        #[tabled(rename = "Product")]
        name: String,
        #[tabled(rename = "Base Price")]
        price: String,
        #[tabled(rename = "Base Period")]
        base_period: String,
        #[tabled(rename = "Category")]
        category: String,
    }

    let rows: Vec<ProductRow> = catalog
        .iter()
        .map(|p| ProductRow {
            name: p.name().to_string(),
            price: format_amount(p.base_price(), 2),
            base_period: p.base_period().label(),
            category: p.category().unwrap_or("-").to_string(),
        })
        .collect();

    let mut output = format!("\n{} {} products\n\n", "📦".cyan().bold(), catalog.len());

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..3), Alignment::right());
    output.push_str(&table.to_string());

    output.push_str(&format!("\n\n{}", "Inflation series".bold()));
    match (series.first_period(), series.last_period()) {
        (Some(first), Some(last)) => {
            output.push_str(&format!(
                "\n{:<12} {} to {} ({} entries)",
                "Periods:", first, last, series.len()
            ));
            if let Some(earliest) = catalog.earliest_base_period() {
                let horizon = last.0.saturating_sub(earliest.0);
                output.push_str(&format!(
                    "\n{:<12} up to period {} ({} periods from earliest base)",
                    "Horizon:", last, horizon
                ));
            }
        }
        _ => output.push_str(&format!("\n{:<12} empty", "Periods:")),
    }
    output.push_str(&format!("\n{:<12} {}\n", "Version:", series.version()));

    output
}
