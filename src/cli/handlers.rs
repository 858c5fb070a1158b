use anyhow::{Context, Result};
use chrono::Utc;
use colored::Colorize;
use rust_decimal::Decimal;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use priceforecast::config::AppConfig;
use priceforecast::catalog::Catalog;
use priceforecast::export::{
    write_document, write_json, write_workbook, PdfRenderer, TextRenderer,
};
use priceforecast::forecast::{forecast_with, ForecastOptions};
use priceforecast::importers::{
    import_series, import_workbook, read_catalog_json, write_catalog_json, write_template,
    WorldBankSource,
};
use priceforecast::inflation::{InflationSeries, Period};
use priceforecast::reports::{build_report_with, ChartLayout};

use super::formatters::{format_description, format_summary_table};

/// Arguments of the `run` subcommand
#[derive(Debug, Clone, Default)]
pub struct RunArgs {
    pub input: PathBuf,
    pub horizon: u32,
    pub series: Option<PathBuf>,
    pub annual_inflation: Option<Decimal>,
    pub country: Option<String>,
    pub catalog: Option<PathBuf>,
    pub xlsx: Option<PathBuf>,
    pub document: Option<PathBuf>,
    pub pdf: Option<PathBuf>,
    pub json: Option<PathBuf>,
    pub combined: bool,
    pub sequential: bool,
    pub title: Option<String>,
    pub decimals: Option<u32>,
}

/// Import, forecast, build the report and write every requested export
pub fn handle_run(args: &RunArgs, config: &AppConfig) -> Result<()> {
    info!("Running forecast from: {:?}", args.input);

    let mut data = import_workbook(&args.input)?;
    if let Some(path) = &args.series {
        data.series = import_series(path)?;
    }
    if let Some(path) = &args.catalog {
        data.catalog = read_catalog_json(path)?;
    }
    if let Some(pct) = args.annual_inflation {
        data.series = annual_series(&data.catalog, args.horizon, pct)?;
    } else if let Some(country) = &args.country {
        let inflation = WorldBankSource::new()?.latest_annual_inflation(country)?;
        println!(
            "Inflation: {}% a year ({}, {})",
            inflation.percent.round_dp(2),
            inflation.country,
            inflation.year
        );
        data.series = annual_series(&data.catalog, args.horizon, inflation.percent)?;
    }

    let mut options = config.report_options();
    if args.combined {
        options.chart_layout = ChartLayout::Combined;
    }
    if let Some(title) = &args.title {
        options.title = title.clone();
    }
    if let Some(decimals) = args.decimals {
        options.decimals = decimals;
    }

    let forecast_options = ForecastOptions {
        parallel: !args.sequential && ForecastOptions::default().parallel,
        cancel: None,
    };

    let projections = forecast_with(
        &data.catalog,
        &data.series,
        Period(args.horizon),
        &forecast_options,
    )?;
    let doc = build_report_with(&projections, &data.catalog, &options)?
        .with_generated_at(Utc::now());

    println!("{}", format_summary_table(&doc));

    if let Some(path) = &args.xlsx {
        let path = prepare_output(config, path)?;
        write_workbook(&doc, &path)?;
        print_written(&path);
    }
    if let Some(path) = &args.document {
        let path = prepare_output(config, path)?;
        write_document(&doc, &path, &TextRenderer::default())?;
        print_written(&path);
    }
    if let Some(path) = &args.pdf {
        let path = prepare_output(config, path)?;
        write_document(&doc, &path, &PdfRenderer::default())?;
        print_written(&path);
    }
    if let Some(path) = &args.json {
        let path = prepare_output(config, path)?;
        write_json(&doc, &path)?;
        print_written(&path);
    }

    Ok(())
}

/// Monthly series from the catalog's earliest base period to the horizon
fn annual_series(catalog: &Catalog, horizon: u32, annual_pct: Decimal) -> Result<InflationSeries> {
    let first = catalog.earliest_base_period().unwrap_or(Period(0));
    let last = Period(horizon).max(first);
    info!(
        "Using constant {}% annual inflation for periods {}..={}",
        annual_pct, first, last
    );
    Ok(InflationSeries::from_annual_percent(first, last, annual_pct)?)
}

pub fn handle_template(path: &Path) -> Result<()> {
    write_template(path)?;
    print_written(path);
    Ok(())
}

pub fn handle_describe(input: &Path, save_catalog: Option<&Path>) -> Result<()> {
    let data = import_workbook(input)?;
    println!("{}", format_description(&data.catalog, &data.series));

    if let Some(path) = save_catalog {
        write_catalog_json(&data.catalog, path)?;
        print_written(path);
    }
    Ok(())
}

fn prepare_output(config: &AppConfig, path: &Path) -> Result<PathBuf> {
    let resolved = config.resolve_output(path);
    if let Some(parent) = resolved.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory {:?}", parent))?;
    }
    Ok(resolved)
}

fn print_written(path: &Path) {
    println!("{} Wrote {}", "✓".green().bold(), path.display());
}
