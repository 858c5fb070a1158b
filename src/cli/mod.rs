use clap::{Parser, Subcommand};
use priceforecast::config::MAX_DECIMALS;
use rust_decimal::Decimal;
use std::path::PathBuf;

pub mod formatters;
pub mod handlers;

#[derive(Parser)]
#[command(name = "priceforecast")]
#[command(version, about = "Project product prices forward under an inflation series")]
#[command(
    long_about = "Read a product catalog and a per-period inflation series from a workbook, compound each product's price up to a horizon, and export the results as a workbook, a paginated document or JSON."
)]
pub struct Cli {
    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config.toml (defaults to the user config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Forecast prices and write the report
    Run {
        /// Source workbook with Products and Inflation sheets
        input: PathBuf,

        /// Last period to project
        #[arg(long)]
        horizon: u32,

        /// Inflation series file (.csv or .xlsx) replacing the workbook's sheet
        #[arg(long)]
        series: Option<PathBuf>,

        /// Constant annual inflation (%) replacing the workbook's sheet
        #[arg(long, allow_negative_numbers = true, conflicts_with_all = ["series", "country"])]
        annual_inflation: Option<Decimal>,

        /// Use the latest World Bank annual inflation of this country (ISO code)
        #[arg(long, conflicts_with = "series")]
        country: Option<String>,

        /// Saved catalog (.json) replacing the workbook's products
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Write the report workbook here
        #[arg(long)]
        xlsx: Option<PathBuf>,

        /// Write the paginated text document here
        #[arg(long)]
        document: Option<PathBuf>,

        /// Write the paginated PDF document here
        #[arg(long)]
        pdf: Option<PathBuf>,

        /// Write the report as JSON here
        #[arg(long)]
        json: Option<PathBuf>,

        /// One chart for all products instead of one per product
        #[arg(long)]
        combined: bool,

        /// Project products one at a time
        #[arg(long)]
        sequential: bool,

        /// Report title
        #[arg(long)]
        title: Option<String>,

        /// Decimal places shown in the report (0-10)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=MAX_DECIMALS as i64))]
        decimals: Option<u32>,
    },

    /// Write an example input workbook
    Template {
        /// Output path (.xlsx)
        path: PathBuf,
    },

    /// Show the products and series coverage of a source workbook
    Describe {
        /// Source workbook
        input: PathBuf,

        /// Save the catalog as JSON
        #[arg(long)]
        save_catalog: Option<PathBuf>,
    },
}
