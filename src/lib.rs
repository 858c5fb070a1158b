//! Priceforecast - product price projection under an inflation series
//!
//! The core (catalog, inflation, forecast, reports) is pure: it never touches
//! files or prints. Importers and exporters sit around it and exchange only
//! validated catalogs, series and report documents with it.

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod forecast;
pub mod importers;
pub mod inflation;
pub mod reports;
pub mod utils;

pub use catalog::{Catalog, CatalogError, Product};
pub use error::{describe_error, ForecastError};
pub use forecast::{
    forecast, forecast_with, CancellationToken, ForecastOptions, Projection, ProjectionSet,
};
pub use inflation::{InflationSeries, Period};
pub use reports::{build_report, build_report_with, ReportDocument, ReportOptions};
