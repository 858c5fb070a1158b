//! Error handling for the forecasting pipeline
//!
//! Core operations (`forecast`, `build_report`) fail with the typed
//! [`ForecastError`]; file-facing edges (importers, exporters, CLI) use the
//! unified anyhow-based [`Result`] for context chaining.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::inflation::Period;

/// Errors raised by the forecast engine and report builder
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ForecastError {
    #[error("catalog is empty")]
    EmptyCatalog,

    #[error("inflation series has no rate for period {missing}{}", product_suffix(.product))]
    IncompleteSeries {
        product: Option<String>,
        missing: Period,
    },

    #[error("inflation periods are not strictly increasing: {found} follows {previous}")]
    NonMonotonicPeriod { previous: Period, found: Period },

    #[error("horizon {horizon} is before base period {base_period} of product '{product}'")]
    InvalidHorizon {
        product: String,
        base_period: Period,
        horizon: Period,
    },

    #[error("inflation rate {rate} at period {period} is below -1")]
    InvalidRate { period: Period, rate: Decimal },

    #[error("projected price of '{product}' overflows at period {period}")]
    Overflow { product: String, period: Period },

    #[error("forecast cancelled")]
    Cancelled,

    #[error("report consistency error: {0}")]
    ReportConsistency(String),
}

fn product_suffix(product: &Option<String>) -> String {
    match product {
        Some(name) => format!(" (needed by product '{}')", name),
        None => String::new(),
    }
}

/// Render a core error as a message for the person operating the tool.
///
/// Unlike the `Display` impl, which is meant for logs, the wording here tells
/// the user what to fix in their input.
pub fn describe_error(error: &ForecastError) -> String {
    match error {
        ForecastError::EmptyCatalog => {
            "There are no products to forecast. Add at least one product and try again."
                .to_string()
        }
        ForecastError::IncompleteSeries {
            product: Some(name),
            missing,
        } => format!(
            "The inflation data has no rate for period {} but product \"{}\" needs it. \
             Extend the inflation series or shorten the forecast horizon.",
            missing, name
        ),
        ForecastError::IncompleteSeries {
            product: None,
            missing,
        } => format!(
            "The inflation data skips period {}. Every period must have a rate.",
            missing
        ),
        ForecastError::NonMonotonicPeriod { previous, found } => format!(
            "The inflation data is out of order: period {} appears after period {}. \
             Sort the periods in ascending order without repeats.",
            found, previous
        ),
        ForecastError::InvalidHorizon {
            product,
            base_period,
            horizon,
        } => format!(
            "The forecast horizon (period {}) is earlier than the base period ({}) of \"{}\". \
             Choose a later horizon.",
            horizon, base_period, product
        ),
        ForecastError::InvalidRate { period, rate } => format!(
            "The inflation rate {} at period {} would make prices negative. \
             Rates cannot be lower than -100%.",
            rate, period
        ),
        ForecastError::Overflow { product, period } => format!(
            "The projected price of \"{}\" grows too large to represent at period {}.",
            product, period
        ),
        ForecastError::Cancelled => "The forecast was cancelled.".to_string(),
        ForecastError::ReportConsistency(detail) => format!(
            "An internal error occurred while building the report ({}). Please report this problem.",
            detail
        ),
    }
}

/// Result type alias for file-facing operations
pub type Result<T> = anyhow::Result<T>;
