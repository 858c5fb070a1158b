//! Forecast engine
//!
//! Projects every catalog product from its base period to the horizon by
//! chained compounding: `price[t] = price[t-1] * (1 + rate[t])`.
//!
//! All arithmetic is done in `Decimal` at full precision; nothing is rounded
//! here. Rounding to display decimals is the report builder's job.

use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::catalog::{Catalog, Product};
use crate::error::ForecastError;
use crate::inflation::{InflationSeries, Period};

/// One projected price for one product at one period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub product: String,
    pub period: Period,
    /// Rate applied to reach this period; `None` at the base period
    pub rate: Option<Decimal>,
    pub price: Decimal,
}

/// All projections of one run, ordered by catalog order then period
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectionSet {
    pub horizon: Period,
    /// Version of the inflation series used (see [`InflationSeries::version`])
    pub series_version: String,
    pub projections: Vec<Projection>,
}

impl ProjectionSet {
    pub fn len(&self) -> usize {
        self.projections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projections.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Projection> {
        self.projections.iter()
    }

    pub fn for_product<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Projection> + 'a {
        self.projections.iter().filter(move |p| p.product == name)
    }

    pub fn price_at(&self, name: &str, period: Period) -> Option<Decimal> {
        self.for_product(name)
            .find(|p| p.period == period)
            .map(|p| p.price)
    }
}

/// Cooperative cancellation flag, checked between products
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct ForecastOptions {
    /// Project products on the rayon pool (needs the `parallel` feature)
    pub parallel: bool,
    pub cancel: Option<CancellationToken>,
}

impl Default for ForecastOptions {
    fn default() -> Self {
        Self {
            parallel: cfg!(feature = "parallel"),
            cancel: None,
        }
    }
}

/// Project every product in `catalog` through `horizon`.
///
/// Validation covers the whole catalog before any price is computed, so a run
/// either returns the complete set or an error.
pub fn forecast(
    catalog: &Catalog,
    series: &InflationSeries,
    horizon: Period,
) -> Result<ProjectionSet, ForecastError> {
    forecast_with(catalog, series, horizon, &ForecastOptions::default())
}

pub fn forecast_with(
    catalog: &Catalog,
    series: &InflationSeries,
    horizon: Period,
    options: &ForecastOptions,
) -> Result<ProjectionSet, ForecastError> {
    validate(catalog, series, horizon)?;

    info!(
        "Forecasting {} products through period {} (parallel: {})",
        catalog.len(),
        horizon,
        options.parallel
    );

    let per_product = if options.parallel {
        project_parallel(catalog, series, horizon, options.cancel.as_ref())?
    } else {
        project_sequential(catalog, series, horizon, options.cancel.as_ref())?
    };

    let projections: Vec<Projection> = per_product.into_iter().flatten().collect();
    debug!("Computed {} projections", projections.len());

    Ok(ProjectionSet {
        horizon,
        series_version: series.version(),
        projections,
    })
}

fn validate(
    catalog: &Catalog,
    series: &InflationSeries,
    horizon: Period,
) -> Result<(), ForecastError> {
    if catalog.is_empty() {
        return Err(ForecastError::EmptyCatalog);
    }

    for product in catalog {
        if product.base_period() > horizon {
            return Err(ForecastError::InvalidHorizon {
                product: product.name().to_string(),
                base_period: product.base_period(),
                horizon,
            });
        }

        series
            .covers(product.base_period(), horizon)
            .map_err(|missing| ForecastError::IncompleteSeries {
                product: Some(product.name().to_string()),
                missing,
            })?;
    }

    Ok(())
}

fn check_cancelled(cancel: Option<&CancellationToken>) -> Result<(), ForecastError> {
    match cancel {
        Some(token) if token.is_cancelled() => Err(ForecastError::Cancelled),
        _ => Ok(()),
    }
}

fn project_sequential(
    catalog: &Catalog,
    series: &InflationSeries,
    horizon: Period,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Vec<Projection>>, ForecastError> {
    catalog
        .iter()
        .map(|product| {
            check_cancelled(cancel)?;
            project_product(product, series, horizon)
        })
        .collect()
}

/// Per-product projection on the rayon pool.
///
/// Results are gathered in catalog order before the first error is taken, so
/// the outcome matches the sequential path exactly.
#[cfg(feature = "parallel")]
fn project_parallel(
    catalog: &Catalog,
    series: &InflationSeries,
    horizon: Period,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Vec<Projection>>, ForecastError> {
    use rayon::prelude::*;

    let products: Vec<&Product> = catalog.iter().collect();
    let results: Vec<Result<Vec<Projection>, ForecastError>> = products
        .par_iter()
        .map(|product| {
            check_cancelled(cancel)?;
            project_product(product, series, horizon)
        })
        .collect();

    results.into_iter().collect()
}

/// Fallback to sequential when the `parallel` feature is disabled.
#[cfg(not(feature = "parallel"))]
fn project_parallel(
    catalog: &Catalog,
    series: &InflationSeries,
    horizon: Period,
    cancel: Option<&CancellationToken>,
) -> Result<Vec<Vec<Projection>>, ForecastError> {
    project_sequential(catalog, series, horizon, cancel)
}

fn project_product(
    product: &Product,
    series: &InflationSeries,
    horizon: Period,
) -> Result<Vec<Projection>, ForecastError> {
    let name = product.name();
    let base = product.base_period();
    let mut price = product.base_price();

    let mut points = Vec::with_capacity((horizon.0 - base.0) as usize + 1);
    points.push(Projection {
        product: name.to_string(),
        period: base,
        rate: None,
        price,
    });

    for period in base.through(horizon).skip(1) {
        let rate = series
            .rate_at(period)
            .ok_or_else(|| ForecastError::IncompleteSeries {
                product: Some(name.to_string()),
                missing: period,
            })?;

        let factor = Decimal::ONE.checked_add(rate);
        price = factor
            .and_then(|f| price.checked_mul(f))
            .ok_or_else(|| ForecastError::Overflow {
                product: name.to_string(),
                period,
            })?;

        points.push(Projection {
            product: name.to_string(),
            period,
            rate: Some(rate),
            price,
        });
    }

    debug!("Projected '{}' over {} periods", name, points.len());
    Ok(points)
}
