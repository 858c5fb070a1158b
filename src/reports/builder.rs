use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::document::{
    Cell, ChartSeries, ChartSpec, ReportDocument, ReportMetadata, Row, Table, TableKind,
};
use crate::catalog::{Catalog, Product};
use crate::error::ForecastError;
use crate::forecast::{Projection, ProjectionSet};
use crate::inflation::Period;

pub const SUMMARY_TABLE: &str = "Summary";
pub const DEFAULT_TITLE: &str = "Price Forecast Report";

/// How price charts are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartLayout {
    /// One chart per product
    #[default]
    PerProduct,
    /// A single chart with one series per product
    Combined,
}

impl ChartLayout {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartLayout::PerProduct => "per_product",
            ChartLayout::Combined => "combined",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "per_product" | "product" => Some(ChartLayout::PerProduct),
            "combined" | "single" => Some(ChartLayout::Combined),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub chart_layout: ChartLayout,
    /// Display decimals applied to every amount and percentage
    pub decimals: u32,
    pub title: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            chart_layout: ChartLayout::default(),
            decimals: 2,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

/// Build the report for a projection set with default options.
pub fn build_report(
    projections: &ProjectionSet,
    catalog: &Catalog,
) -> Result<ReportDocument, ForecastError> {
    build_report_with(projections, catalog, &ReportOptions::default())
}

/// Build summary and detail tables plus chart specs.
///
/// Row, column and series order follow catalog order and ascending periods
/// only. The projection set is checked against the catalog first; a mismatch
/// is an internal error since the engine never produces one.
pub fn build_report_with(
    projections: &ProjectionSet,
    catalog: &Catalog,
    options: &ReportOptions,
) -> Result<ReportDocument, ForecastError> {
    let grouped = group_by_product(projections, catalog)?;

    let first_period = catalog
        .earliest_base_period()
        .ok_or_else(|| ForecastError::ReportConsistency("catalog is empty".to_string()))?;
    let horizon = projections.horizon;

    let mut tables = Vec::with_capacity(catalog.len() + 1);
    tables.push(summary_table(&grouped, first_period, horizon, options.decimals));
    tables.extend(
        grouped
            .iter()
            .map(|(product, points)| detail_table(product, points, options.decimals)),
    );

    let charts = match options.chart_layout {
        ChartLayout::PerProduct => grouped
            .iter()
            .map(|(product, points)| ChartSpec {
                title: format!("Price projection: {}", product.name()),
                x_label: "Period".to_string(),
                y_label: "Price".to_string(),
                series: vec![chart_series(product, points, options.decimals)],
            })
            .collect(),
        ChartLayout::Combined => vec![ChartSpec {
            title: "Price projections".to_string(),
            x_label: "Period".to_string(),
            y_label: "Price".to_string(),
            series: grouped
                .iter()
                .map(|(product, points)| chart_series(product, points, options.decimals))
                .collect(),
        }],
    };

    info!(
        "Built report: {} tables, {} charts",
        tables.len(),
        charts.len()
    );

    Ok(ReportDocument {
        metadata: ReportMetadata {
            title: options.title.clone(),
            horizon,
            series_version: projections.series_version.clone(),
            product_count: catalog.len(),
            decimals: options.decimals,
            generated_at: None,
        },
        tables,
        charts,
    })
}

/// Round for display: half away from zero at `decimals` places.
pub fn round_display(value: Decimal, decimals: u32) -> Decimal {
    value.round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
}

/// Pair each catalog product with its projections, checking completeness.
fn group_by_product<'a>(
    projections: &'a ProjectionSet,
    catalog: &'a Catalog,
) -> Result<Vec<(&'a Product, Vec<&'a Projection>)>, ForecastError> {
    if let Some(stray) = projections
        .iter()
        .find(|p| catalog.get(&p.product).is_none())
    {
        return Err(ForecastError::ReportConsistency(format!(
            "projection for '{}' which is not in the catalog",
            stray.product
        )));
    }

    let mut grouped = Vec::with_capacity(catalog.len());
    for product in catalog {
        let points: Vec<&Projection> = projections.for_product(product.name()).collect();

        let expected = product.base_period().through(projections.horizon);
        let actual = points.iter().map(|p| p.period);
        if !expected.eq(actual) {
            return Err(ForecastError::ReportConsistency(format!(
                "projections for '{}' do not cover periods {}..={} in order",
                product.name(),
                product.base_period(),
                projections.horizon
            )));
        }

        if points.first().map(|p| p.price) != Some(product.base_price()) {
            return Err(ForecastError::ReportConsistency(format!(
                "projection for '{}' at base period {} differs from its base price",
                product.name(),
                product.base_period()
            )));
        }

        grouped.push((product, points));
    }

    debug!("Grouped projections for {} products", grouped.len());
    Ok(grouped)
}

fn summary_table(
    grouped: &[(&Product, Vec<&Projection>)],
    first_period: Period,
    horizon: Period,
    decimals: u32,
) -> Table {
    let periods: Vec<Period> = first_period.through(horizon).collect();

    let mut columns = Vec::with_capacity(periods.len() + 1);
    columns.push("Product".to_string());
    columns.extend(periods.iter().map(|p| p.label()));

    let rows = grouped
        .iter()
        .map(|(product, points)| {
            let base = product.base_period();
            let cells = periods
                .iter()
                .map(|period| {
                    if *period < base {
                        Cell::Empty
                    } else {
                        let idx = (period.0 - base.0) as usize;
                        Cell::Amount(round_display(points[idx].price, decimals))
                    }
                })
                .collect();
            Row {
                key: product.name().to_string(),
                cells,
            }
        })
        .collect();

    Table {
        name: SUMMARY_TABLE.to_string(),
        kind: TableKind::Summary,
        columns,
        rows,
    }
}

fn detail_table(product: &Product, points: &[&Projection], decimals: u32) -> Table {
    let base_price = product.base_price();

    let rows = points
        .iter()
        .map(|point| {
            let rate = match point.rate {
                Some(r) => percent_cell(r.checked_mul(Decimal::ONE_HUNDRED), decimals),
                None => Cell::Empty,
            };

            let change = percent_cell(change_from_base(point.price, base_price), decimals);

            Row {
                key: point.period.label(),
                cells: vec![
                    rate,
                    Cell::Amount(round_display(point.price, decimals)),
                    change,
                ],
            }
        })
        .collect();

    Table {
        name: format!("Detail: {}", product.name()),
        kind: TableKind::Detail {
            product: product.name().to_string(),
        },
        columns: vec![
            "Period".to_string(),
            "Rate".to_string(),
            "Price".to_string(),
            "Change from base".to_string(),
        ],
        rows,
    }
}

/// Percentage change from `base`; `None` for a zero base or a value out of range
fn change_from_base(price: Decimal, base: Decimal) -> Option<Decimal> {
    price
        .checked_sub(base)?
        .checked_div(base)?
        .checked_mul(Decimal::ONE_HUNDRED)
}

fn percent_cell(value: Option<Decimal>, decimals: u32) -> Cell {
    match value {
        Some(pct) => Cell::Percent(round_display(pct, decimals)),
        None => Cell::Text("n/a".to_string()),
    }
}

fn chart_series(product: &Product, points: &[&Projection], decimals: u32) -> ChartSeries {
    ChartSeries {
        name: product.name().to_string(),
        points: points
            .iter()
            .map(|p| (p.period, round_display(p.price, decimals)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::forecast;
    use crate::inflation::InflationSeries;
    use rust_decimal_macros::dec;

    fn setup() -> (Catalog, ProjectionSet) {
        let catalog = Catalog::from_products(vec![
            Product::new("A", dec!(100), Period(0), None).unwrap(),
            Product::new("B", dec!(0), Period(1), None).unwrap(),
            Product::new("C", dec!(10), Period(1), Some("Food".to_string())).unwrap(),
        ])
        .unwrap();
        let series = InflationSeries::new(vec![
            (Period(0), dec!(0.0)),
            (Period(1), dec!(0.05)),
            (Period(2), dec!(0.05)),
        ])
        .unwrap();
        let set = forecast(&catalog, &series, Period(2)).unwrap();
        (catalog, set)
    }

    #[test]
    fn test_summary_table() {
        let (catalog, set) = setup();
        let report = build_report(&set, &catalog).unwrap();
        let summary = report.summary().unwrap();

        assert_eq!(summary.name, "Summary");
        assert_eq!(summary.columns, vec!["Product", "0", "1", "2"]);
        let keys: Vec<&str> = summary.rows.iter().map(|r| r.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);

        assert_eq!(
            summary.rows[0].cells,
            vec![
                Cell::Amount(dec!(100.00)),
                Cell::Amount(dec!(105.00)),
                Cell::Amount(dec!(110.25)),
            ]
        );
        assert_eq!(summary.rows[2].cells[0], Cell::Empty);
        assert_eq!(summary.rows[2].cells[2], Cell::Amount(dec!(10.50)));
    }

    #[test]
    fn test_detail_tables() {
        let (catalog, set) = setup();
        let report = build_report(&set, &catalog).unwrap();

        let a = report.detail("A").unwrap();
        assert_eq!(a.name, "Detail: A");
        assert_eq!(a.columns, vec!["Period", "Rate", "Price", "Change from base"]);
        assert_eq!(a.rows.len(), 3);
        assert_eq!(
            a.rows[0].cells,
            vec![Cell::Empty, Cell::Amount(dec!(100)), Cell::Percent(dec!(0))]
        );
        assert_eq!(
            a.rows[2].cells,
            vec![
                Cell::Percent(dec!(5.00)),
                Cell::Amount(dec!(110.25)),
                Cell::Percent(dec!(10.25)),
            ]
        );

        let b = report.detail("B").unwrap();
        assert_eq!(b.rows[0].key, "1");
        assert_eq!(b.rows[1].cells[2], Cell::Text("n/a".to_string()));
    }

    #[test]
    fn test_chart_layouts() {
        let (catalog, set) = setup();

        let per_product = build_report(&set, &catalog).unwrap();
        assert_eq!(per_product.charts.len(), 3);
        assert_eq!(per_product.charts[1].series[0].name, "B");
        assert_eq!(
            per_product.charts[0].series[0].points,
            vec![
                (Period(0), dec!(100)),
                (Period(1), dec!(105)),
                (Period(2), dec!(110.25)),
            ]
        );

        let options = ReportOptions {
            chart_layout: ChartLayout::Combined,
            ..ReportOptions::default()
        };
        let combined = build_report_with(&set, &catalog, &options).unwrap();
        assert_eq!(combined.charts.len(), 1);
        let names: Vec<&str> = combined.charts[0]
            .series
            .iter()
            .map(|s| s.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        assert_eq!(combined.chart_for("C").unwrap().series.len(), 3);
    }

    #[test]
    fn test_build_is_deterministic() {
        let (catalog, set) = setup();
        let first = build_report(&set, &catalog).unwrap();
        let second = build_report(&set, &catalog).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert!(first.metadata.generated_at.is_none());
    }

    #[test]
    fn test_display_rounding_is_deferred() {
        let catalog =
            Catalog::from_products(vec![Product::new("A", dec!(1), Period(0), None).unwrap()])
                .unwrap();
        let series = InflationSeries::new(vec![
            (Period(0), dec!(0)),
            (Period(1), dec!(0.004)),
            (Period(2), dec!(0.004)),
        ])
        .unwrap();
        let set = forecast(&catalog, &series, Period(2)).unwrap();

        // 1.004^2 = 1.008016, rounding each step would give 1.00 throughout
        assert_eq!(set.price_at("A", Period(2)), Some(dec!(1.008016)));
        let report = build_report(&set, &catalog).unwrap();
        assert_eq!(
            report.summary().unwrap().rows[0].cells[2],
            Cell::Amount(dec!(1.01))
        );
    }

    #[test]
    fn test_missing_period_is_consistency_error() {
        let (catalog, mut set) = setup();
        set.projections.retain(|p| !(p.product == "C" && p.period == Period(2)));

        let err = build_report(&set, &catalog).unwrap_err();
        assert!(matches!(err, ForecastError::ReportConsistency(_)));
    }

    #[test]
    fn test_base_price_mismatch_is_consistency_error() {
        let (catalog, mut set) = setup();
        let first = set
            .projections
            .iter_mut()
            .find(|p| p.product == "A" && p.period == Period(0))
            .unwrap();
        first.price = dec!(101);

        let err = build_report(&set, &catalog).unwrap_err();
        match err {
            ForecastError::ReportConsistency(detail) => {
                assert!(detail.contains("'A'"));
                assert!(detail.contains("base price"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_huge_prices_do_not_break_percentages() {
        let catalog =
            Catalog::from_products(vec![Product::new("A", dec!(1), Period(0), None).unwrap()])
                .unwrap();
        let mut entries = vec![(Period(0), dec!(0))];
        entries.extend((1..=1000).map(|p| (Period(p), dec!(0.065))));
        let series = InflationSeries::new(entries).unwrap();

        let set = forecast(&catalog, &series, Period(1000)).unwrap();
        let last_price = set.price_at("A", Period(1000)).unwrap();
        assert!(last_price > dec!(1000000000000000000000000000));

        let doc = build_report(&set, &catalog).unwrap();
        let detail = doc.detail("A").unwrap();
        let last = detail.rows.last().unwrap();
        assert_eq!(last.key, "1000");
        assert_eq!(last.cells[0], Cell::Percent(dec!(6.50)));
        assert_eq!(last.cells[1], Cell::Amount(round_display(last_price, 2)));
        assert_eq!(last.cells[2], Cell::Text("n/a".to_string()));

        // Early periods still get a real percentage
        assert_eq!(detail.rows[1].cells[2], Cell::Percent(dec!(6.50)));
    }

    #[test]
    fn test_unknown_product_is_consistency_error() {
        let (_, set) = setup();
        let other = Catalog::from_products(vec![
            Product::new("A", dec!(100), Period(0), None).unwrap(),
        ])
        .unwrap();

        let err = build_report(&set, &other).unwrap_err();
        assert!(matches!(err, ForecastError::ReportConsistency(_)));
    }

    #[test]
    fn test_round_display_midpoint() {
        assert_eq!(round_display(dec!(2.345), 2), dec!(2.35));
        assert_eq!(round_display(dec!(-2.345), 2), dec!(-2.35));
        assert_eq!(round_display(dec!(2.344999), 2), dec!(2.34));
    }

    #[test]
    fn test_chart_layout_parsing() {
        assert_eq!(ChartLayout::from_str("Combined"), Some(ChartLayout::Combined));
        assert_eq!(ChartLayout::from_str("per-product"), Some(ChartLayout::PerProduct));
        assert_eq!(ChartLayout::from_str("pie"), None);
        assert_eq!(ChartLayout::Combined.as_str(), "combined");
    }
}
