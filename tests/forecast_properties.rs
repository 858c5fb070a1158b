// Property tests for the forecast engine and report builder

use priceforecast::{
    build_report, forecast, forecast_with, Catalog, ForecastOptions, InflationSeries, Period,
    Product,
};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Rates between -5% and +20% in basis points
fn rates_strategy(len: usize) -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec((-500i64..=2000).prop_map(|bp| Decimal::new(bp, 4)), len)
}

/// (price in cents, base period offset)
fn products_strategy(horizon: u32) -> impl Strategy<Value = Vec<(i64, u32)>> {
    prop::collection::vec((0i64..=10_000_000, 0..=horizon), 1..6)
}

fn build_inputs(horizon: u32, rates: &[Decimal], products: &[(i64, u32)]) -> (Catalog, InflationSeries) {
    let series = InflationSeries::new(
        rates
            .iter()
            .enumerate()
            .map(|(idx, rate)| (Period(idx as u32), *rate))
            .collect(),
    )
    .unwrap();
    assert_eq!(series.last_period(), Some(Period(horizon)));

    let catalog = Catalog::from_products(products.iter().enumerate().map(|(idx, (cents, base))| {
        Product::new(format!("P{}", idx), Decimal::new(*cents, 2), Period(*base), None).unwrap()
    }))
    .unwrap();

    (catalog, series)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn forecast_is_deterministic(
        (horizon, rates, products) in (1u32..24).prop_flat_map(|h| {
            (Just(h), rates_strategy(h as usize + 1), products_strategy(h))
        })
    ) {
        let (catalog, series) = build_inputs(horizon, &rates, &products);

        let first = forecast(&catalog, &series, Period(horizon)).unwrap();
        let second = forecast(&catalog, &series, Period(horizon)).unwrap();
        prop_assert_eq!(&first, &second);

        let doc_a = build_report(&first, &catalog).unwrap();
        let doc_b = build_report(&second, &catalog).unwrap();
        prop_assert_eq!(doc_a, doc_b);
    }

    #[test]
    fn sequential_matches_parallel(
        (horizon, rates, products) in (1u32..24).prop_flat_map(|h| {
            (Just(h), rates_strategy(h as usize + 1), products_strategy(h))
        })
    ) {
        let (catalog, series) = build_inputs(horizon, &rates, &products);

        let sequential = ForecastOptions { parallel: false, cancel: None };
        let parallel = ForecastOptions { parallel: true, cancel: None };

        let a = forecast_with(&catalog, &series, Period(horizon), &sequential).unwrap();
        let b = forecast_with(&catalog, &series, Period(horizon), &parallel).unwrap();
        prop_assert_eq!(a, b);
    }

    #[test]
    fn zero_rates_keep_prices_flat(
        (horizon, products) in (0u32..36).prop_flat_map(|h| (Just(h), products_strategy(h)))
    ) {
        let rates = vec![Decimal::ZERO; horizon as usize + 1];
        let (catalog, series) = build_inputs(horizon, &rates, &products);

        let set = forecast(&catalog, &series, Period(horizon)).unwrap();
        for projection in set.iter() {
            let product = catalog.get(&projection.product).unwrap();
            prop_assert_eq!(projection.price, product.base_price());
        }
    }

    #[test]
    fn one_projection_per_product_period(
        (horizon, rates, products) in (1u32..24).prop_flat_map(|h| {
            (Just(h), rates_strategy(h as usize + 1), products_strategy(h))
        })
    ) {
        let (catalog, series) = build_inputs(horizon, &rates, &products);
        let set = forecast(&catalog, &series, Period(horizon)).unwrap();

        let expected: usize = catalog
            .iter()
            .map(|p| (horizon - p.base_period().0) as usize + 1)
            .sum();
        prop_assert_eq!(set.len(), expected);

        for product in &catalog {
            let periods: Vec<Period> = set.for_product(product.name()).map(|p| p.period).collect();
            let wanted: Vec<Period> = product.base_period().through(Period(horizon)).collect();
            prop_assert_eq!(periods, wanted);
        }
    }
}
