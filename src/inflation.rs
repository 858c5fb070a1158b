//! Inflation time series
//!
//! An [`InflationSeries`] is a validated run of consecutive periods, each with
//! the fractional price change that applies when moving into that period.

use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ForecastError;

/// Discrete time unit (e.g. a month) identified by its ordinal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(pub u32);

impl Period {
    /// The following period, or `None` past `u32::MAX`
    pub fn checked_next(self) -> Option<Period> {
        self.0.checked_add(1).map(Period)
    }

    /// Inclusive range of periods from `self` to `end`; empty when `end < self`.
    pub fn through(self, end: Period) -> impl Iterator<Item = Period> {
        (self.0..=end.0).map(Period)
    }

    pub fn label(self) -> String {
        self.0.to_string()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for Period {
    fn from(value: u32) -> Self {
        Period(value)
    }
}

/// Ordered, gap-free sequence of (period, rate) pairs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InflationSeries {
    entries: Vec<(Period, Decimal)>,
}

impl InflationSeries {
    /// Validate and build a series.
    ///
    /// Periods must be strictly increasing with no holes and every rate must be
    /// at least -1 (a 100% fall takes a price to zero, never below).
    pub fn new(entries: Vec<(Period, Decimal)>) -> Result<Self, ForecastError> {
        // Ordering is checked over the whole run before holes, so a shuffled
        // series reports the reversal rather than an incidental gap.
        for pair in entries.windows(2) {
            let (previous, _) = pair[0];
            let (found, _) = pair[1];
            if found <= previous {
                return Err(ForecastError::NonMonotonicPeriod { previous, found });
            }
        }
        for pair in entries.windows(2) {
            let (previous, _) = pair[0];
            let (found, _) = pair[1];
            let expected = previous.checked_next();
            if expected != Some(found) {
                return Err(ForecastError::IncompleteSeries {
                    product: None,
                    missing: expected.unwrap_or(found),
                });
            }
        }

        if let Some(&(period, rate)) = entries.iter().find(|(_, r)| *r < Decimal::NEGATIVE_ONE) {
            return Err(ForecastError::InvalidRate { period, rate });
        }

        Ok(Self { entries })
    }

    /// Monthly series derived from a single annual inflation percentage.
    ///
    /// The annual rate is converted once to the equivalent compounded monthly
    /// rate `(1 + annual/100)^(1/12) - 1`, rounded to 10 decimal places. The
    /// first period is the base period and carries a zero rate.
    pub fn from_annual_percent(
        first: Period,
        last: Period,
        annual_pct: Decimal,
    ) -> Result<Self, ForecastError> {
        if last < first {
            return Err(ForecastError::NonMonotonicPeriod {
                previous: first,
                found: last,
            });
        }

        let annual_fraction = annual_pct / Decimal::ONE_HUNDRED;
        if annual_fraction < Decimal::NEGATIVE_ONE {
            return Err(ForecastError::InvalidRate {
                period: first,
                rate: annual_fraction,
            });
        }

        let monthly = annual_fraction
            .to_f64()
            .map(|a| (1.0 + a).powf(1.0 / 12.0) - 1.0)
            .and_then(Decimal::from_f64)
            .map(|r| r.round_dp(10))
            .ok_or(ForecastError::InvalidRate {
                period: first,
                rate: annual_fraction,
            })?;

        let entries = first
            .through(last)
            .map(|p| (p, if p == first { Decimal::ZERO } else { monthly }))
            .collect();
        Self::new(entries)
    }

    pub fn entries(&self) -> &[(Period, Decimal)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first_period(&self) -> Option<Period> {
        self.entries.first().map(|(p, _)| *p)
    }

    pub fn last_period(&self) -> Option<Period> {
        self.entries.last().map(|(p, _)| *p)
    }

    /// Rate applied when moving into `period`
    pub fn rate_at(&self, period: Period) -> Option<Decimal> {
        let first = self.first_period()?;
        let offset = period.0.checked_sub(first.0)? as usize;
        self.entries.get(offset).map(|(_, rate)| *rate)
    }

    /// Check that every period in `from..=to` has a rate.
    ///
    /// Returns the first missing period on failure.
    pub fn covers(&self, from: Period, to: Period) -> Result<(), Period> {
        match (self.first_period(), self.last_period()) {
            (Some(first), Some(last)) => {
                if from < first {
                    Err(from)
                } else if to > last {
                    Err(if from > last {
                        from
                    } else {
                        last.checked_next().unwrap_or(to)
                    })
                } else {
                    Ok(())
                }
            }
            _ => Err(from),
        }
    }

    /// Content hash identifying this exact series.
    ///
    /// Rates are normalized first so `0.05` and `0.050` hash alike.
    pub fn version(&self) -> String {
        let mut hasher = blake3::Hasher::new();
        for (period, rate) in &self.entries {
            hasher.update(format!("{}:{}\n", period, rate.normalize()).as_bytes());
        }
        hasher.finalize().to_hex().as_str()[..16].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn series(entries: &[(u32, Decimal)]) -> Result<InflationSeries, ForecastError> {
        InflationSeries::new(entries.iter().map(|(p, r)| (Period(*p), *r)).collect())
    }

    #[test]
    fn test_valid_series() {
        let s = series(&[(3, dec!(0.01)), (4, dec!(0.02)), (5, dec!(-0.01))]).unwrap();
        assert_eq!(s.len(), 3);
        assert_eq!(s.first_period(), Some(Period(3)));
        assert_eq!(s.last_period(), Some(Period(5)));
        assert_eq!(s.rate_at(Period(4)), Some(dec!(0.02)));
        assert_eq!(s.rate_at(Period(2)), None);
        assert_eq!(s.rate_at(Period(6)), None);
    }

    #[test]
    fn test_non_monotonic_rejected() {
        let err = series(&[(0, dec!(0)), (2, dec!(0)), (1, dec!(0))]).unwrap_err();
        assert_eq!(
            err,
            ForecastError::NonMonotonicPeriod {
                previous: Period(2),
                found: Period(1)
            }
        );

        let err = series(&[(0, dec!(0)), (1, dec!(0)), (1, dec!(0))]).unwrap_err();
        assert_eq!(
            err,
            ForecastError::NonMonotonicPeriod {
                previous: Period(1),
                found: Period(1)
            }
        );
    }

    #[test]
    fn test_gap_rejected() {
        let err = series(&[(0, dec!(0)), (1, dec!(0.1)), (3, dec!(0.1))]).unwrap_err();
        assert_eq!(
            err,
            ForecastError::IncompleteSeries {
                product: None,
                missing: Period(2)
            }
        );
    }

    #[test]
    fn test_rate_below_minus_one_rejected() {
        let err = series(&[(0, dec!(0)), (1, dec!(-1.01))]).unwrap_err();
        assert_eq!(
            err,
            ForecastError::InvalidRate {
                period: Period(1),
                rate: dec!(-1.01)
            }
        );
        assert!(series(&[(0, dec!(0)), (1, dec!(-1))]).is_ok());
    }

    #[test]
    fn test_covers() {
        let s = series(&[(2, dec!(0)), (3, dec!(0)), (4, dec!(0))]).unwrap();
        assert_eq!(s.covers(Period(2), Period(4)), Ok(()));
        assert_eq!(s.covers(Period(3), Period(3)), Ok(()));
        assert_eq!(s.covers(Period(1), Period(3)), Err(Period(1)));
        assert_eq!(s.covers(Period(3), Period(6)), Err(Period(5)));
        assert_eq!(s.covers(Period(7), Period(9)), Err(Period(7)));

        let empty = InflationSeries::new(Vec::new()).unwrap();
        assert_eq!(empty.covers(Period(0), Period(0)), Err(Period(0)));
    }

    #[test]
    fn test_last_representable_period() {
        assert_eq!(Period(u32::MAX).checked_next(), None);
        assert_eq!(Period(4).checked_next(), Some(Period(5)));

        let s = series(&[(u32::MAX - 1, dec!(0)), (u32::MAX, dec!(0.01))]).unwrap();
        assert_eq!(s.covers(Period(u32::MAX), Period(u32::MAX)), Ok(()));
        assert_eq!(s.rate_at(Period(u32::MAX)), Some(dec!(0.01)));
        assert_eq!(Period(u32::MAX - 1).through(Period(u32::MAX)).count(), 2);
    }

    #[test]
    fn test_version_ignores_trailing_zeros() {
        let a = series(&[(0, dec!(0.05)), (1, dec!(0.1))]).unwrap();
        let b = series(&[(0, dec!(0.050)), (1, dec!(0.10))]).unwrap();
        let c = series(&[(0, dec!(0.05)), (1, dec!(0.2))]).unwrap();
        assert_eq!(a.version(), b.version());
        assert_ne!(a.version(), c.version());
        assert_eq!(a.version().len(), 16);
    }

    #[test]
    fn test_from_annual_percent() {
        let s = InflationSeries::from_annual_percent(Period(0), Period(12), dec!(12)).unwrap();
        assert_eq!(s.len(), 13);
        assert_eq!(s.rate_at(Period(0)), Some(Decimal::ZERO));

        // Twelve monthly steps compound back to the annual rate
        let monthly = s.rate_at(Period(1)).unwrap();
        let mut factor = Decimal::ONE;
        for _ in 0..12 {
            factor *= Decimal::ONE + monthly;
        }
        assert_eq!(factor.round_dp(6), dec!(1.12));
    }

    #[test]
    fn test_from_annual_percent_rejects_reversed_range() {
        let err =
            InflationSeries::from_annual_percent(Period(5), Period(2), dec!(3)).unwrap_err();
        assert!(matches!(err, ForecastError::NonMonotonicPeriod { .. }));
    }
}
