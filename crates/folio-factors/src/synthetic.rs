//! Seeded synthetic portfolio series for running the factor model without a
//! backtest.

use crate::error::{FactorError, Result};
use chrono::{Datelike, Days, NaiveDate, Weekday};
use folio_data::ScalarSeries;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

/// Mean daily return of the synthetic series.
pub const SYNTHETIC_MEAN: f64 = 0.0003;
/// Daily volatility of the synthetic series.
pub const SYNTHETIC_VOL: f64 = 0.015;
/// Seed used when none is given.
pub const DEFAULT_SEED: u64 = 42;

/// Weekdays in `[start, end]`.
pub fn business_days(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
        .collect()
}

/// Cumulative returns of normally distributed daily returns on the business
/// days of the `calendar_days` ending at `end`.
///
/// Each value is `prod(1 + r) - 1` up to and including that day.
pub fn synthetic_portfolio_series(
    end: NaiveDate,
    calendar_days: u64,
    seed: u64,
) -> Result<ScalarSeries> {
    let start = end
        .checked_sub_days(Days::new(calendar_days))
        .ok_or_else(|| FactorError::Parse(format!("{calendar_days} days before {end}")))?;
    let dates = business_days(start, end);

    let normal = Normal::new(SYNTHETIC_MEAN, SYNTHETIC_VOL)
        .map_err(|e| FactorError::Distribution(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut growth = 1.0;
    let values = dates
        .iter()
        .map(|_| {
            growth *= 1.0 + normal.sample(&mut rng);
            growth - 1.0
        })
        .collect();

    Ok(ScalarSeries::new(dates, values)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_business_days_skip_weekends() {
        // 2024-01-05 is a Friday
        let start = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 9).unwrap();
        let days = business_days(start, end);

        assert_eq!(days.len(), 3);
        assert_eq!(days[1], NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    }

    #[test]
    fn test_seeded_series_is_reproducible() {
        let end = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let a = synthetic_portfolio_series(end, 3 * 365, DEFAULT_SEED).unwrap();
        let b = synthetic_portfolio_series(end, 3 * 365, DEFAULT_SEED).unwrap();
        let c = synthetic_portfolio_series(end, 3 * 365, 7).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(a.len() > 700 && a.len() < 800);
        assert_eq!(a.dates().last().copied(), Some(end));
    }
}
