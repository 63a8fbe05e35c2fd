//! Returns engine - periodic simple returns from closing prices.
//!
//! Formula: `r_t = (P_t - P_{t-1}) / P_{t-1}`
//!
//! The first date has no prior price, so the output has one row fewer than
//! the input. A return is undefined (null) wherever either price is missing
//! (NaN counts as missing) or the prior price is zero, and whenever the ratio
//! is not finite.

use crate::{
    CapmError, Result,
    table::{PriceTable, ReturnTable},
};
use polars::prelude::*;
use tracing::debug;

/// Convert a price table into a table of fractional simple returns.
///
/// Every instrument column is processed independently; all-null columns
/// yield all-null returns.
///
/// # Errors
/// [`CapmError::InsufficientData`] when the table has fewer than two rows.
pub fn compute_returns(prices: &PriceTable) -> Result<ReturnTable> {
    let available = prices.height();
    if available < 2 {
        return Err(CapmError::InsufficientData {
            required: 2,
            available,
        });
    }

    let instruments = prices.instruments();
    let frame = prices
        .frame()
        .clone()
        .lazy()
        .with_columns(
            instruments
                .iter()
                .map(|name| simple_return(name))
                .collect::<Vec<_>>(),
        )
        .slice(1, IdxSize::MAX)
        .collect()?;

    debug!(
        instruments = instruments.len(),
        periods = frame.height(),
        "computed simple returns"
    );

    Ok(ReturnTable::from_normalized(frame))
}

fn simple_return(name: &str) -> Expr {
    let previous = col(name).shift(lit(1));
    let change = (col(name) - previous.clone()) / previous.clone();
    when(previous.eq(lit(0.0)).or(change.clone().is_finite().not()))
        .then(lit(NULL).cast(DataType::Float64))
        .otherwise(change)
        .alias(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use polars::df;
    use rstest::rstest;

    fn prices(asset: &[Option<f64>], bench: &[Option<f64>]) -> PriceTable {
        let dates: Vec<String> = (1..=asset.len())
            .map(|d| format!("2024-01-{d:02}"))
            .collect();
        PriceTable::new(
            df![
                "date" => dates,
                "AAPL" => asset.to_vec(),
                "SPY" => bench.to_vec(),
            ]
            .unwrap(),
        )
        .unwrap()
    }

    #[rstest]
    #[case(2, 100.0)]
    #[case(5, 42.5)]
    #[case(30, 0.01)]
    fn test_constant_prices_give_zero_returns(#[case] rows: usize, #[case] price: f64) {
        let series = vec![Some(price); rows];
        let returns = compute_returns(&prices(&series, &series)).unwrap();

        assert_eq!(returns.height(), rows - 1);
        for r in returns.values("AAPL").unwrap() {
            assert_eq!(r, Some(0.0));
        }
    }

    #[test]
    fn test_reference_scenario() {
        let table = prices(
            &[Some(100.0), Some(110.0), Some(99.0)],
            &[Some(1000.0), Some(1050.0), Some(1000.0)],
        );
        let returns = compute_returns(&table).unwrap();

        assert_eq!(returns.dates().unwrap(), ["2024-01-02", "2024-01-03"]);
        let asset = returns.values("AAPL").unwrap();
        assert_relative_eq!(asset[0].unwrap(), 0.10, epsilon = 1e-12);
        assert_relative_eq!(asset[1].unwrap(), -0.10, epsilon = 1e-12);
        let bench = returns.values("SPY").unwrap();
        assert_relative_eq!(bench[0].unwrap(), 0.05, epsilon = 1e-12);
        assert_relative_eq!(bench[1].unwrap(), -1.0 / 21.0, epsilon = 1e-12);
    }

    #[test]
    fn test_returns_reconstruct_prices() {
        let raw = [101.3, 99.8, 104.2, 104.2, 97.1, 120.0, 118.4];
        let series: Vec<Option<f64>> = raw.iter().copied().map(Some).collect();
        let returns = compute_returns(&prices(&series, &series)).unwrap();

        for (t, r) in returns.values("AAPL").unwrap().into_iter().enumerate() {
            let rebuilt = raw[t] * (1.0 + r.unwrap());
            assert_relative_eq!(rebuilt, raw[t + 1], max_relative = 1e-12);
        }
    }

    #[test]
    fn test_missing_and_zero_prices_are_undefined() {
        let table = prices(
            &[Some(10.0), None, Some(12.0), Some(0.0), Some(5.0)],
            &[Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0)],
        );
        let returns = compute_returns(&table).unwrap();
        let asset = returns.values("AAPL").unwrap();

        assert_eq!(asset[0], None); // current price missing
        assert_eq!(asset[1], None); // prior price missing
        assert_relative_eq!(asset[2].unwrap(), -1.0, epsilon = 1e-12);
        assert_eq!(asset[3], None); // prior price zero
    }

    #[test]
    fn test_non_finite_prices_are_undefined() {
        let table = prices(
            &[Some(100.0), Some(f64::NAN), Some(101.0), Some(f64::INFINITY), Some(100.0)],
            &[Some(1.0), Some(1.0), Some(1.0), Some(1.0), Some(1.0)],
        );
        let returns = compute_returns(&table).unwrap();
        let asset = returns.values("AAPL").unwrap();

        assert_eq!(asset[0], None);
        assert_eq!(asset[1], None);
        assert_eq!(asset[2], None); // infinite price
        assert_eq!(asset[3], None); // infinite prior price
    }

    #[test]
    fn test_all_missing_column_is_tolerated() {
        let table = prices(&[None, None, None], &[Some(1.0), Some(2.0), Some(3.0)]);
        let returns = compute_returns(&table).unwrap();
        assert!(returns.values("AAPL").unwrap().iter().all(Option::is_none));
        assert_eq!(returns.values("SPY").unwrap().len(), 2);
    }

    #[test]
    fn test_single_row_is_insufficient() {
        let table = prices(&[Some(1.0)], &[Some(1.0)]);
        let err = compute_returns(&table).unwrap_err();
        assert!(matches!(
            err,
            CapmError::InsufficientData {
                required: 2,
                available: 1
            }
        ));
    }

    #[test]
    fn test_compute_returns_is_idempotent() {
        let table = prices(
            &[Some(3.0), Some(3.3), Some(2.9), Some(3.1)],
            &[Some(7.0), Some(7.7), Some(7.1), Some(6.8)],
        );
        let first = compute_returns(&table).unwrap();
        let second = compute_returns(&table).unwrap();
        assert!(first.frame().equals_missing(second.frame()));
    }
}
