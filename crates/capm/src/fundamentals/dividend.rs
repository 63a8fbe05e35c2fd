//! Dividend history, yield and dividend income.
//!
//! A dividend history is a frame with a `date` column and one column of
//! per-share payments. Missing and non-finite payments are ignored.

use super::checked_ratio;
use crate::{CapmError, Result, source::read_csv, table::DATE_COLUMN};
use polars::prelude::*;
use serde::Serialize;
use std::path::Path;
use tracing::debug;

/// Dividend figures for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DividendSummary {
    /// Most recent payment; `None` when nothing was paid
    pub latest_dividend: Option<f64>,
    /// Sum of all payments in the history
    pub total_dividends: f64,
    /// Number of payments
    pub payments: usize,
    /// `latest_dividend / current_price`; `None` when the price is not positive
    pub dividend_yield: Option<f64>,
}

/// Read a dividend history CSV (`date` plus a payment column).
pub fn read_dividend_history(path: impl AsRef<Path>) -> Result<DataFrame> {
    Ok(read_csv(path.as_ref().to_path_buf())?)
}

/// Payments in date order, skipping missing and non-finite values.
fn payments(history: &DataFrame, column: &str) -> Result<Vec<f64>> {
    for required in [DATE_COLUMN, column] {
        if history.column(required).is_err() {
            return Err(CapmError::MissingColumn(required.to_string()));
        }
    }

    let paid = history
        .clone()
        .lazy()
        .select([
            col(DATE_COLUMN).cast(DataType::String),
            col(column).cast(DataType::Float64),
        ])
        .filter(col(column).is_finite())
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .collect()?;

    let amounts: Vec<f64> = paid.column(column)?.f64()?.into_no_null_iter().collect();
    if let Some(negative) = amounts.iter().find(|a| **a < 0.0) {
        return Err(CapmError::InvalidInput(format!(
            "dividend payments must not be negative, got {negative}"
        )));
    }
    Ok(amounts)
}

/// Most recent payment in `history`, or `None` if there is none.
///
/// # Errors
/// [`CapmError::MissingColumn`] if `date` or `column` is absent;
/// [`CapmError::InvalidInput`] for a negative payment.
pub fn latest_dividend(history: &DataFrame, column: &str) -> Result<Option<f64>> {
    Ok(payments(history, column)?.last().copied())
}

/// Dividend yield: `dividend / price`.
///
/// # Errors
/// [`CapmError::DivisionByZero`] when `price` is not positive.
pub fn dividend_yield(dividend: f64, price: f64) -> Result<f64> {
    if price <= 0.0 {
        return Err(CapmError::DivisionByZero(format!(
            "dividend yield is undefined for price {price}"
        )));
    }
    checked_ratio(dividend, price, "dividend yield")
}

/// Dividend income as a fraction of the amount invested.
///
/// # Errors
/// [`CapmError::DivisionByZero`] when `invested` is not positive.
pub fn income_return(total_dividends: f64, invested: f64) -> Result<f64> {
    if invested <= 0.0 {
        return Err(CapmError::DivisionByZero(format!(
            "income return is undefined for an investment of {invested}"
        )));
    }
    checked_ratio(total_dividends, invested, "income return")
}

/// Summarize a dividend history against the current share price.
///
/// An instrument that paid nothing has a yield of zero; the yield is only
/// undefined when `current_price` is not positive.
pub fn summarize_dividends(
    history: &DataFrame,
    column: &str,
    current_price: f64,
) -> Result<DividendSummary> {
    let amounts = payments(history, column)?;
    let latest = amounts.last().copied();
    let yield_ = dividend_yield(latest.unwrap_or(0.0), current_price).ok();

    debug!(
        payments = amounts.len(),
        latest = ?latest,
        dividend_yield = ?yield_,
        "summarized dividends"
    );

    Ok(DividendSummary {
        latest_dividend: latest,
        total_dividends: amounts.iter().sum(),
        payments: amounts.len(),
        dividend_yield: yield_,
    })
}
