//! Company fundamentals: dividend income and balance-sheet ratios.
//!
//! Every ratio here has a denominator that can legitimately be zero or absent.
//! Such a ratio is undefined: scalar functions return
//! [`CapmError::DivisionByZero`] and the bundled views hold `None`. No default
//! denominator is ever substituted.

pub mod dividend;
pub mod ratios;

pub use dividend::{
    DividendSummary, dividend_yield, income_return, latest_dividend, read_dividend_history,
    summarize_dividends,
};
pub use ratios::{
    FinancialRatios, FinancialStatement, current_ratio, debt_to_equity, return_on_assets,
    return_on_equity,
};

use crate::{CapmError, Result};

/// `numerator / denominator`, or an error naming `what` when undefined.
pub(crate) fn checked_ratio(numerator: f64, denominator: f64, what: &str) -> Result<f64> {
    if !(numerator.is_finite() && denominator.is_finite()) {
        return Err(CapmError::InvalidInput(format!(
            "{what}: inputs must be finite numbers"
        )));
    }
    if denominator == 0.0 {
        return Err(CapmError::DivisionByZero(format!(
            "{what} is undefined for a zero denominator"
        )));
    }
    Ok(numerator / denominator)
}
