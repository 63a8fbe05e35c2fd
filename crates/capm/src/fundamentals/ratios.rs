//! Balance-sheet and income-statement ratios.
//!
//! - Debt-to-equity = total debt / shareholders' equity
//! - Return on equity = net income / shareholders' equity
//! - Current ratio = current assets / current liabilities
//! - Return on assets = net income / total assets
//!
//! A line item that is missing leaves every ratio using it undefined.

use super::checked_ratio;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Reported line items for one company and period. Absent items are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FinancialStatement {
    /// Trailing price/earnings multiple, passed through as reported
    pub trailing_pe: Option<f64>,
    /// Total debt
    pub total_debt: Option<f64>,
    /// Total shareholders' equity
    pub total_equity: Option<f64>,
    /// Net income
    pub net_income: Option<f64>,
    /// Total current assets
    pub current_assets: Option<f64>,
    /// Total current liabilities
    pub current_liabilities: Option<f64>,
    /// Total assets
    pub total_assets: Option<f64>,
}

impl FinancialStatement {
    /// Read a statement from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// Ratios derived from a [`FinancialStatement`]; `None` means undefined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FinancialRatios {
    /// Price/earnings
    pub price_to_earnings: Option<f64>,
    /// Debt-to-equity
    pub debt_to_equity: Option<f64>,
    /// Return on equity
    pub return_on_equity: Option<f64>,
    /// Current ratio
    pub current_ratio: Option<f64>,
    /// Return on assets
    pub return_on_assets: Option<f64>,
}

impl FinancialRatios {
    /// Compute every ratio the statement supports.
    pub fn from_statement(statement: &FinancialStatement) -> Self {
        let s = statement;
        let ratios = Self {
            price_to_earnings: s.trailing_pe.filter(|pe| pe.is_finite()),
            debt_to_equity: defined(s.total_debt, s.total_equity, "debt-to-equity"),
            return_on_equity: defined(s.net_income, s.total_equity, "return on equity"),
            current_ratio: defined(s.current_assets, s.current_liabilities, "current ratio"),
            return_on_assets: defined(s.net_income, s.total_assets, "return on assets"),
        };
        debug!(?ratios, "computed financial ratios");
        ratios
    }
}

/// Debt-to-equity ratio.
///
/// # Errors
/// [`crate::CapmError::DivisionByZero`] for zero equity.
pub fn debt_to_equity(total_debt: f64, total_equity: f64) -> Result<f64> {
    checked_ratio(total_debt, total_equity, "debt-to-equity")
}

/// Return on equity.
///
/// # Errors
/// [`crate::CapmError::DivisionByZero`] for zero equity.
pub fn return_on_equity(net_income: f64, total_equity: f64) -> Result<f64> {
    checked_ratio(net_income, total_equity, "return on equity")
}

/// Current ratio.
///
/// # Errors
/// [`crate::CapmError::DivisionByZero`] for zero current liabilities.
pub fn current_ratio(current_assets: f64, current_liabilities: f64) -> Result<f64> {
    checked_ratio(current_assets, current_liabilities, "current ratio")
}

/// Return on assets.
///
/// # Errors
/// [`crate::CapmError::DivisionByZero`] for zero total assets.
pub fn return_on_assets(net_income: f64, total_assets: f64) -> Result<f64> {
    checked_ratio(net_income, total_assets, "return on assets")
}

fn defined(numerator: Option<f64>, denominator: Option<f64>, what: &str) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) => checked_ratio(n, d, what).ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use approx::assert_relative_eq;

    fn statement() -> FinancialStatement {
        FinancialStatement {
            trailing_pe: Some(31.5),
            total_debt: Some(120.0),
            total_equity: Some(60.0),
            net_income: Some(90.0),
            current_assets: Some(150.0),
            current_liabilities: Some(100.0),
            total_assets: Some(360.0),
        }
    }

    #[test]
    fn test_ratios_from_statement() {
        let ratios = FinancialRatios::from_statement(&statement());
        assert_eq!(ratios.price_to_earnings, Some(31.5));
        assert_relative_eq!(ratios.debt_to_equity.unwrap(), 2.0);
        assert_relative_eq!(ratios.return_on_equity.unwrap(), 1.5);
        assert_relative_eq!(ratios.current_ratio.unwrap(), 1.5);
        assert_relative_eq!(ratios.return_on_assets.unwrap(), 0.25);
    }

    #[test]
    fn test_zero_equity_is_undefined_not_substituted() {
        let ratios = FinancialRatios::from_statement(&FinancialStatement {
            total_equity: Some(0.0),
            ..statement()
        });
        assert_eq!(ratios.debt_to_equity, None);
        assert_eq!(ratios.return_on_equity, None);
        assert!(ratios.current_ratio.is_some());

        assert_eq!(
            debt_to_equity(120.0, 0.0).unwrap_err().kind(),
            ErrorKind::DivisionByZero
        );
        assert_eq!(
            return_on_equity(90.0, 0.0).unwrap_err().kind(),
            ErrorKind::DivisionByZero
        );
    }

    #[test]
    fn test_missing_line_items_leave_ratios_undefined() {
        let ratios = FinancialRatios::from_statement(&FinancialStatement {
            current_liabilities: None,
            total_assets: None,
            ..statement()
        });
        assert_eq!(ratios.current_ratio, None);
        assert_eq!(ratios.return_on_assets, None);

        let empty = FinancialRatios::from_statement(&FinancialStatement::default());
        assert_eq!(empty, FinancialRatios::default());
    }

    #[test]
    fn test_negative_equity_is_still_defined() {
        assert_relative_eq!(debt_to_equity(50.0, -25.0).unwrap(), -2.0);
        assert_relative_eq!(current_ratio(10.0, 4.0).unwrap(), 2.5);
        assert_eq!(
            return_on_assets(1.0, 0.0).unwrap_err().kind(),
            ErrorKind::DivisionByZero
        );
    }

    #[test]
    fn test_statement_json_defaults() {
        let statement: FinancialStatement =
            serde_json::from_str(r#"{ "total_debt": 10.0, "total_equity": 5.0 }"#).unwrap();
        assert_eq!(statement.net_income, None);
        assert_relative_eq!(
            FinancialRatios::from_statement(&statement).debt_to_equity.unwrap(),
            2.0
        );
    }
}
