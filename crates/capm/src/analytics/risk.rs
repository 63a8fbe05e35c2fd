//! Risk metrics - volatility, historical VaR, Sharpe ratio and correlation.
//!
//! All per-period statistics are annualized with `periods_per_year`:
//! - `σ_annual = std(r) × sqrt(P)` (sample standard deviation)
//! - `VaR = quantile(r, 1 - confidence) × sqrt(P)` (linear interpolation)
//! - `Sharpe = (mean(r) × P - R_f) / σ_annual`
//! - `ρ = Pearson(r, r_m)` over rows where both returns are defined
//!
//! The VaR figure scales a single-period quantile by `sqrt(P)`. That mixes a
//! one-period loss bound with an annualized one; it is kept so results line up
//! with the dashboards that report it.

use crate::{CapmError, Result, stats, table::ReturnTable};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default annualization constant (trading days).
pub const DEFAULT_PERIODS_PER_YEAR: u32 = 252;

/// Default VaR confidence level.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Per-asset risk summary.
///
/// `None` marks a metric that is undefined for the data (zero volatility for
/// the Sharpe ratio, a constant series for the correlation).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskProfile {
    /// Annualized standard deviation of returns
    pub volatility: f64,
    /// Historical VaR quantile scaled by `sqrt(periods_per_year)`
    pub value_at_risk: f64,
    /// Annualized excess return per unit of volatility
    pub sharpe_ratio: Option<f64>,
    /// Pearson correlation with the benchmark, in `[-1, 1]`
    pub correlation_with_market: Option<f64>,
}

/// Compute the risk profile of `asset` at the default 95% VaR confidence.
pub fn compute_risk_profile(
    returns: &ReturnTable,
    asset: &str,
    benchmark: &str,
    risk_free_rate: f64,
    periods_per_year: u32,
) -> Result<RiskProfile> {
    compute_risk_profile_with_confidence(
        returns,
        asset,
        benchmark,
        risk_free_rate,
        periods_per_year,
        DEFAULT_CONFIDENCE_LEVEL,
    )
}

/// Compute the risk profile of `asset` with an explicit VaR confidence level.
///
/// # Errors
/// - [`CapmError::InvalidInput`] for a zero `periods_per_year` or a
///   confidence level outside `(0, 1)`.
/// - [`CapmError::MissingColumn`] if either column is absent.
/// - [`CapmError::InsufficientData`] with fewer than two defined asset returns.
pub fn compute_risk_profile_with_confidence(
    returns: &ReturnTable,
    asset: &str,
    benchmark: &str,
    risk_free_rate: f64,
    periods_per_year: u32,
    confidence_level: f64,
) -> Result<RiskProfile> {
    if periods_per_year == 0 {
        return Err(CapmError::InvalidInput(
            "periods_per_year must be positive".to_string(),
        ));
    }
    if !(confidence_level > 0.0 && confidence_level < 1.0) {
        return Err(CapmError::InvalidInput(format!(
            "confidence level must be in (0, 1), got {confidence_level}"
        )));
    }

    let asset_values = returns.values(asset)?;
    let bench_values = returns.values(benchmark)?;

    let available = stats::defined(&asset_values).len();
    if available < 2 {
        return Err(CapmError::InsufficientData {
            required: 2,
            available,
        });
    }

    // Same sample as `stats::defined`: nulls and non-finite values drop out.
    let finite = col(asset).filter(col(asset).is_finite());
    let summary = returns
        .frame()
        .clone()
        .lazy()
        .select([
            finite.clone().mean().alias("mean"),
            finite.clone().std(1).alias("std"),
            finite
                .quantile(lit(1.0 - confidence_level), QuantileMethod::Linear)
                .alias("tail"),
        ])
        .collect()?;

    let scalar = |name: &str| -> Result<f64> {
        summary
            .column(name)?
            .f64()?
            .get(0)
            .ok_or(CapmError::InsufficientData {
                required: 2,
                available,
            })
    };

    let annualization = f64::from(periods_per_year).sqrt();
    let mean = scalar("mean")?;
    let volatility = scalar("std")? * annualization;
    let value_at_risk = scalar("tail")? * annualization;

    let sharpe = sharpe_ratio(mean, volatility, risk_free_rate, periods_per_year).ok();

    let (asset_paired, bench_paired) = stats::paired(&asset_values, &bench_values);
    let correlation_with_market = stats::pearson(&asset_paired, &bench_paired);

    debug!(
        asset,
        volatility,
        value_at_risk,
        sharpe_ratio = ?sharpe,
        correlation = ?correlation_with_market,
        "computed risk profile"
    );

    Ok(RiskProfile {
        volatility,
        value_at_risk,
        sharpe_ratio: sharpe,
        correlation_with_market,
    })
}

/// Annualized Sharpe ratio from a per-period mean and an annualized volatility.
///
/// # Errors
/// [`CapmError::DivisionByZero`] when the volatility is zero.
pub fn sharpe_ratio(
    mean_return: f64,
    volatility: f64,
    risk_free_rate: f64,
    periods_per_year: u32,
) -> Result<f64> {
    let per_period = volatility / f64::from(periods_per_year).sqrt();
    if stats::is_degenerate(per_period * per_period) {
        return Err(CapmError::DivisionByZero(
            "Sharpe ratio with zero volatility".to_string(),
        ));
    }
    Ok((mean_return * f64::from(periods_per_year) - risk_free_rate) / volatility)
}
