//! Market model estimator - OLS beta and alpha against a benchmark.
//!
//! Fits `R_i = α + β · R_m + ε` by closed-form single-predictor OLS:
//! `β = Cov(R_i, R_m) / Var(R_m)` and `α = mean(R_i) - β · mean(R_m)`,
//! using sample (n - 1) estimators throughout.

use crate::{CapmError, Result, stats, table::ReturnTable};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fitted market model for one (asset, benchmark) pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarketModel {
    /// Regression slope; sensitivity to benchmark returns
    pub beta: f64,
    /// Regression intercept, in per-period return units
    pub alpha: f64,
    /// Paired observations used in the fit
    pub observations: usize,
}

impl MarketModel {
    /// Beta and alpha rounded to `decimals` places for display.
    pub fn rounded(&self, decimals: u32) -> (f64, f64) {
        (round_to(self.beta, decimals), round_to(self.alpha, decimals))
    }
}

/// Fit the market model of `asset` against `benchmark`.
///
/// Rows where either return is undefined are excluded pairwise.
///
/// # Errors
/// - [`CapmError::MissingColumn`] if either column is absent.
/// - [`CapmError::InsufficientData`] with fewer than two paired observations.
/// - [`CapmError::ZeroVariance`] if the benchmark returns are constant.
pub fn fit(returns: &ReturnTable, asset: &str, benchmark: &str) -> Result<MarketModel> {
    let (asset_returns, bench_returns) =
        stats::paired(&returns.values(asset)?, &returns.values(benchmark)?);

    let observations = asset_returns.len();
    if observations < 2 {
        return Err(CapmError::InsufficientData {
            required: 2,
            available: observations,
        });
    }

    let bench_variance = stats::sample_variance(&bench_returns).unwrap_or(0.0);
    if stats::is_degenerate(bench_variance) {
        return Err(CapmError::ZeroVariance(benchmark.to_string()));
    }

    let covariance = stats::sample_covariance(&asset_returns, &bench_returns).unwrap_or(0.0);
    let beta = covariance / bench_variance;
    let alpha = stats::mean(&asset_returns).unwrap_or(0.0)
        - beta * stats::mean(&bench_returns).unwrap_or(0.0);

    debug!(asset, benchmark, beta, alpha, observations, "fitted market model");

    Ok(MarketModel {
        beta,
        alpha,
        observations,
    })
}

/// Most decimal places an `f64` can meaningfully be rounded to.
pub const MAX_DISPLAY_PRECISION: u32 = 15;

/// Round half away from zero to `decimals` places.
///
/// Requests beyond [`MAX_DISPLAY_PRECISION`] return `value` unchanged.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let digits = match i32::try_from(decimals) {
        Ok(d) if decimals <= MAX_DISPLAY_PRECISION => d,
        _ => return value,
    };
    let scale = 10f64.powi(digits);
    let scaled = value * scale;
    if scaled.is_finite() { scaled.round() / scale } else { value }
}
