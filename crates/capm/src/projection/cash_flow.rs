//! Cash-flow totals and a compound-growth forecast.
//!
//! Year `k` of the forecast grows the current totals independently:
//! `inflows_k = inflows × (1 + g_in)^k` and `outflows_k = outflows × (1 + g_out)^k`.

use crate::{CapmError, Result};
use serde::Serialize;
use tracing::debug;

/// Longest supported forecast, in years.
pub const MAX_FORECAST_YEARS: u32 = 10;

/// Totals over one period's cash movements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CashFlowSummary {
    /// Sum of all inflows
    pub total_inflows: f64,
    /// Sum of all outflows
    pub total_outflows: f64,
    /// `total_inflows - total_outflows`
    pub net_cash_flow: f64,
}

impl CashFlowSummary {
    /// Sum `inflows` and `outflows`.
    ///
    /// # Errors
    /// [`CapmError::InvalidInput`] if any amount is negative or not finite.
    pub fn from_flows(inflows: &[f64], outflows: &[f64]) -> Result<Self> {
        let total_inflows = total(inflows, "inflow")?;
        let total_outflows = total(outflows, "outflow")?;
        Ok(Self {
            total_inflows,
            total_outflows,
            net_cash_flow: total_inflows - total_outflows,
        })
    }

    /// Whether inflows exceed outflows.
    pub const fn is_cash_positive(&self) -> bool {
        self.net_cash_flow > 0.0
    }
}

/// One forecast year.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CashFlowProjection {
    /// Years ahead, starting at 1
    pub year: u32,
    /// Projected inflows
    pub inflows: f64,
    /// Projected outflows
    pub outflows: f64,
    /// Projected net cash flow
    pub net_cash_flow: f64,
}

/// Growth assumptions for [`forecast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GrowthRates {
    /// Annual growth of inflows as a fraction
    pub inflows: f64,
    /// Annual growth of outflows as a fraction
    pub outflows: f64,
}

/// Project `summary` forward `years` years.
///
/// # Errors
/// [`CapmError::InvalidInput`] if `years` is outside 1–10 or a growth rate is
/// below -100% or not finite.
pub fn forecast(
    summary: &CashFlowSummary,
    growth: GrowthRates,
    years: u32,
) -> Result<Vec<CashFlowProjection>> {
    if !(1..=MAX_FORECAST_YEARS).contains(&years) {
        return Err(CapmError::InvalidInput(format!(
            "forecast must cover 1-{MAX_FORECAST_YEARS} years, got {years}"
        )));
    }
    for (label, rate) in [("inflow", growth.inflows), ("outflow", growth.outflows)] {
        if !(rate.is_finite() && rate >= -1.0) {
            return Err(CapmError::InvalidInput(format!(
                "{label} growth must be at least -100%, got {rate}"
            )));
        }
    }

    let rows: Vec<CashFlowProjection> = (1..=years)
        .zip(1_i32..)
        .map(|(year, k)| {
            let inflows = summary.total_inflows * (1.0 + growth.inflows).powi(k);
            let outflows = summary.total_outflows * (1.0 + growth.outflows).powi(k);
            CashFlowProjection {
                year,
                inflows,
                outflows,
                net_cash_flow: inflows - outflows,
            }
        })
        .collect();

    debug!(years, ?growth, "forecast cash flows");
    Ok(rows)
}

fn total(amounts: &[f64], label: &str) -> Result<f64> {
    if let Some(bad) = amounts.iter().find(|a| !(a.is_finite() && **a >= 0.0)) {
        return Err(CapmError::InvalidInput(format!(
            "{label} amounts must be non-negative numbers, got {bad}"
        )));
    }
    Ok(amounts.iter().sum())
}
