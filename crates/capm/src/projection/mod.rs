//! Forward projections: scenario future values and cash-flow forecasts.

pub mod cash_flow;
pub mod scenario;

pub use cash_flow::{CashFlowProjection, CashFlowSummary, GrowthRates, MAX_FORECAST_YEARS, forecast};
pub use scenario::{Scenario, ScenarioOutcome, future_value, project_scenarios};
