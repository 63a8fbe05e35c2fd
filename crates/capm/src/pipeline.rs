//! End-to-end CAPM analysis for a set of instruments.
//!
//! One run: validate parameters, fetch prices, compute returns, then fit the
//! market model and the risk profile for each asset. Each asset is analyzed in
//! isolation; a failure for one asset is recorded in its
//! [`InstrumentAnalysis`] and the others still complete.

use crate::{
    AnalysisConfig, CapmError, ErrorKind, Result, ScenarioParameters,
    analytics::{
        MarketModel, RiskProfile, annualize_mean, compute_returns,
        compute_risk_profile_with_confidence, expected_return, fit,
    },
    source::{FetchFailure, PriceSource, fetch_price_table},
    stats,
    table::{PriceTable, ReturnTable},
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{info, warn};

/// Metrics for one successfully analyzed asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstrumentMetrics {
    /// Fitted beta and alpha
    pub model: MarketModel,
    /// Volatility, VaR, Sharpe ratio and correlation
    pub risk: RiskProfile,
    /// CAPM expected annual return
    pub expected_return: f64,
}

/// Outcome of analyzing one asset.
#[derive(Debug)]
pub struct InstrumentAnalysis {
    /// Instrument identifier
    pub instrument: String,
    /// Metrics, or the reason they could not be produced
    pub outcome: Result<InstrumentMetrics>,
}

/// Display row for the market model table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelRow {
    /// Instrument identifier
    pub instrument: String,
    /// Beta rounded to the display precision
    pub beta: f64,
    /// Alpha rounded to the display precision
    pub alpha: f64,
    /// CAPM expected annual return
    pub expected_return: f64,
    /// Paired observations used in the fit
    pub observations: usize,
}

/// Display row for the risk table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskRow {
    /// Instrument identifier
    pub instrument: String,
    /// Annualized volatility
    pub volatility: f64,
    /// Scaled historical VaR
    pub value_at_risk: f64,
    /// Sharpe ratio; `None` when undefined
    pub sharpe_ratio: Option<f64>,
    /// Correlation with the benchmark; `None` when undefined
    pub correlation_with_market: Option<f64>,
}

/// Display row for an asset that could not be analyzed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRow {
    /// Instrument identifier
    pub instrument: String,
    /// Error classification
    pub kind: ErrorKind,
    /// Readable message
    pub message: String,
}

/// Serializable view of an [`AnalysisReport`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    /// Benchmark identifier
    pub benchmark: String,
    /// Scenario used for the run
    pub scenario: ScenarioParameters,
    /// Annual market return fed to the projector
    pub market_return: f64,
    /// Number of return periods
    pub periods: usize,
    /// Market model rows
    pub models: Vec<ModelRow>,
    /// Risk rows
    pub risks: Vec<RiskRow>,
    /// Assets that failed
    pub errors: Vec<ErrorRow>,
}

/// Full result of one analysis run.
#[derive(Debug)]
pub struct AnalysisReport {
    benchmark: String,
    scenario: ScenarioParameters,
    market_return: f64,
    display_precision: u32,
    returns: ReturnTable,
    instruments: Vec<InstrumentAnalysis>,
}

impl AnalysisReport {
    /// Benchmark identifier.
    pub fn benchmark(&self) -> &str {
        &self.benchmark
    }

    /// Scenario used for the run.
    pub const fn scenario(&self) -> ScenarioParameters {
        self.scenario
    }

    /// Annual market return used by the projector.
    pub const fn market_return(&self) -> f64 {
        self.market_return
    }

    /// The return table every metric was computed from.
    pub const fn returns(&self) -> &ReturnTable {
        &self.returns
    }

    /// Per-asset outcomes in selection order.
    pub fn instruments(&self) -> &[InstrumentAnalysis] {
        &self.instruments
    }

    /// Outcome for one asset.
    pub fn get(&self, instrument: &str) -> Option<&InstrumentAnalysis> {
        self.instruments.iter().find(|a| a.instrument == instrument)
    }

    /// Market model rows for successful assets.
    pub fn model_rows(&self) -> Vec<ModelRow> {
        self.successes()
            .map(|(instrument, m)| {
                let (beta, alpha) = m.model.rounded(self.display_precision);
                ModelRow {
                    instrument: instrument.to_string(),
                    beta,
                    alpha,
                    expected_return: m.expected_return,
                    observations: m.model.observations,
                }
            })
            .collect()
    }

    /// Risk rows for successful assets.
    pub fn risk_rows(&self) -> Vec<RiskRow> {
        self.successes()
            .map(|(instrument, m)| RiskRow {
                instrument: instrument.to_string(),
                volatility: m.risk.volatility,
                value_at_risk: m.risk.value_at_risk,
                sharpe_ratio: m.risk.sharpe_ratio,
                correlation_with_market: m.risk.correlation_with_market,
            })
            .collect()
    }

    /// Rows for assets that failed.
    pub fn error_rows(&self) -> Vec<ErrorRow> {
        self.instruments
            .iter()
            .filter_map(|a| match &a.outcome {
                Err(e) => Some(ErrorRow {
                    instrument: a.instrument.clone(),
                    kind: e.kind(),
                    message: e.to_string(),
                }),
                Ok(_) => None,
            })
            .collect()
    }

    /// Serializable summary for the presentation layer.
    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            benchmark: self.benchmark.clone(),
            scenario: self.scenario,
            market_return: self.market_return,
            periods: self.returns.height(),
            models: self.model_rows(),
            risks: self.risk_rows(),
            errors: self.error_rows(),
        }
    }

    fn successes(&self) -> impl Iterator<Item = (&str, &InstrumentMetrics)> {
        self.instruments
            .iter()
            .filter_map(|a| a.outcome.as_ref().ok().map(|m| (a.instrument.as_str(), m)))
    }
}

/// Runs CAPM analyses for a validated [`AnalysisConfig`].
#[derive(Debug, Clone)]
pub struct CapmAnalyzer {
    config: AnalysisConfig,
}

impl CapmAnalyzer {
    /// Validate `config` and build an analyzer.
    ///
    /// # Errors
    /// [`CapmError::InvalidInput`] for malformed parameters.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    pub const fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Fetch prices for the window ending at `end` and analyze them.
    ///
    /// Assets whose fetch failed appear in the report with their fetch error.
    pub async fn run<S>(&self, source: &S, end: NaiveDate) -> Result<AnalysisReport>
    where
        S: PriceSource + ?Sized,
    {
        let window = self.config.window(end)?;
        let fetched = fetch_price_table(
            source,
            &self.config.benchmark,
            &self.config.instruments,
            &window,
            self.config.fetch_timeout(),
        )
        .await?;

        self.analyze_with_failures(&fetched.prices, fetched.failures)
    }

    /// Analyze an already aligned price table.
    ///
    /// # Errors
    /// Fails only when the benchmark column is missing or too short; per-asset
    /// problems are recorded in the report.
    pub fn analyze(&self, prices: &PriceTable) -> Result<AnalysisReport> {
        self.analyze_with_failures(prices, Vec::new())
    }

    fn analyze_with_failures(
        &self,
        prices: &PriceTable,
        failures: Vec<FetchFailure>,
    ) -> Result<AnalysisReport> {
        let config = &self.config;
        let returns = compute_returns(prices)?;
        let market_return = self.market_return(&returns)?;

        let mut failed: HashMap<String, CapmError> = failures
            .into_iter()
            .map(|f| (f.instrument, f.error))
            .collect();

        let instruments: Vec<InstrumentAnalysis> = config
            .instruments
            .iter()
            .map(|instrument| {
                let outcome = match failed.remove(instrument) {
                    Some(error) => Err(error),
                    None => self.analyze_instrument(&returns, instrument, market_return),
                };
                if let Err(error) = &outcome {
                    warn!(instrument = instrument.as_str(), kind = %error.kind(), %error, "analysis failed");
                }
                InstrumentAnalysis {
                    instrument: instrument.clone(),
                    outcome,
                }
            })
            .collect();

        let succeeded = instruments.iter().filter(|a| a.outcome.is_ok()).count();
        info!(
            benchmark = config.benchmark.as_str(),
            periods = returns.height(),
            succeeded,
            failed = instruments.len() - succeeded,
            "analysis complete"
        );

        Ok(AnalysisReport {
            benchmark: config.benchmark.clone(),
            scenario: config.scenario(),
            market_return,
            display_precision: config.display_precision,
            returns,
            instruments,
        })
    }

    fn market_return(&self, returns: &ReturnTable) -> Result<f64> {
        let bench = stats::defined(&returns.values(&self.config.benchmark)?);
        if let Some(rate) = self.config.market_return {
            return Ok(rate);
        }
        let mean = stats::mean(&bench).ok_or(CapmError::InsufficientData {
            required: 1,
            available: 0,
        })?;
        Ok(annualize_mean(mean, self.config.periods_per_year))
    }

    fn analyze_instrument(
        &self,
        returns: &ReturnTable,
        instrument: &str,
        market_return: f64,
    ) -> Result<InstrumentMetrics> {
        let config = &self.config;
        let model = fit(returns, instrument, &config.benchmark)?;
        let risk = compute_risk_profile_with_confidence(
            returns,
            instrument,
            &config.benchmark,
            config.risk_free_rate,
            config.periods_per_year,
            config.confidence_level,
        )?;
        Ok(InstrumentMetrics {
            model,
            risk,
            expected_return: expected_return(model.beta, config.risk_free_rate, market_return),
        })
    }
}
