//! Analysis configuration and user-supplied parameters.
//!
//! Everything here is plain immutable data threaded through the pipeline.
//! Validation happens up front so malformed input is rejected before any
//! fetch or computation starts.

use crate::{
    CapmError, Result,
    analytics::{DEFAULT_CONFIDENCE_LEVEL, DEFAULT_PERIODS_PER_YEAR, MAX_DISPLAY_PRECISION},
};
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, path::Path, time::Duration};

/// Shortest supported history window, in years.
pub const MIN_HISTORY_YEARS: u32 = 1;

/// Longest supported history window, in years.
pub const MAX_HISTORY_YEARS: u32 = 10;

/// Scenario inputs shared by the risk metrics and the projector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParameters {
    /// Annual risk-free rate as a fraction (0.01 = 1%)
    pub risk_free_rate: f64,
    /// Analysis horizon in years
    pub horizon_years: u32,
    /// VaR confidence level in `(0, 1)`
    pub confidence_level: f64,
}

impl Default for ScenarioParameters {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.01,
            horizon_years: MIN_HISTORY_YEARS,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
        }
    }
}

/// Inclusive date range ending at `end` and spanning `years` calendar years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HistoryWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl HistoryWindow {
    /// Create a window of `years` years ending at `end`.
    ///
    /// # Errors
    /// [`CapmError::InvalidInput`] if `years` is outside 1–10.
    pub fn new(end: NaiveDate, years: u32) -> Result<Self> {
        if !(MIN_HISTORY_YEARS..=MAX_HISTORY_YEARS).contains(&years) {
            return Err(CapmError::InvalidInput(format!(
                "history window must be {MIN_HISTORY_YEARS}-{MAX_HISTORY_YEARS} years, got {years}"
            )));
        }
        let start = end
            .checked_sub_months(Months::new(years * 12))
            .ok_or_else(|| CapmError::InvalidInput(format!("window start before {end} overflows")))?;
        Ok(Self { start, end })
    }

    /// First date in the window.
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Last date in the window.
    pub const fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Parameters of one analysis run.
///
/// Loaded from JSON (missing fields take their defaults) and/or overridden
/// from the command line, then checked with [`AnalysisConfig::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Assets to analyze, in display order
    pub instruments: Vec<String>,
    /// Benchmark index the assets are regressed against
    pub benchmark: String,
    /// History window length in years (1–10)
    pub history_years: u32,
    /// Annual risk-free rate as a fraction
    pub risk_free_rate: f64,
    /// Periods used to annualize per-period statistics
    pub periods_per_year: u32,
    /// VaR confidence level
    pub confidence_level: f64,
    /// Decimal places for displayed beta and alpha
    pub display_precision: u32,
    /// Annual market return; defaults to the benchmark's annualized mean
    pub market_return: Option<f64>,
    /// Per-instrument fetch timeout in seconds
    pub fetch_timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            instruments: Vec::new(),
            benchmark: "SPY".to_string(),
            history_years: 5,
            risk_free_rate: 0.01,
            periods_per_year: DEFAULT_PERIODS_PER_YEAR,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            display_precision: 2,
            market_return: None,
            fetch_timeout_secs: 30,
        }
    }
}

impl AnalysisConfig {
    /// Read a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Parse a JSON configuration document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reject malformed parameters.
    ///
    /// # Errors
    /// [`CapmError::InvalidInput`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            return invalid("select at least one instrument");
        }
        let mut seen = HashSet::new();
        for symbol in &self.instruments {
            if symbol.trim().is_empty() {
                return invalid("instrument identifiers must not be blank");
            }
            if !seen.insert(symbol.as_str()) {
                return invalid(format!("instrument {symbol} selected twice"));
            }
        }
        if self.benchmark.trim().is_empty() {
            return invalid("benchmark must not be blank");
        }
        if seen.contains(self.benchmark.as_str()) {
            return invalid(format!(
                "benchmark {} cannot also be an analyzed instrument",
                self.benchmark
            ));
        }
        if !(MIN_HISTORY_YEARS..=MAX_HISTORY_YEARS).contains(&self.history_years) {
            return invalid(format!(
                "history_years must be {MIN_HISTORY_YEARS}-{MAX_HISTORY_YEARS}, got {}",
                self.history_years
            ));
        }
        if !self.risk_free_rate.is_finite() {
            return invalid("risk_free_rate must be a finite number");
        }
        if self.periods_per_year == 0 {
            return invalid("periods_per_year must be positive");
        }
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return invalid(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            ));
        }
        if self.display_precision > MAX_DISPLAY_PRECISION {
            return invalid(format!(
                "display_precision must be at most {MAX_DISPLAY_PRECISION}, got {}",
                self.display_precision
            ));
        }
        if self.market_return.is_some_and(|r| !r.is_finite()) {
            return invalid("market_return must be a finite number");
        }
        if self.fetch_timeout_secs == 0 {
            return invalid("fetch_timeout_secs must be positive");
        }
        Ok(())
    }

    /// Scenario parameters derived from this configuration.
    pub const fn scenario(&self) -> ScenarioParameters {
        ScenarioParameters {
            risk_free_rate: self.risk_free_rate,
            horizon_years: self.history_years,
            confidence_level: self.confidence_level,
        }
    }

    /// History window ending at `end`.
    pub fn window(&self, end: NaiveDate) -> Result<HistoryWindow> {
        HistoryWindow::new(end, self.history_years)
    }

    /// Per-instrument fetch timeout.
    pub const fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

/// Parse a manually entered rate: `"1%"`, `"1.5 %"` or `"0.015"`.
///
/// # Errors
/// [`CapmError::InvalidInput`] for non-numeric or non-finite input.
pub fn parse_rate(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    let (number, scale) = match trimmed.strip_suffix('%') {
        Some(pct) => (pct.trim_end(), 100.0),
        None => (trimmed, 1.0),
    };
    let value: f64 = number
        .parse()
        .map_err(|_| CapmError::InvalidInput(format!("`{input}` is not a number")))?;
    if !value.is_finite() {
        return invalid(format!("`{input}` is not a finite rate"));
    }
    Ok(value / scale)
}

fn invalid<T>(message: impl Into<String>) -> Result<T> {
    Err(CapmError::InvalidInput(message.into()))
}
