//! Scenario analysis - future value of an investment under named returns.
//!
//! `FV = initial × (1 + r)^years`, with the horizon taken from
//! [`ScenarioParameters::horizon_years`].

use crate::{CapmError, Result, ScenarioParameters, config::parse_rate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// A named annual rate of return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Label shown in reports (e.g. `Optimistic`)
    pub name: String,
    /// Annual rate of return as a fraction
    pub annual_return: f64,
}

impl Scenario {
    /// Create a scenario.
    pub fn new(name: impl Into<String>, annual_return: f64) -> Self {
        Self {
            name: name.into(),
            annual_return,
        }
    }

    /// Parse `NAME=RATE`, where the rate is written as for [`parse_rate`]
    /// (`Optimistic=8%`, `Bear=-0.1`).
    ///
    /// # Errors
    /// [`CapmError::InvalidInput`] when the `=` or the name is missing, or the
    /// rate is not a number.
    pub fn parse(input: &str) -> Result<Self> {
        let (name, rate) = input.split_once('=').ok_or_else(|| {
            CapmError::InvalidInput(format!("scenario `{input}` must look like NAME=RATE"))
        })?;
        let name = name.trim();
        if name.is_empty() {
            return Err(CapmError::InvalidInput(format!(
                "scenario `{input}` has no name"
            )));
        }
        Ok(Self::new(name, parse_rate(rate)?))
    }
}

/// Future value of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    /// Scenario label
    pub name: String,
    /// Annual rate of return used
    pub annual_return: f64,
    /// Value at the end of the horizon
    pub future_value: f64,
    /// `future_value - initial`
    pub gain: f64,
}

/// Compound `initial` at `annual_return` for `years` years.
///
/// # Errors
/// [`CapmError::InvalidInput`] for a negative or non-finite investment, a
/// rate below -100% or a zero horizon.
pub fn future_value(initial: f64, annual_return: f64, years: u32) -> Result<f64> {
    if !(initial.is_finite() && initial >= 0.0) {
        return Err(CapmError::InvalidInput(format!(
            "initial investment must be a non-negative amount, got {initial}"
        )));
    }
    if !(annual_return.is_finite() && annual_return >= -1.0) {
        return Err(CapmError::InvalidInput(format!(
            "rate of return must be at least -100%, got {annual_return}"
        )));
    }
    if years == 0 {
        return Err(CapmError::InvalidInput(
            "horizon must be at least one year".to_string(),
        ));
    }
    let years = i32::try_from(years)
        .map_err(|_| CapmError::InvalidInput(format!("horizon of {years} years is too long")))?;

    Ok(initial * (1.0 + annual_return).powi(years))
}

/// Project `initial` under every scenario over `params.horizon_years`.
///
/// Outcomes keep the order of `scenarios`.
///
/// # Errors
/// [`CapmError::InvalidInput`] for an empty or duplicated scenario list, or
/// any input [`future_value`] rejects.
pub fn project_scenarios(
    initial: f64,
    scenarios: &[Scenario],
    params: &ScenarioParameters,
) -> Result<Vec<ScenarioOutcome>> {
    if scenarios.is_empty() {
        return Err(CapmError::InvalidInput(
            "define at least one scenario".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    if let Some(dup) = scenarios.iter().find(|s| !seen.insert(s.name.as_str())) {
        return Err(CapmError::InvalidInput(format!(
            "scenario {} defined twice",
            dup.name
        )));
    }

    let outcomes = scenarios
        .iter()
        .map(|scenario| {
            let value = future_value(initial, scenario.annual_return, params.horizon_years)?;
            Ok(ScenarioOutcome {
                name: scenario.name.clone(),
                annual_return: scenario.annual_return,
                future_value: value,
                gain: value - initial,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(
        initial,
        years = params.horizon_years,
        scenarios = outcomes.len(),
        "projected scenarios"
    );
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn horizon(years: u32) -> ScenarioParameters {
        ScenarioParameters {
            horizon_years: years,
            ..Default::default()
        }
    }

    #[rstest]
    #[case(10_000.0, 0.05, 5, 12_762.815_625)]
    #[case(10_000.0, 0.0, 3, 10_000.0)]
    #[case(500.0, -1.0, 2, 0.0)]
    #[case(0.0, 0.2, 4, 0.0)]
    fn test_future_value(
        #[case] initial: f64,
        #[case] rate: f64,
        #[case] years: u32,
        #[case] expected: f64,
    ) {
        assert_relative_eq!(future_value(initial, rate, years).unwrap(), expected, epsilon = 1e-6);
    }

    #[rstest]
    #[case(-1.0, 0.05, 5)]
    #[case(f64::NAN, 0.05, 5)]
    #[case(100.0, -1.5, 5)]
    #[case(100.0, f64::INFINITY, 5)]
    #[case(100.0, 0.05, 0)]
    fn test_future_value_rejects(#[case] initial: f64, #[case] rate: f64, #[case] years: u32) {
        let err = future_value(initial, rate, years).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_project_scenarios_uses_horizon() {
        let scenarios = [
            Scenario::new("Optimistic", 0.10),
            Scenario::new("Realistic", 0.05),
            Scenario::new("Pessimistic", -0.05),
        ];
        let outcomes = project_scenarios(1_000.0, &scenarios, &horizon(2)).unwrap();

        let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["Optimistic", "Realistic", "Pessimistic"]);
        assert_relative_eq!(outcomes[0].future_value, 1_210.0, epsilon = 1e-9);
        assert_relative_eq!(outcomes[1].future_value, 1_102.5, epsilon = 1e-9);
        assert_relative_eq!(outcomes[2].gain, -97.5, epsilon = 1e-9);
    }

    #[test]
    fn test_project_scenarios_rejects_bad_lists() {
        let err = project_scenarios(1_000.0, &[], &horizon(1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let twice = [Scenario::new("Base", 0.05), Scenario::new("Base", 0.07)];
        let err = project_scenarios(1_000.0, &twice, &horizon(1)).unwrap_err();
        assert!(err.to_string().contains("Base defined twice"));
    }

    #[rstest]
    #[case("Optimistic=8%", "Optimistic", 0.08)]
    #[case(" Bear = -0.1 ", "Bear", -0.1)]
    fn test_parse_scenario(#[case] input: &str, #[case] name: &str, #[case] rate: f64) {
        let scenario = Scenario::parse(input).unwrap();
        assert_eq!(scenario.name, name);
        assert_relative_eq!(scenario.annual_return, rate, epsilon = 1e-15);
    }

    #[rstest]
    #[case("Optimistic")]
    #[case("=5%")]
    #[case("Base=five")]
    fn test_parse_scenario_rejects(#[case] input: &str) {
        assert_eq!(Scenario::parse(input).unwrap_err().kind(), ErrorKind::InvalidInput);
    }
}
