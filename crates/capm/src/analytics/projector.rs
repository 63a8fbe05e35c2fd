//! Expected return projector - the CAPM identity.
//!
//! `E[R] = R_f + β · (R_m - R_f)`

/// CAPM expected return for a given beta, risk-free rate and market return.
///
/// `market_return` must already be expressed over the same horizon as
/// `risk_free_rate`; see [`annualize_mean`].
pub fn expected_return(beta: f64, risk_free_rate: f64, market_return: f64) -> f64 {
    risk_free_rate + beta * (market_return - risk_free_rate)
}

/// Annualize a per-period mean return by simple scaling.
pub fn annualize_mean(mean_return: f64, periods_per_year: u32) -> f64 {
    mean_return * f64::from(periods_per_year)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_expected_return_reference_value() {
        assert_relative_eq!(expected_return(1.2, 0.01, 0.08), 0.094, epsilon = 1e-12);
    }

    #[rstest]
    #[case(0.0, 0.03, 0.10, 0.03)]
    #[case(1.0, 0.03, 0.10, 0.10)]
    #[case(-0.5, 0.02, 0.12, -0.03)]
    fn test_expected_return_cases(
        #[case] beta: f64,
        #[case] rf: f64,
        #[case] market: f64,
        #[case] expected: f64,
    ) {
        assert_relative_eq!(expected_return(beta, rf, market), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_expected_return_is_idempotent() {
        let a = expected_return(0.83, 0.011, 0.067);
        let b = expected_return(0.83, 0.011, 0.067);
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn test_annualize_mean() {
        assert_relative_eq!(annualize_mean(0.0004, 252), 0.1008, epsilon = 1e-12);
    }
}
