//! Analytics core - pure transformations over return tables.
//!
//! Returns feed the market model and the risk metrics; the projector turns a
//! fitted beta into a CAPM expected return.

pub mod market_model;
pub mod projector;
pub mod returns;
pub mod risk;

pub use market_model::{MAX_DISPLAY_PRECISION, MarketModel, fit, round_to};
pub use projector::{annualize_mean, expected_return};
pub use returns::compute_returns;
pub use risk::{
    DEFAULT_CONFIDENCE_LEVEL, DEFAULT_PERIODS_PER_YEAR, RiskProfile, compute_risk_profile,
    compute_risk_profile_with_confidence, sharpe_ratio,
};
