#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/capm/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod analytics;
pub mod config;
pub mod error;
pub mod fundamentals;
pub mod pipeline;
pub mod projection;
pub mod source;
pub mod stats;
pub mod table;

// Re-export core types
pub use analytics::{
    MarketModel, RiskProfile, compute_returns, compute_risk_profile,
    compute_risk_profile_with_confidence, expected_return, fit,
};
pub use config::{AnalysisConfig, HistoryWindow, ScenarioParameters, parse_rate};
pub use error::{CapmError, ErrorKind, Result};
pub use fundamentals::{DividendSummary, FinancialRatios, FinancialStatement};
pub use pipeline::{AnalysisReport, CapmAnalyzer, InstrumentAnalysis, InstrumentMetrics};
pub use projection::{CashFlowSummary, Scenario, ScenarioOutcome};
pub use source::{CachedPriceSource, CsvPriceSource, MemoryPriceSource, PriceSource};
pub use table::{DATE_COLUMN, PriceTable, ReturnTable};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
