//! In-memory price source.

use super::{PriceSource, select_window};
use crate::{CapmError, HistoryWindow, Result, table::DATE_COLUMN};
use async_trait::async_trait;
use chrono::NaiveDate;
use polars::prelude::*;
use std::{collections::HashMap, time::Duration};

/// Price series held in memory, keyed by instrument.
///
/// Useful for tests, benchmarks and callers that already hold their data.
/// An optional per-instrument latency simulates a slow feed.
#[derive(Debug, Clone, Default)]
pub struct MemoryPriceSource {
    series: HashMap<String, Vec<(NaiveDate, Option<f64>)>>,
    latency: HashMap<String, Duration>,
}

impl MemoryPriceSource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an instrument's closing prices.
    ///
    /// Values may be `f64` or `Option<f64>`; `None` is a missing price.
    pub fn with_series<I, V>(mut self, instrument: impl Into<String>, points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, V)>,
        V: Into<Option<f64>>,
    {
        self.series.insert(
            instrument.into(),
            points.into_iter().map(|(d, v)| (d, v.into())).collect(),
        );
        self
    }

    /// Delay every fetch of `instrument` by `delay`.
    pub fn with_latency(mut self, instrument: impl Into<String>, delay: Duration) -> Self {
        self.latency.insert(instrument.into(), delay);
        self
    }
}

#[async_trait]
impl PriceSource for MemoryPriceSource {
    fn name(&self) -> &str {
        "memory"
    }

    async fn fetch(&self, instrument: &str, window: &HistoryWindow) -> Result<DataFrame> {
        if let Some(delay) = self.latency.get(instrument) {
            tokio::time::sleep(*delay).await;
        }

        let points = self
            .series
            .get(instrument)
            .ok_or_else(|| CapmError::unavailable(instrument, "unknown instrument"))?;

        let dates: Vec<String> = points.iter().map(|(d, _)| d.to_string()).collect();
        let closes: Vec<Option<f64>> = points.iter().map(|(_, v)| *v).collect();
        let frame = DataFrame::new(vec![
            Column::new(DATE_COLUMN.into(), dates),
            Column::new(instrument.into(), closes),
        ])?;

        select_window(frame, instrument, instrument, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_source_returns_window() {
        let d = |month, day| NaiveDate::from_ymd_opt(2024, month, day).unwrap();
        let source = MemoryPriceSource::new().with_series(
            "AAPL",
            [(d(1, 2), Some(1.0)), (d(1, 3), None), (d(1, 4), Some(3.0))],
        );
        let window = HistoryWindow::new(d(6, 30), 1).unwrap();

        let frame = source.fetch("AAPL", &window).await.unwrap();
        assert_eq!(frame.height(), 3);
        let closes: Vec<Option<f64>> = frame.column("AAPL").unwrap().f64().unwrap().into_iter().collect();
        assert_eq!(closes, [Some(1.0), None, Some(3.0)]);
    }

    #[tokio::test]
    async fn test_unknown_instrument() {
        let window = HistoryWindow::new(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap(), 1).unwrap();
        let err = MemoryPriceSource::new().fetch("AAPL", &window).await.unwrap_err();
        assert!(matches!(err, CapmError::DataUnavailable { .. }));
    }
}
