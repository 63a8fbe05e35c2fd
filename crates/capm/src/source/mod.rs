//! Price acquisition.
//!
//! A [`PriceSource`] returns one instrument's closing prices over a
//! [`HistoryWindow`]. [`fetch_price_table`] fetches the benchmark and every
//! asset concurrently, each under its own timeout, and inner-joins whatever
//! succeeded into a [`PriceTable`]. Assets that fail are reported alongside
//! the table instead of aborting the run.

mod cached;
mod csv_file;
mod memory;

pub use cached::CachedPriceSource;
pub use csv_file::CsvPriceSource;
pub(crate) use csv_file::read_csv;
pub use memory::MemoryPriceSource;

use crate::{CapmError, HistoryWindow, Result, table::DATE_COLUMN, table::PriceTable};
use async_trait::async_trait;
use futures::future::join_all;
use polars::prelude::*;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A provider of historical closing prices.
#[async_trait]
pub trait PriceSource: Send + Sync + std::fmt::Debug {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Fetch closing prices for `instrument` within `window`.
    ///
    /// Returns a DataFrame with columns `date` (ISO string) and one `Float64`
    /// column named after the instrument. An empty result is an error.
    async fn fetch(&self, instrument: &str, window: &HistoryWindow) -> Result<DataFrame>;
}

/// An instrument whose fetch failed.
#[derive(Debug)]
pub struct FetchFailure {
    /// Instrument identifier
    pub instrument: String,
    /// Why the fetch failed
    pub error: CapmError,
}

/// Joined prices plus per-instrument failures.
#[derive(Debug)]
pub struct FetchOutcome {
    /// Date-aligned prices for the benchmark and every asset that loaded
    pub prices: PriceTable,
    /// Assets excluded from the join
    pub failures: Vec<FetchFailure>,
}

/// Fetch the benchmark and `instruments` concurrently and join them by date.
///
/// # Errors
/// [`CapmError::DataUnavailable`] if the benchmark cannot be fetched, no
/// asset can be fetched, or the fetched series share no dates.
pub async fn fetch_price_table<S>(
    source: &S,
    benchmark: &str,
    instruments: &[String],
    window: &HistoryWindow,
    timeout: Duration,
) -> Result<FetchOutcome>
where
    S: PriceSource + ?Sized,
{
    let symbols: Vec<&str> = std::iter::once(benchmark)
        .chain(instruments.iter().map(String::as_str))
        .collect();

    debug!(
        source = source.name(),
        instruments = symbols.len(),
        start = %window.start(),
        end = %window.end(),
        "fetching prices"
    );

    let results = join_all(
        symbols
            .iter()
            .map(|symbol| fetch_with_timeout(source, symbol, window, timeout)),
    )
    .await;

    let mut results = symbols.into_iter().zip(results);
    let bench_frame = match results.next() {
        Some((_, Ok(frame))) => frame,
        Some((_, Err(error))) => return Err(error),
        None => return Err(CapmError::unavailable(benchmark, "benchmark not requested")),
    };

    let mut frames = vec![bench_frame];
    let mut failures = Vec::new();
    for (symbol, result) in results {
        match result {
            Ok(frame) => frames.push(frame),
            Err(error) => {
                warn!(instrument = symbol, %error, "excluding instrument from analysis");
                failures.push(FetchFailure {
                    instrument: symbol.to_string(),
                    error,
                });
            }
        }
    }

    if frames.len() == 1 {
        return Err(CapmError::unavailable("*", "no instrument prices could be fetched"));
    }

    let prices = PriceTable::inner_join(frames)?;
    info!(
        rows = prices.height(),
        loaded = prices.instruments().len(),
        failed = failures.len(),
        "price table ready"
    );

    Ok(FetchOutcome { prices, failures })
}

async fn fetch_with_timeout<S>(
    source: &S,
    instrument: &str,
    window: &HistoryWindow,
    timeout: Duration,
) -> Result<DataFrame>
where
    S: PriceSource + ?Sized,
{
    match tokio::time::timeout(timeout, source.fetch(instrument, window)).await {
        Ok(result) => result.and_then(|frame| ensure_distinct_dates(frame, instrument)),
        Err(_) => Err(CapmError::unavailable(
            instrument,
            format!("timed out after {:.1}s", timeout.as_secs_f64()),
        )),
    }
}

/// Reject a series that lists the same date twice.
///
/// Checked per instrument so one malformed series is excluded from the join
/// instead of failing the joined table.
fn ensure_distinct_dates(frame: DataFrame, instrument: &str) -> Result<DataFrame> {
    let column = frame.column(DATE_COLUMN).map_err(|_| {
        CapmError::unavailable(instrument, format!("missing column `{DATE_COLUMN}`"))
    })?;
    let distinct = column.as_materialized_series().n_unique()?;
    if distinct != frame.height() {
        return Err(CapmError::unavailable(
            instrument,
            format!(
                "duplicate dates: {} rows but {distinct} distinct dates",
                frame.height()
            ),
        ));
    }
    Ok(frame)
}

/// Project a raw frame onto `date` + `instrument`, clipped to `window`.
pub(crate) fn select_window(
    frame: DataFrame,
    price_column: &str,
    instrument: &str,
    window: &HistoryWindow,
) -> Result<DataFrame> {
    for required in [DATE_COLUMN, price_column] {
        if frame.column(required).is_err() {
            return Err(CapmError::unavailable(
                instrument,
                format!("missing column `{required}`"),
            ));
        }
    }

    let clipped = frame
        .lazy()
        .select([
            col(DATE_COLUMN).cast(DataType::String),
            col(price_column).cast(DataType::Float64).alias(instrument),
        ])
        .filter(
            col(DATE_COLUMN)
                .gt_eq(lit(window.start().to_string()))
                .and(col(DATE_COLUMN).lt_eq(lit(window.end().to_string()))),
        )
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .collect()?;

    if clipped.height() == 0 {
        return Err(CapmError::unavailable(instrument, "no rows in window"));
    }

    ensure_distinct_dates(clipped, instrument)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn window() -> HistoryWindow {
        HistoryWindow::new(day(31), 1).unwrap()
    }

    fn source() -> MemoryPriceSource {
        MemoryPriceSource::new()
            .with_series("SPY", [(day(1), 500.0), (day(4), 505.0), (day(5), 503.0)])
            .with_series("AAPL", [(day(1), 170.0), (day(4), 172.0), (day(5), 171.0)])
            .with_series("MSFT", [(day(4), 410.0), (day(5), 415.0), (day(6), 414.0)])
    }

    fn symbols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_fetch_joins_on_common_dates() {
        let outcome = fetch_price_table(
            &source(),
            "SPY",
            &symbols(&["AAPL", "MSFT"]),
            &window(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert!(outcome.failures.is_empty());
        assert_eq!(outcome.prices.instruments(), ["SPY", "AAPL", "MSFT"]);
        assert_eq!(outcome.prices.dates().unwrap(), ["2024-03-04", "2024-03-05"]);
    }

    #[tokio::test]
    async fn test_failed_instrument_is_reported_not_fatal() {
        let outcome = fetch_price_table(
            &source(),
            "SPY",
            &symbols(&["AAPL", "NOPE"]),
            &window(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].instrument, "NOPE");
        assert_eq!(outcome.failures[0].error.kind(), ErrorKind::DataUnavailable);
        assert_eq!(outcome.prices.instruments(), ["SPY", "AAPL"]);
    }

    #[tokio::test]
    async fn test_missing_benchmark_is_fatal() {
        let err = fetch_price_table(
            &source(),
            "QQQ",
            &symbols(&["AAPL"]),
            &window(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CapmError::DataUnavailable { ref instrument, .. } if instrument == "QQQ"));
    }

    #[tokio::test]
    async fn test_all_assets_failing_is_unavailable() {
        let err = fetch_price_table(
            &source(),
            "SPY",
            &symbols(&["NOPE"]),
            &window(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
    }

    #[tokio::test]
    async fn test_slow_instrument_times_out() {
        let slow = source().with_latency("MSFT", Duration::from_millis(500));
        let outcome = fetch_price_table(
            &slow,
            "SPY",
            &symbols(&["AAPL", "MSFT"]),
            &window(),
            Duration::from_millis(50),
        )
        .await
        .unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].instrument, "MSFT");
        assert!(outcome.failures[0].error.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_duplicate_dates_exclude_only_that_instrument() {
        let source = source().with_series(
            "DUP",
            [(day(1), 20.0), (day(1), 20.5), (day(4), 21.0), (day(5), 22.0)],
        );
        let outcome = fetch_price_table(
            &source,
            "SPY",
            &symbols(&["AAPL", "DUP"]),
            &window(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].instrument, "DUP");
        assert_eq!(outcome.failures[0].error.kind(), ErrorKind::DataUnavailable);
        assert!(outcome.failures[0].error.to_string().contains("duplicate dates"));
        assert_eq!(outcome.prices.instruments(), ["SPY", "AAPL"]);
        assert_eq!(outcome.prices.height(), 3);
    }

    #[test]
    fn test_select_window_rejects_duplicate_dates() {
        let frame = polars::df![
            "date" => ["2024-03-01", "2024-03-01", "2024-03-04"],
            "close" => [1.0, 1.1, 1.2],
        ]
        .unwrap();
        let err = select_window(frame, "close", "AAPL", &window()).unwrap_err();
        assert!(matches!(err, CapmError::DataUnavailable { ref instrument, .. } if instrument == "AAPL"));
    }

    #[test]
    fn test_select_window_clips_dates() {
        let frame = polars::df![
            "date" => ["2022-12-31", "2023-06-01", "2024-03-31", "2024-04-01"],
            "close" => [1.0, 2.0, 3.0, 4.0],
        ]
        .unwrap();

        let clipped = select_window(frame, "close", "AAPL", &window()).unwrap();
        let names: Vec<String> = clipped
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, ["date", "AAPL"]);
        assert_eq!(clipped.height(), 2);
    }

    #[test]
    fn test_select_window_requires_price_column() {
        let frame = polars::df!["date" => ["2024-03-01"], "open" => [1.0]].unwrap();
        let err = select_window(frame, "close", "AAPL", &window()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataUnavailable);
    }
}
