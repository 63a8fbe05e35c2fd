//! Date-indexed price and return tables.
//!
//! Both tables wrap a polars [`DataFrame`] with a `date` column holding ISO
//! `YYYY-MM-DD` strings and one `Float64` column per instrument. Rows are
//! sorted ascending by date and every date appears exactly once.

use crate::{CapmError, Result};
use polars::prelude::*;

/// Name of the date index column.
pub const DATE_COLUMN: &str = "date";

/// Closing prices, one column per instrument (assets and benchmark).
#[derive(Debug, Clone)]
pub struct PriceTable {
    frame: DataFrame,
}

impl PriceTable {
    /// Build a price table from a frame with a `date` column and one numeric
    /// column per instrument.
    ///
    /// Instrument columns are cast to `Float64` with NaN read as a missing
    /// price, the date column to its ISO string form, and rows are sorted by
    /// date. Duplicate dates are rejected.
    pub fn new(frame: DataFrame) -> Result<Self> {
        Ok(Self {
            frame: normalize(frame)?,
        })
    }

    /// Inner-join per-instrument series on `date`.
    ///
    /// Each frame carries `date` plus one or more instrument columns. Only
    /// dates present in every frame survive.
    pub fn inner_join(series: Vec<DataFrame>) -> Result<Self> {
        let mut frames = series.into_iter();
        let first = frames
            .next()
            .ok_or_else(|| CapmError::unavailable("*", "no price series to join"))?;

        let joined = frames
            .fold(normalize(first)?.lazy(), |acc, next| {
                acc.join(
                    next.lazy()
                        .with_column(col(DATE_COLUMN).cast(DataType::String)),
                    [col(DATE_COLUMN)],
                    [col(DATE_COLUMN)],
                    JoinArgs::new(JoinType::Inner),
                )
            })
            .collect()?;

        if joined.height() == 0 {
            return Err(CapmError::unavailable("*", "no overlapping dates across instruments"));
        }

        Self::new(joined)
    }

    /// Underlying frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of dated rows.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Instrument column names in frame order.
    pub fn instruments(&self) -> Vec<String> {
        instrument_names(&self.frame)
    }

    /// Dates in ascending order.
    pub fn dates(&self) -> Result<Vec<String>> {
        date_values(&self.frame)
    }

    /// Prices for one instrument; `None` marks a missing price.
    pub fn values(&self, instrument: &str) -> Result<Vec<Option<f64>>> {
        column_values(&self.frame, instrument)
    }
}

/// Fractional simple returns; one row fewer than the source [`PriceTable`].
#[derive(Debug, Clone)]
pub struct ReturnTable {
    frame: DataFrame,
}

impl ReturnTable {
    /// Wrap a frame of precomputed returns (same layout as [`PriceTable`]).
    pub fn new(frame: DataFrame) -> Result<Self> {
        Ok(Self {
            frame: normalize(frame)?,
        })
    }

    /// Wrap a frame already produced in normalized form.
    pub(crate) const fn from_normalized(frame: DataFrame) -> Self {
        Self { frame }
    }

    /// Underlying frame.
    pub const fn frame(&self) -> &DataFrame {
        &self.frame
    }

    /// Number of return periods.
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Instrument column names in frame order.
    pub fn instruments(&self) -> Vec<String> {
        instrument_names(&self.frame)
    }

    /// Period end dates in ascending order.
    pub fn dates(&self) -> Result<Vec<String>> {
        date_values(&self.frame)
    }

    /// Returns for one instrument; `None` marks an undefined return.
    pub fn values(&self, instrument: &str) -> Result<Vec<Option<f64>>> {
        column_values(&self.frame, instrument)
    }
}

fn normalize(frame: DataFrame) -> Result<DataFrame> {
    if frame.column(DATE_COLUMN).is_err() {
        return Err(CapmError::MissingColumn(DATE_COLUMN.to_string()));
    }

    let mut casts = vec![col(DATE_COLUMN).cast(DataType::String)];
    casts.extend(
        instrument_names(&frame)
            .iter()
            .map(|name| {
                col(name.as_str())
                    .cast(DataType::Float64)
                    .fill_nan(lit(NULL).cast(DataType::Float64))
            }),
    );

    let sorted = frame
        .lazy()
        .with_columns(casts)
        .sort([DATE_COLUMN], SortMultipleOptions::default())
        .collect()?;

    let distinct = sorted
        .column(DATE_COLUMN)?
        .as_materialized_series()
        .n_unique()?;
    if distinct != sorted.height() {
        return Err(CapmError::InvalidInput(format!(
            "duplicate dates: {} rows but {} distinct dates",
            sorted.height(),
            distinct
        )));
    }

    Ok(sorted)
}

fn instrument_names(frame: &DataFrame) -> Vec<String> {
    frame
        .get_column_names()
        .into_iter()
        .filter(|name| name.as_str() != DATE_COLUMN)
        .map(|name| name.to_string())
        .collect()
}

fn date_values(frame: &DataFrame) -> Result<Vec<String>> {
    Ok(frame
        .column(DATE_COLUMN)?
        .str()?
        .into_iter()
        .map(|d| d.unwrap_or_default().to_string())
        .collect())
}

fn column_values(frame: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    if name == DATE_COLUMN {
        return Err(CapmError::InvalidInput(format!("`{DATE_COLUMN}` is not an instrument")));
    }
    let column = frame
        .column(name)
        .map_err(|_| CapmError::MissingColumn(name.to_string()))?;
    Ok(column.f64()?.into_iter().collect())
}
