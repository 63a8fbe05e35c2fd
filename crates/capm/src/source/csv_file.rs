//! CSV file price source - one `<INSTRUMENT>.csv` per instrument.
//!
//! Each file needs a header row with a `date` column (`YYYY-MM-DD`) and a
//! price column (`close` unless configured otherwise). Empty price cells are
//! read as missing prices.

use super::{PriceSource, select_window};
use crate::{CapmError, HistoryWindow, Result};
use async_trait::async_trait;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads closing prices from a directory of CSV files.
#[derive(Debug, Clone)]
pub struct CsvPriceSource {
    root: PathBuf,
    price_column: String,
}

impl CsvPriceSource {
    /// Read `<root>/<INSTRUMENT>.csv` using the `close` column.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            price_column: "close".to_string(),
        }
    }

    /// Use a different price column (e.g. `adj_close`).
    pub fn with_price_column(mut self, column: impl Into<String>) -> Self {
        self.price_column = column.into();
        self
    }

    /// Directory the files are read from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, instrument: &str) -> PathBuf {
        self.root.join(format!("{instrument}.csv"))
    }
}

#[async_trait]
impl PriceSource for CsvPriceSource {
    fn name(&self) -> &str {
        "csv"
    }

    async fn fetch(&self, instrument: &str, window: &HistoryWindow) -> Result<DataFrame> {
        let path = self.path_for(instrument);
        if !path.is_file() {
            return Err(CapmError::unavailable(
                instrument,
                format!("no price file at {}", path.display()),
            ));
        }

        debug!(instrument, path = %path.display(), "reading price file");
        let frame = tokio::task::spawn_blocking(move || read_csv(path))
            .await
            .map_err(|e| CapmError::Task(e.to_string()))?
            .map_err(|e| CapmError::unavailable(instrument, e.to_string()))?;

        select_window(frame, &self.price_column, instrument, window)
    }
}

pub(crate) fn read_csv(path: PathBuf) -> PolarsResult<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path))?
        .finish()
}
