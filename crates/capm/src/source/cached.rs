//! Memoizing wrapper around another price source.

use super::PriceSource;
use crate::{HistoryWindow, Result};
use async_trait::async_trait;
use polars::prelude::*;
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};
use tracing::debug;

type CacheKey = (String, HistoryWindow);

/// Caches successful fetches keyed by `(instrument, window)`.
///
/// Failures are not cached, so a later call retries the inner source.
#[derive(Debug)]
pub struct CachedPriceSource<S> {
    inner: S,
    cache: Mutex<HashMap<CacheKey, DataFrame>>,
}

impl<S: PriceSource> CachedPriceSource<S> {
    /// Wrap `inner` with an empty cache.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached series.
    pub fn len(&self) -> usize {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached series.
    pub fn clear(&self) {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// The wrapped source.
    pub const fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: PriceSource> PriceSource for CachedPriceSource<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self, instrument: &str, window: &HistoryWindow) -> Result<DataFrame> {
        let key = (instrument.to_string(), *window);
        let hit = self
            .cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        if let Some(frame) = hit {
            debug!(instrument, "price cache hit");
            return Ok(frame);
        }

        let frame = self.inner.fetch(instrument, window).await?;
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, frame.clone());
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryPriceSource;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Counting {
        inner: MemoryPriceSource,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PriceSource for Counting {
        fn name(&self) -> &str {
            "counting"
        }

        async fn fetch(&self, instrument: &str, window: &HistoryWindow) -> Result<DataFrame> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch(instrument, window).await
        }
    }

    #[tokio::test]
    async fn test_second_fetch_is_served_from_cache() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let source = CachedPriceSource::new(Counting {
            inner: MemoryPriceSource::new().with_series("AAPL", [(day, 10.0)]),
            calls: AtomicUsize::new(0),
        });
        let window = HistoryWindow::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 1).unwrap();
        let other = HistoryWindow::new(NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(), 2).unwrap();

        let first = source.fetch("AAPL", &window).await.unwrap();
        let second = source.fetch("AAPL", &window).await.unwrap();
        assert!(first.equals_missing(&second));
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 1);

        source.fetch("AAPL", &other).await.unwrap();
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);
        assert_eq!(source.len(), 2);

        assert!(source.fetch("MSFT", &window).await.is_err());
        assert_eq!(source.len(), 2);

        source.clear();
        assert!(source.is_empty());
    }
}
