use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;

use crate::models::{Origin, Quote, Quotes, Snapshot};
use crate::services::rate_cache::RateCache;
use crate::services::sources::RateSource;

/// Merges every rate source into one snapshot per pass.
pub struct RateAggregator {
    sources: Vec<Arc<dyn RateSource>>,
    cache: Arc<RateCache>,
}

impl RateAggregator {
    pub fn new(sources: Vec<Arc<dyn RateSource>>, cache: Arc<RateCache>) -> Self {
        Self { sources, cache }
    }

    pub fn cache(&self) -> &Arc<RateCache> {
        &self.cache
    }

    /// Runs all sources concurrently and merges their answers in
    /// registration order. Anything no source produced is filled from the
    /// last-known-good cache, and live values are written back to it.
    pub async fn collect(&self) -> Snapshot {
        let taken_at = Utc::now();
        let results = join_all(self.sources.iter().map(|s| s.fetch())).await;

        let mut merged = Quotes::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(quotes) => {
                    for (symbol, quote) in quotes {
                        if merged.insert(symbol.clone(), quote).is_some() {
                            tracing::warn!(source = source.name(), %symbol, "instrument produced by more than one source");
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(source = source.name(), error = %err, "source failed, falling back to cache");
                }
            }
        }

        let mut live = 0usize;
        for (symbol, quote) in &merged {
            if quote.origin == Origin::Live {
                self.cache.record(symbol, quote.price, taken_at);
                live += 1;
            }
        }

        for (symbol, price) in self.cache.snapshot() {
            merged.entry(symbol).or_insert(Quote::cached(price));
        }

        tracing::debug!(instruments = merged.len(), live, "rates collected");
        Snapshot::new(merged, taken_at)
    }
}
