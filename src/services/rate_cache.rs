use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::Decimal;

use crate::models::{Catalog, RateMap};

#[derive(Debug, Clone, Copy)]
struct Entry {
    price: Decimal,
    observed_at: Option<DateTime<Utc>>,
}

/// Last-known-good prices, one per instrument.
///
/// Seeded from the catalog defaults and only ever overwritten by values that
/// were observed no earlier than the one already held. Lives in memory for
/// the process lifetime.
#[derive(Debug, Default)]
pub struct RateCache {
    entries: DashMap<String, Entry>,
}

impl RateCache {
    pub fn seeded(catalog: &Catalog) -> Self {
        let cache = Self::default();
        for (symbol, price) in catalog.defaults() {
            cache.seed(symbol, price);
        }
        cache
    }

    pub fn seed(&self, symbol: &str, price: Decimal) {
        self.entries.insert(
            symbol.to_string(),
            Entry {
                price,
                observed_at: None,
            },
        );
    }

    pub fn get(&self, symbol: &str) -> Option<Decimal> {
        self.entries.get(symbol).map(|e| e.price)
    }

    /// Records a fresh observation. Returns false when a newer value is
    /// already cached and the write was dropped.
    pub fn record(&self, symbol: &str, price: Decimal, observed_at: DateTime<Utc>) -> bool {
        let mut entry = self.entries.entry(symbol.to_string()).or_insert(Entry {
            price,
            observed_at: None,
        });

        match entry.observed_at {
            Some(prev) if prev > observed_at => false,
            _ => {
                entry.price = price;
                entry.observed_at = Some(observed_at);
                true
            }
        }
    }

    pub fn snapshot(&self) -> RateMap {
        self.entries
            .iter()
            .map(|e| (e.key().clone(), e.price))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
