use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

/// Plain instrument -> price mapping as returned by a provider.
pub type RateMap = BTreeMap<String, Decimal>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Fetched from a provider during this pass.
    Live,
    /// Served from the last-known-good cache.
    Cached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quote {
    pub price: Decimal,
    pub origin: Origin,
}

impl Quote {
    pub fn live(price: Decimal) -> Self {
        Self { price, origin: Origin::Live }
    }

    pub fn cached(price: Decimal) -> Self {
        Self { price, origin: Origin::Cached }
    }
}

/// What a rate source hands to the aggregator.
pub type Quotes = BTreeMap<String, Quote>;

/// One aggregation pass worth of prices. Never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    rates: RateMap,
    stale: BTreeSet<String>,
    taken_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(quotes: Quotes, taken_at: DateTime<Utc>) -> Self {
        let stale = quotes
            .iter()
            .filter(|(_, q)| q.origin == Origin::Cached)
            .map(|(k, _)| k.clone())
            .collect();
        let rates = quotes.into_iter().map(|(k, q)| (k, q.price)).collect();

        Self { rates, stale, taken_at }
    }

    pub fn price(&self, instrument: &str) -> Option<Decimal> {
        self.rates.get(instrument).copied()
    }

    /// True when the price came from the fallback cache rather than a provider.
    pub fn is_stale(&self, instrument: &str) -> bool {
        self.stale.contains(instrument)
    }

    pub fn rates(&self) -> &RateMap {
        &self.rates
    }

    pub fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }
}
