//! Rate sources: one adapter per asset class.
//!
//! An adapter owns an ordered provider chain. Each provider gets the
//! instruments that are still unpriced; answers outside an instrument's
//! sanity range are discarded. Whatever is left after the last provider is
//! served from the last-known-good cache, so an adapter never fails.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::config::Settings;
use crate::error::FetchError;
use crate::models::{AssetClass, Catalog, InstrumentSpec, Quote, Quotes};
use crate::services::providers::{
    AlphaVantageRate, BinanceTicker, CoinbaseSpot, FiatTable, FinnhubClient, GoldApi,
    GoldPricePage, MetalsApi, PriceProvider, YahooChart,
};
use crate::services::rate_cache::RateCache;
use crate::services::throttle::Throttle;

#[async_trait]
pub trait RateSource: Send + Sync {
    fn name(&self) -> &str;

    /// Quotes for every instrument the source is responsible for.
    async fn fetch(&self) -> Result<Quotes, FetchError>;
}

pub struct SourceAdapter {
    class: AssetClass,
    instruments: Vec<InstrumentSpec>,
    providers: Vec<Arc<dyn PriceProvider>>,
    cache: Arc<RateCache>,
}

impl SourceAdapter {
    pub fn new(
        class: AssetClass,
        instruments: Vec<InstrumentSpec>,
        providers: Vec<Arc<dyn PriceProvider>>,
        cache: Arc<RateCache>,
    ) -> Self {
        Self {
            class,
            instruments,
            providers,
            cache,
        }
    }

    pub fn class(&self) -> AssetClass {
        self.class
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

#[async_trait]
impl RateSource for SourceAdapter {
    fn name(&self) -> &str {
        self.class.as_str()
    }

    async fn fetch(&self) -> Result<Quotes, FetchError> {
        let mut quotes = Quotes::new();
        let mut pending: Vec<InstrumentSpec> = self.instruments.clone();

        for provider in &self.providers {
            if pending.is_empty() {
                break;
            }

            let prices = match provider.fetch(&pending).await {
                Ok(p) => p,
                Err(err) => {
                    tracing::warn!(source = self.name(), provider = provider.name(), error = %err, "provider failed");
                    continue;
                }
            };

            pending.retain(|spec| {
                let Some(&price) = prices.get(&spec.symbol) else {
                    return true;
                };
                if !spec.is_plausible(price) {
                    let err = FetchError::Implausible {
                        instrument: spec.symbol.clone(),
                        price,
                    };
                    tracing::warn!(source = self.name(), provider = provider.name(), error = %err, "discarding price");
                    return true;
                }
                quotes.insert(spec.symbol.clone(), Quote::live(price));
                false
            });
        }

        for spec in pending {
            match self.cache.get(&spec.symbol) {
                Some(price) => {
                    tracing::warn!(source = self.name(), instrument = %spec.symbol, %price, "all providers exhausted, using cache");
                    quotes.insert(spec.symbol, Quote::cached(price));
                }
                None => {
                    tracing::warn!(source = self.name(), instrument = %spec.symbol, "all providers exhausted, nothing cached");
                }
            }
        }

        Ok(quotes)
    }
}

/// Serves the inner source's last answer for `ttl`, to spare providers with
/// low rate limits. A cached answer counts as freshly fetched.
pub struct FreshnessCache<S> {
    inner: S,
    ttl: Duration,
    last: Mutex<Option<(Instant, Quotes)>>,
}

impl<S: RateSource> FreshnessCache<S> {
    pub fn new(inner: S, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl<S: RateSource> RateSource for FreshnessCache<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn fetch(&self) -> Result<Quotes, FetchError> {
        let mut last = self.last.lock().await;
        if let Some((at, quotes)) = last.as_ref() {
            if at.elapsed() < self.ttl {
                tracing::debug!(source = self.name(), "serving from freshness cache");
                return Ok(quotes.clone());
            }
        }

        let quotes = self.inner.fetch().await?;
        // only provider answers are worth replaying; fallbacks are re-derived each tick
        let live: Quotes = quotes
            .iter()
            .filter(|(_, q)| q.origin == crate::models::Origin::Live)
            .map(|(symbol, q)| (symbol.clone(), *q))
            .collect();
        if !live.is_empty() {
            *last = Some((Instant::now(), live));
        }
        Ok(quotes)
    }
}

/// Public endpoints. Tests point providers at mock servers instead.
pub struct Endpoints {
    pub er_api: String,
    pub frankfurter: String,
    pub binance: String,
    pub coinbase: String,
    pub goldapi: String,
    pub metals_api: String,
    pub alphavantage: String,
    pub goldprice_page: String,
    pub yahoo: String,
    pub finnhub: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            er_api: "https://open.er-api.com".to_string(),
            frankfurter: "https://api.frankfurter.app".to_string(),
            binance: "https://api.binance.com".to_string(),
            coinbase: "https://api.coinbase.com".to_string(),
            goldapi: "https://www.goldapi.io".to_string(),
            metals_api: "https://api.metals-api.com".to_string(),
            alphavantage: "https://www.alphavantage.co".to_string(),
            goldprice_page: "https://www.goldprice.org/live-gold-price".to_string(),
            yahoo: "https://query1.finance.yahoo.com".to_string(),
            finnhub: "https://finnhub.io".to_string(),
        }
    }
}

/// Builds the five class adapters in aggregation order.
pub fn build_sources(
    settings: &Settings,
    endpoints: &Endpoints,
    http: &Client,
    catalog: &Catalog,
    cache: &Arc<RateCache>,
) -> Vec<Arc<dyn RateSource>> {
    let adapter = |class: AssetClass, providers: Vec<Arc<dyn PriceProvider>>| {
        SourceAdapter::new(class, catalog.of_class(class), providers, cache.clone())
    };

    let fiat: Vec<Arc<dyn PriceProvider>> = vec![
        Arc::new(FiatTable::er_api(http.clone(), &endpoints.er_api)),
        Arc::new(FiatTable::frankfurter(http.clone(), &endpoints.frankfurter)),
    ];

    let throttle = Arc::new(Throttle::new(settings.crypto_request_gap));
    let crypto: Vec<Arc<dyn PriceProvider>> = vec![
        Arc::new(BinanceTicker::new(http.clone(), &endpoints.binance, throttle.clone())),
        Arc::new(CoinbaseSpot::new(http.clone(), &endpoints.coinbase, throttle)),
    ];

    let mut metals: Vec<Arc<dyn PriceProvider>> = Vec::new();
    if !settings.goldapi_key.is_empty() {
        metals.push(Arc::new(GoldApi::new(
            http.clone(),
            &endpoints.goldapi,
            settings.goldapi_key.clone(),
        )));
    }
    if !settings.metals_api_key.is_empty() {
        metals.push(Arc::new(MetalsApi::new(
            http.clone(),
            &endpoints.metals_api,
            settings.metals_api_key.clone(),
        )));
    }
    if !settings.alphavantage_key.is_empty() {
        metals.push(Arc::new(AlphaVantageRate::new(
            http.clone(),
            &endpoints.alphavantage,
            settings.alphavantage_key.clone(),
        )));
    }
    metals.push(Arc::new(GoldPricePage::new(
        http.clone(),
        endpoints.goldprice_page.clone(),
    )));

    let market = || -> Vec<Arc<dyn PriceProvider>> {
        let mut providers: Vec<Arc<dyn PriceProvider>> =
            vec![Arc::new(YahooChart::new(http.clone(), &endpoints.yahoo))];
        let finnhub = FinnhubClient::new(
            http.clone(),
            &endpoints.finnhub,
            settings.finnhub_api_key.clone(),
        );
        if finnhub.has_key() {
            providers.push(Arc::new(finnhub));
        }
        providers
    };

    vec![
        Arc::new(adapter(AssetClass::Fiat, fiat)),
        Arc::new(adapter(AssetClass::Crypto, crypto)),
        Arc::new(adapter(AssetClass::Metal, metals)),
        Arc::new(FreshnessCache::new(
            adapter(AssetClass::Index, market()),
            settings.index_cache_ttl,
        )),
        Arc::new(FreshnessCache::new(
            adapter(AssetClass::Commodity, market()),
            settings.index_cache_ttl,
        )),
    ]
}
