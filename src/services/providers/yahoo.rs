use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{PriceProvider, decimal_from, ensure_success, missing, per_instrument};
use crate::error::FetchError;
use crate::models::{InstrumentSpec, RateMap};

const NAME: &str = "yahoo";

/// Yahoo Finance chart endpoint, used for indices and futures.
/// Instruments without a `market_ticker` are skipped.
#[derive(Clone)]
pub struct YahooChart {
    http: Client,
    base_url: String,
}

impl YahooChart {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn quote(&self, spec: &InstrumentSpec) -> Result<Decimal, FetchError> {
        let ticker = spec
            .market_ticker
            .as_deref()
            .ok_or_else(|| missing(NAME, spec))?;

        let url = format!(
            "{}/v8/finance/chart/{}",
            self.base_url,
            ticker.replace('^', "%5E")
        );
        let res = self
            .http
            .get(url)
            .query(&[("interval", "1d"), ("range", "1d")])
            .header(reqwest::header::USER_AGENT, "Mozilla/5.0")
            .send()
            .await?;
        let res = ensure_success(NAME, res).await?;

        let body: Value = res.json().await?;
        body.pointer("/chart/result/0/meta/regularMarketPrice")
            .and_then(decimal_from)
            .ok_or_else(|| missing(NAME, spec))
    }
}

#[async_trait]
impl PriceProvider for YahooChart {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, wanted: &[InstrumentSpec]) -> Result<RateMap, FetchError> {
        per_instrument(NAME, wanted, None, |spec| self.quote(spec)).await
    }
}
