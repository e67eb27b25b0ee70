use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;

use super::{PriceProvider, ensure_success, malformed, missing, per_instrument};
use crate::error::FetchError;
use crate::models::{InstrumentSpec, RateMap};

const NAME: &str = "finnhub";

#[derive(Clone)]
pub struct FinnhubClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl FinnhubClient {
    pub fn new(http: Client, base_url: &str, api_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn has_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    pub async fn quote(&self, symbol: &str) -> Result<QuoteResponse, FetchError> {
        if !self.has_key() {
            return Err(malformed(NAME, "FINNHUB_API_KEY is missing"));
        }

        let url = format!("{}/api/v1/quote", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[("symbol", symbol), ("token", self.api_key.as_str())])
            .send()
            .await?;
        let res = ensure_success(NAME, res).await?;

        Ok(res.json::<QuoteResponse>().await?)
    }

    async fn price(&self, spec: &InstrumentSpec) -> Result<Decimal, FetchError> {
        let ticker = spec
            .market_ticker
            .as_deref()
            .ok_or_else(|| missing(NAME, spec))?;

        let q = self.quote(ticker).await?;
        // unknown symbols come back as all zeros
        if !q.c.is_finite() || q.c <= 0.0 {
            return Err(missing(NAME, spec));
        }
        Decimal::from_f64(q.c).ok_or_else(|| malformed(NAME, "current price out of range"))
    }
}

#[derive(Debug, Deserialize)]
pub struct QuoteResponse {
    // current price
    pub c: f64,
}

#[async_trait]
impl PriceProvider for FinnhubClient {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, wanted: &[InstrumentSpec]) -> Result<RateMap, FetchError> {
        per_instrument(NAME, wanted, None, |spec| self.price(spec)).await
    }
}
