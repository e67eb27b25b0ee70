use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{PriceProvider, decimal_from, ensure_success, malformed, per_instrument};
use crate::error::FetchError;
use crate::models::{InstrumentSpec, RateMap};
use crate::services::throttle::Throttle;

const NAME: &str = "binance";

/// Binance spot ticker, one request per symbol against the USDT book.
#[derive(Clone)]
pub struct BinanceTicker {
    http: Client,
    base_url: String,
    throttle: Arc<Throttle>,
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: serde_json::Value,
}

impl BinanceTicker {
    pub fn new(http: Client, base_url: &str, throttle: Arc<Throttle>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            throttle,
        }
    }

    fn market(spec: &InstrumentSpec) -> String {
        let quote = match spec.quote() {
            "USD" => "USDT",
            other => other,
        };
        format!("{}{}", spec.base(), quote)
    }

    pub async fn quote(&self, spec: &InstrumentSpec) -> Result<Decimal, FetchError> {
        let url = format!("{}/api/v3/ticker/price", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[("symbol", Self::market(spec))])
            .send()
            .await?;
        let res = ensure_success(NAME, res).await?;

        let body = res.json::<TickerPrice>().await?;
        decimal_from(&body.price).ok_or_else(|| malformed(NAME, "price is not numeric"))
    }
}

#[async_trait]
impl PriceProvider for BinanceTicker {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, wanted: &[InstrumentSpec]) -> Result<RateMap, FetchError> {
        per_instrument(NAME, wanted, Some(self.throttle.as_ref()), |spec| self.quote(spec)).await
    }
}
