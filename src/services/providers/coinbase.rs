use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{PriceProvider, decimal_from, ensure_success, malformed, per_instrument};
use crate::error::FetchError;
use crate::models::{InstrumentSpec, RateMap};
use crate::services::throttle::Throttle;

const NAME: &str = "coinbase";

/// Coinbase public spot price, fallback for crypto.
#[derive(Clone)]
pub struct CoinbaseSpot {
    http: Client,
    base_url: String,
    throttle: Arc<Throttle>,
}

#[derive(Debug, Deserialize)]
struct SpotResponse {
    data: SpotData,
}

#[derive(Debug, Deserialize)]
struct SpotData {
    amount: serde_json::Value,
}

impl CoinbaseSpot {
    pub fn new(http: Client, base_url: &str, throttle: Arc<Throttle>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            throttle,
        }
    }

    pub async fn quote(&self, spec: &InstrumentSpec) -> Result<Decimal, FetchError> {
        let url = format!(
            "{}/v2/prices/{}-{}/spot",
            self.base_url,
            spec.base(),
            spec.quote()
        );
        let res = self.http.get(url).send().await?;
        let res = ensure_success(NAME, res).await?;

        let body = res.json::<SpotResponse>().await?;
        decimal_from(&body.data.amount).ok_or_else(|| malformed(NAME, "amount is not numeric"))
    }
}

#[async_trait]
impl PriceProvider for CoinbaseSpot {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch(&self, wanted: &[InstrumentSpec]) -> Result<RateMap, FetchError> {
        per_instrument(NAME, wanted, Some(self.throttle.as_ref()), |spec| self.quote(spec)).await
    }
}
