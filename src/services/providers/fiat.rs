use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{PriceProvider, decimal_from, ensure_success, malformed};
use crate::error::FetchError;
use crate::models::{InstrumentSpec, RateMap};

/// A USD-based exchange-rate table (`{"rates": {"EUR": 0.92, ...}}`).
///
/// Pairs are derived as cross rates: `A/B = rate[B] / rate[A]`.
#[derive(Clone)]
pub struct FiatTable {
    http: Client,
    name: String,
    url: String,
}

impl FiatTable {
    pub fn new(http: Client, name: &str, url: String) -> Self {
        Self {
            http,
            name: name.to_string(),
            url,
        }
    }

    /// open.er-api.com, the primary fiat source.
    pub fn er_api(http: Client, base_url: &str) -> Self {
        Self::new(http, "er-api", format!("{}/v6/latest/USD", base_url.trim_end_matches('/')))
    }

    /// frankfurter.app (ECB reference rates), used as fallback.
    pub fn frankfurter(http: Client, base_url: &str) -> Self {
        Self::new(
            http,
            "frankfurter",
            format!("{}/latest?from=USD", base_url.trim_end_matches('/')),
        )
    }

    async fn table(&self) -> Result<HashMap<String, Decimal>, FetchError> {
        let res = self.http.get(&self.url).send().await?;
        let res = ensure_success(&self.name, res).await?;
        let body: Value = res.json().await?;

        let rates = body
            .get("rates")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed(&self.name, "no rates object"))?;

        Ok(rates
            .iter()
            .filter_map(|(code, v)| decimal_from(v).map(|d| (code.to_uppercase(), d)))
            .collect())
    }
}

/// Derives the wanted pairs from a USD-based table.
pub fn cross_rates(table: &HashMap<String, Decimal>, wanted: &[InstrumentSpec]) -> RateMap {
    let rate = |code: &str| -> Option<Decimal> {
        if code == "USD" {
            Some(Decimal::ONE)
        } else {
            table.get(code).copied().filter(|r| *r > Decimal::ZERO)
        }
    };

    wanted
        .iter()
        .filter_map(|spec| {
            let base = rate(spec.base())?;
            let quote = rate(spec.quote())?;
            // a broken table can overflow; drop the pair instead of panicking
            Some((spec.symbol.clone(), quote.checked_div(base)?))
        })
        .collect()
}

#[async_trait]
impl PriceProvider for FiatTable {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, wanted: &[InstrumentSpec]) -> Result<RateMap, FetchError> {
        let table = self.table().await?;
        Ok(cross_rates(&table, wanted))
    }
}
