use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{PriceProvider, decimal_from, ensure_success, malformed, missing, per_instrument};
use crate::error::FetchError;
use crate::models::{InstrumentSpec, RateMap};

/// goldapi.io, keyed by `x-access-token`.
#[derive(Clone)]
pub struct GoldApi {
    http: Client,
    base_url: String,
    token: String,
}

impl GoldApi {
    const NAME: &'static str = "goldapi";

    pub fn new(http: Client, base_url: &str, token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    pub async fn quote(&self, spec: &InstrumentSpec) -> Result<Decimal, FetchError> {
        let url = format!("{}/api/{}/{}", self.base_url, spec.base(), spec.quote());
        let res = self
            .http
            .get(url)
            .header("x-access-token", &self.token)
            .send()
            .await?;
        let res = ensure_success(Self::NAME, res).await?;

        let body: Value = res.json().await?;
        body.get("price")
            .and_then(decimal_from)
            .ok_or_else(|| missing(Self::NAME, spec))
    }
}

#[async_trait]
impl PriceProvider for GoldApi {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, wanted: &[InstrumentSpec]) -> Result<RateMap, FetchError> {
        per_instrument(Self::NAME, wanted, None, |spec| self.quote(spec)).await
    }
}

/// metals-api.com. Rates are quoted as ounces per USD, so prices are the
/// inverse. All wanted metals come back from one request.
#[derive(Clone)]
pub struct MetalsApi {
    http: Client,
    base_url: String,
    access_key: String,
}

impl MetalsApi {
    const NAME: &'static str = "metals-api";

    pub fn new(http: Client, base_url: &str, access_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key,
        }
    }
}

#[async_trait]
impl PriceProvider for MetalsApi {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, wanted: &[InstrumentSpec]) -> Result<RateMap, FetchError> {
        let symbols = wanted.iter().map(|s| s.base()).collect::<Vec<_>>().join(",");
        let url = format!("{}/v1/latest", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[
                ("access_key", self.access_key.as_str()),
                ("base", "USD"),
                ("symbols", symbols.as_str()),
            ])
            .send()
            .await?;
        let res = ensure_success(Self::NAME, res).await?;

        let body: Value = res.json().await?;
        let rates = body
            .get("rates")
            .and_then(Value::as_object)
            .ok_or_else(|| malformed(Self::NAME, "no rates object"))?;

        Ok(wanted
            .iter()
            .filter_map(|spec| {
                let per_usd = rates.get(spec.base()).and_then(decimal_from)?;
                if per_usd <= Decimal::ZERO {
                    return None;
                }
                Some((spec.symbol.clone(), Decimal::ONE.checked_div(per_usd)?))
            })
            .collect())
    }
}

/// Alpha Vantage `CURRENCY_EXCHANGE_RATE`.
#[derive(Clone)]
pub struct AlphaVantageRate {
    http: Client,
    base_url: String,
    api_key: String,
}

impl AlphaVantageRate {
    const NAME: &'static str = "alphavantage";

    pub fn new(http: Client, base_url: &str, api_key: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub async fn quote(&self, spec: &InstrumentSpec) -> Result<Decimal, FetchError> {
        let url = format!("{}/query", self.base_url);
        let res = self
            .http
            .get(url)
            .query(&[
                ("function", "CURRENCY_EXCHANGE_RATE"),
                ("from_currency", spec.base()),
                ("to_currency", spec.quote()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await?;
        let res = ensure_success(Self::NAME, res).await?;

        let body: Value = res.json().await?;
        body.get("Realtime Currency Exchange Rate")
            .and_then(|r| r.get("5. Exchange Rate"))
            .and_then(decimal_from)
            .ok_or_else(|| missing(Self::NAME, spec))
    }
}

#[async_trait]
impl PriceProvider for AlphaVantageRate {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, wanted: &[InstrumentSpec]) -> Result<RateMap, FetchError> {
        per_instrument(Self::NAME, wanted, None, |spec| self.quote(spec)).await
    }
}

static GOLD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)XAUUSD.*?(\d+\.?\d*)",
        r"(?i)gold-price.*?(\d+\.?\d*)",
        r"(?i)price-value.*?(\d+\.?\d*)",
        r#"(?i)<span[^>]*class="[^"]*price[^"]*"[^>]*>(\d+\.?\d*)</span>"#,
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Last resort for gold: scrape a public price page.
#[derive(Clone)]
pub struct GoldPricePage {
    http: Client,
    url: String,
}

impl GoldPricePage {
    const NAME: &'static str = "goldprice-page";
    const SYMBOL: &'static str = "XAU/USD";

    pub fn new(http: Client, url: String) -> Self {
        Self { http, url }
    }
}

/// First number matched by any pattern that passes the instrument's range.
pub fn parse_gold_page(html: &str, spec: &InstrumentSpec) -> Option<Decimal> {
    GOLD_PATTERNS.iter().find_map(|re| {
        let caps = re.captures(html)?;
        let price: Decimal = caps.get(1)?.as_str().parse().ok()?;
        spec.is_plausible(price).then_some(price)
    })
}

#[async_trait]
impl PriceProvider for GoldPricePage {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn fetch(&self, wanted: &[InstrumentSpec]) -> Result<RateMap, FetchError> {
        let Some(spec) = wanted.iter().find(|s| s.symbol == Self::SYMBOL) else {
            return Ok(RateMap::new());
        };

        let res = self.http.get(&self.url).send().await?;
        let res = ensure_success(Self::NAME, res).await?;
        let html = res.text().await?;

        let price = parse_gold_page(&html, spec).ok_or_else(|| missing(Self::NAME, spec))?;
        Ok(RateMap::from([(spec.symbol.clone(), price)]))
    }
}
