//! Upstream price providers.
//!
//! Every provider implements [`PriceProvider`]: given the instruments still
//! missing for a source class, it returns whatever subset it could price.
//! Adapters (see `services::sources`) chain providers in rank order.

use std::future::Future;
use std::str::FromStr;

use async_trait::async_trait;
use reqwest::Response;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde_json::Value;

use crate::error::FetchError;
use crate::models::{InstrumentSpec, RateMap};
use crate::services::throttle::Throttle;

pub mod binance;
pub mod coinbase;
pub mod fiat;
pub mod finnhub;
pub mod metals;
pub mod yahoo;

pub use binance::BinanceTicker;
pub use coinbase::CoinbaseSpot;
pub use fiat::FiatTable;
pub use finnhub::FinnhubClient;
pub use metals::{AlphaVantageRate, GoldApi, GoldPricePage, MetalsApi};
pub use yahoo::YahooChart;

#[async_trait]
pub trait PriceProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Prices for as many of `wanted` as this provider covers. Absent keys
    /// mean "not covered"; an `Err` means nothing could be priced.
    async fn fetch(&self, wanted: &[InstrumentSpec]) -> Result<RateMap, FetchError>;
}

/// Rejects non-success responses, keeping the body for the log line.
pub(crate) async fn ensure_success(provider: &str, res: Response) -> Result<Response, FetchError> {
    if res.status().is_success() {
        return Ok(res);
    }

    let status = res.status();
    let body = res.text().await.unwrap_or_default();
    tracing::debug!(provider, %status, body = %body.chars().take(200).collect::<String>(), "provider error body");

    Err(FetchError::Status {
        provider: provider.to_string(),
        status: status.as_u16(),
    })
}

/// Reads a JSON number or numeric string as a decimal.
pub(crate) fn decimal_from(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => n.as_f64().and_then(Decimal::from_f64),
        },
        Value::String(s) => {
            let s = s.trim();
            Decimal::from_str(s)
                .or_else(|_| Decimal::from_scientific(s))
                .ok()
        }
        _ => None,
    }
}

pub(crate) fn malformed(provider: &str, reason: impl Into<String>) -> FetchError {
    FetchError::Malformed {
        provider: provider.to_string(),
        reason: reason.into(),
    }
}

pub(crate) fn missing(provider: &str, spec: &InstrumentSpec) -> FetchError {
    FetchError::Missing {
        provider: provider.to_string(),
        instrument: spec.symbol.clone(),
    }
}

/// Runs `quote` for each instrument in turn, optionally spaced by `throttle`.
/// A failed instrument is logged and skipped; the call only fails when not a
/// single instrument could be priced.
pub(crate) async fn per_instrument<'a, F, Fut>(
    provider: &str,
    wanted: &'a [InstrumentSpec],
    throttle: Option<&Throttle>,
    mut quote: F,
) -> Result<RateMap, FetchError>
where
    F: FnMut(&'a InstrumentSpec) -> Fut,
    Fut: Future<Output = Result<Decimal, FetchError>>,
{
    let mut out = RateMap::new();
    let mut last_err = None;

    for spec in wanted {
        if let Some(t) = throttle {
            t.acquire().await;
        }

        match quote(spec).await {
            Ok(price) => {
                tracing::debug!(provider, instrument = %spec.symbol, %price, "quote");
                out.insert(spec.symbol.clone(), price);
            }
            Err(err) => {
                tracing::warn!(provider, instrument = %spec.symbol, error = %err, "quote failed");
                last_err = Some(err);
            }
        }
    }

    match last_err {
        Some(err) if out.is_empty() => Err(err),
        _ => Ok(out),
    }
}
