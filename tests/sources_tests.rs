use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ratewatch::{
    models::{AssetClass, Catalog, InstrumentSpec, Origin, Quote},
    services::{
        providers::{
            BinanceTicker, CoinbaseSpot, FiatTable, FinnhubClient, GoldApi, MetalsApi, PriceProvider,
            YahooChart,
            fiat::cross_rates, metals::parse_gold_page,
        },
        rate_cache::RateCache,
        sources::{RateSource, SourceAdapter},
        throttle::Throttle,
    },
};

fn spec(symbol: &str) -> InstrumentSpec {
    Catalog::standard().get(symbol).unwrap().clone()
}

fn crypto_chain(server: &MockServer) -> Vec<Arc<dyn PriceProvider>> {
    let http = reqwest::Client::new();
    let throttle = Arc::new(Throttle::new(Duration::ZERO));
    vec![
        Arc::new(BinanceTicker::new(http.clone(), &server.uri(), throttle.clone())),
        Arc::new(CoinbaseSpot::new(http, &server.uri(), throttle)),
    ]
}

fn seeded_cache() -> Arc<RateCache> {
    Arc::new(RateCache::seeded(&Catalog::standard()))
}

#[tokio::test]
async fn crypto_primary_provider_answers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/price"))
        .and(query_param("symbol", "BTCUSDT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "symbol": "BTCUSDT",
            "price": "67000.50000000"
        })))
        .mount(&server)
        .await;

    let adapter = SourceAdapter::new(
        AssetClass::Crypto,
        vec![spec("BTC/USD")],
        crypto_chain(&server),
        seeded_cache(),
    );

    let quotes = adapter.fetch().await.unwrap();
    assert_eq!(quotes["BTC/USD"], Quote::live(dec!(67000.5)));
}

#[tokio::test]
async fn crypto_falls_back_to_second_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/price"))
        .respond_with(ResponseTemplate::new(451).set_body_string("restricted location"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/prices/ETH-USD/spot"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "amount": "1951.25", "base": "ETH", "currency": "USD" }
        })))
        .mount(&server)
        .await;

    let adapter = SourceAdapter::new(
        AssetClass::Crypto,
        vec![spec("ETH/USD")],
        crypto_chain(&server),
        seeded_cache(),
    );

    let quotes = adapter.fetch().await.unwrap();
    assert_eq!(quotes["ETH/USD"], Quote::live(dec!(1951.25)));
}

#[tokio::test]
async fn implausible_price_is_replaced_by_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/ticker/price"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "price": "5.0" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/prices/BTC-USD/spot"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let adapter = SourceAdapter::new(
        AssetClass::Crypto,
        vec![spec("BTC/USD")],
        crypto_chain(&server),
        seeded_cache(),
    );

    let quotes = adapter.fetch().await.unwrap();
    assert_eq!(quotes["BTC/USD"], Quote::cached(dec!(67000.0)));
}

#[tokio::test]
async fn adapter_never_fails_when_everything_is_down() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let catalog = Catalog::standard();
    let adapter = SourceAdapter::new(
        AssetClass::Crypto,
        catalog.of_class(AssetClass::Crypto),
        crypto_chain(&server),
        seeded_cache(),
    );

    let quotes = adapter.fetch().await.unwrap();
    assert_eq!(quotes.len(), catalog.of_class(AssetClass::Crypto).len());
    assert!(quotes.values().all(|q| q.origin == Origin::Cached));
}

#[test]
fn fiat_pairs_are_cross_rates_of_a_usd_table() {
    let table = HashMap::from([
        ("EUR".to_string(), dec!(0.8)),
        ("GBP".to_string(), dec!(0.75)),
        ("JPY".to_string(), dec!(150)),
    ]);
    let wanted = vec![spec("EUR/USD"), spec("USD/JPY"), spec("EUR/GBP"), spec("USD/RUB")];

    let rates = cross_rates(&table, &wanted);
    assert_eq!(rates["EUR/USD"], dec!(1.25));
    assert_eq!(rates["USD/JPY"], dec!(150));
    assert_eq!(rates["EUR/GBP"], dec!(0.9375));
    // RUB missing from the table
    assert!(!rates.contains_key("USD/RUB"));
}

#[test]
fn overflowing_cross_rate_drops_only_that_pair() {
    let table = HashMap::from([
        ("EUR".to_string(), dec!(0.0000000000000000000000000001)),
        ("GBP".to_string(), Decimal::MAX),
        ("JPY".to_string(), dec!(150)),
    ]);
    let wanted = vec![spec("EUR/GBP"), spec("USD/JPY")];

    let rates = cross_rates(&table, &wanted);
    assert!(!rates.contains_key("EUR/GBP"));
    assert_eq!(rates["USD/JPY"], dec!(150));
}

#[tokio::test]
async fn fiat_falls_back_to_second_table() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v6/latest/USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "result": "error" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/latest"))
        .and(query_param("from", "USD"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "base": "USD",
            "rates": { "EUR": 0.8, "GBP": 0.75 }
        })))
        .mount(&server)
        .await;

    let http = reqwest::Client::new();
    let providers: Vec<Arc<dyn PriceProvider>> = vec![
        Arc::new(FiatTable::er_api(http.clone(), &server.uri())),
        Arc::new(FiatTable::frankfurter(http, &server.uri())),
    ];
    let adapter = SourceAdapter::new(
        AssetClass::Fiat,
        vec![spec("EUR/USD"), spec("GBP/USD")],
        providers,
        seeded_cache(),
    );

    let quotes = adapter.fetch().await.unwrap();
    assert_eq!(quotes["EUR/USD"].origin, Origin::Live);
    assert!((quotes["EUR/USD"].price - dec!(1.25)).abs() < dec!(0.000001));
    assert_eq!(quotes["GBP/USD"].origin, Origin::Live);
}

#[tokio::test]
async fn metals_api_rates_are_inverted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/latest"))
        .and(query_param("access_key", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "rates": { "XAU": "0.0004", "XAG": "0.04" }
        })))
        .mount(&server)
        .await;

    let provider = MetalsApi::new(reqwest::Client::new(), &server.uri(), "k".to_string());
    let rates = provider.fetch(&[spec("XAU/USD"), spec("XAG/USD")]).await.unwrap();

    assert_eq!(rates["XAU/USD"], dec!(2500));
    assert_eq!(rates["XAG/USD"], dec!(25));
}

#[tokio::test]
async fn goldapi_sends_access_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/XAU/USD"))
        .and(header("x-access-token", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "price": 2950.4 })))
        .mount(&server)
        .await;

    let provider = GoldApi::new(reqwest::Client::new(), &server.uri(), "secret".to_string());
    let price = provider.quote(&spec("XAU/USD")).await.unwrap();

    assert!((price - dec!(2950.4)).abs() < dec!(0.0001));
}

#[test]
fn gold_page_scrape_takes_first_plausible_match() {
    let xau = spec("XAU/USD");

    let html = r#"<div><span class="price-value">2,9</span><span class="live-price">2345.67</span></div>"#;
    assert_eq!(parse_gold_page(html, &xau), Some(dec!(2345.67)));

    let html = r#"<div id="XAUUSD">2412.5</div>"#;
    assert_eq!(parse_gold_page(html, &xau), Some(dec!(2412.5)));

    // out of range and nothing else to try
    let html = r#"<div id="XAUUSD">12</div>"#;
    assert_eq!(parse_gold_page(html, &xau), None);
}

#[tokio::test]
async fn yahoo_reads_regular_market_price() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v8/finance/chart/CL=F"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "chart": { "result": [ { "meta": { "regularMarketPrice": 78.25 } } ], "error": null }
        })))
        .mount(&server)
        .await;

    let provider = YahooChart::new(reqwest::Client::new(), &server.uri());
    let rates = provider.fetch(&[spec("WTI/USD")]).await.unwrap();

    assert!((rates["WTI/USD"] - dec!(78.25)).abs() < dec!(0.0001));
}

#[tokio::test]
async fn finnhub_reads_current_price_only() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/quote"))
        .and(query_param("symbol", "^GSPC"))
        .and(query_param("token", "k"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "c": 5100.5, "d": 12.1, "h": 5110, "l": 5080, "o": 5090, "pc": 5088.4, "t": 1717000000
        })))
        .mount(&server)
        .await;
    // unknown symbols come back as zeros
    Mock::given(method("GET"))
        .and(path("/api/v1/quote"))
        .and(query_param("symbol", "^NDX"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "c": 0, "pc": 0, "t": 0 })))
        .mount(&server)
        .await;

    let provider = FinnhubClient::new(reqwest::Client::new(), &server.uri(), "k".to_string());
    let rates = provider.fetch(&[spec("SPX"), spec("NDX")]).await.unwrap();

    assert!((rates["SPX"] - dec!(5100.5)).abs() < dec!(0.0001));
    assert!(!rates.contains_key("NDX"));
}

#[test]
fn plausibility_bounds_are_exclusive() {
    let xau = spec("XAU/USD");
    assert!(!xau.is_plausible(dec!(1000)));
    assert!(xau.is_plausible(dec!(1000.01)));
    assert!(!xau.is_plausible(dec!(10000)));
    assert!(!xau.is_plausible(Decimal::ZERO));
}
