use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use ratewatch::{
    models::{Alert, AlertBook, Catalog, PriceTier, Quote, Quotes, Snapshot, format_price},
    services::evaluator::{evaluate, hit_message},
};

fn snapshot(prices: &[(&str, Decimal)]) -> Snapshot {
    let quotes: Quotes = prices
        .iter()
        .map(|(k, v)| (k.to_string(), Quote::live(*v)))
        .collect();
    Snapshot::new(quotes, Utc::now())
}

fn book_with(user: i64, alerts: Vec<Alert>) -> AlertBook {
    AlertBook::from([(user, alerts)])
}

fn alert(pair: &str, target: Decimal) -> Alert {
    Alert::new(pair, target, "2024-01-01 00:00:00".to_string())
}

#[test]
fn high_value_boundary_is_exclusive() {
    let catalog = Catalog::standard();

    let mut book = book_with(1, vec![alert("BTC/USD", dec!(67000))]);
    let out = evaluate(&catalog, &snapshot(&[("BTC/USD", dec!(67006.70))]), &mut book);
    assert!(out.is_empty());
    assert!(book[&1][0].active);

    let out = evaluate(&catalog, &snapshot(&[("BTC/USD", dec!(67006.69))]), &mut book);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].user_id, 1);
    assert!(!book[&1][0].active);
}

#[test]
fn extreme_targets_are_plain_misses() {
    let tolerance = PriceTier::HighValue.tolerance();
    let tiny = dec!(0.000000000000000000000000001);

    assert!(!tolerance.is_hit(dec!(67000), tiny));
    assert!(!tolerance.is_hit(Decimal::MAX, tiny));
    assert!(!tolerance.is_hit(dec!(1), Decimal::MAX));
}

#[test]
fn low_unit_boundary_is_exclusive() {
    let catalog = Catalog::standard();

    let mut book = book_with(7, vec![alert("DOGE/USD", dec!(0.0980))]);
    let out = evaluate(&catalog, &snapshot(&[("DOGE/USD", dec!(0.0981))]), &mut book);
    assert!(out.is_empty());

    let out = evaluate(&catalog, &snapshot(&[("DOGE/USD", dec!(0.09809))]), &mut book);
    assert_eq!(out.len(), 1);
}

#[test]
fn standard_bucket_and_unknown_pairs() {
    let catalog = Catalog::standard();

    let mut book = book_with(
        3,
        vec![alert("EUR/USD", dec!(1.1000)), alert("ABC/XYZ", dec!(2.5))],
    );
    let out = evaluate(
        &catalog,
        &snapshot(&[("EUR/USD", dec!(1.10005)), ("ABC/XYZ", dec!(2.50004))]),
        &mut book,
    );

    // EUR/USD sits exactly on the tolerance; the unknown pair is inside it
    assert_eq!(out.len(), 1);
    assert!(out[0].text.contains("ABC/XYZ"));
    assert!(book[&3][0].active);
    assert!(!book[&3][1].active);
    assert_eq!(catalog.tier("ABC/XYZ"), PriceTier::Standard);
}

#[test]
fn fires_once_and_stays_inactive() {
    let catalog = Catalog::standard();
    let mut book = book_with(1, vec![alert("ETH/USD", dec!(1950))]);
    let snap = snapshot(&[("ETH/USD", dec!(1950.05))]);

    assert_eq!(evaluate(&catalog, &snap, &mut book).len(), 1);
    assert!(evaluate(&catalog, &snap, &mut book).is_empty());
    assert!(evaluate(&catalog, &snap, &mut book).is_empty());
}

#[test]
fn same_pair_alerts_fire_together() {
    let catalog = Catalog::standard();
    let mut book = AlertBook::from([
        (1, vec![alert("XAU/USD", dec!(2900)), alert("XAU/USD", dec!(2900.1))]),
        (2, vec![alert("XAU/USD", dec!(2900))]),
    ]);

    let out = evaluate(&catalog, &snapshot(&[("XAU/USD", dec!(2900.05))]), &mut book);
    assert_eq!(out.len(), 3);
    assert!(book.values().flatten().all(|a| !a.active));
}

#[test]
fn skips_inactive_unset_and_unpriced() {
    let catalog = Catalog::standard();

    let mut inactive = alert("BTC/USD", dec!(67000));
    inactive.active = false;
    let mut unset = alert("BTC/USD", dec!(67000));
    unset.target = None;
    let unpriced = alert("SPX", dec!(5000));

    let mut book = book_with(9, vec![inactive, unset, unpriced]);
    let before = book.clone();

    let out = evaluate(&catalog, &snapshot(&[("BTC/USD", dec!(67000))]), &mut book);
    assert!(out.is_empty());
    assert_eq!(book, before);
}

#[test]
fn hit_message_uses_tier_precision() {
    let msg = hit_message("BTC/USD", dec!(67000), dec!(67006.694), PriceTier::HighValue);
    assert!(msg.contains("TARGET REACHED"));
    assert!(msg.contains("📊 BTC/USD"));
    assert!(msg.contains("Target: 67000.00"));
    assert!(msg.contains("Current: 67006.69"));

    let msg = hit_message("EUR/USD", dec!(1.1), dec!(1.100004), PriceTier::Standard);
    assert!(msg.contains("Target: 1.10000"));
    assert!(msg.contains("Current: 1.10000"));
}

#[test]
fn format_price_rounds_half_away_from_zero() {
    assert_eq!(format_price(dec!(0.12345), 4), "0.1235");
    assert_eq!(format_price(dec!(2), 2), "2.00");
    assert_eq!(format_price(dec!(1.000049), 4), "1.0000");
}
