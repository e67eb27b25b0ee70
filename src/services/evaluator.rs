use rust_decimal::Decimal;

use crate::models::{Alert, AlertBook, Catalog, Notification, PriceTier, Snapshot, UserId, format_price};

/// Checks every active alert against `snapshot`, deactivating the ones that
/// hit and returning one notification per hit.
///
/// Alerts are independent: several alerts of one user on the same pair can
/// all fire in the same pass. An inactive alert is never looked at again.
pub fn evaluate(catalog: &Catalog, snapshot: &Snapshot, book: &mut AlertBook) -> Vec<Notification> {
    let mut out = Vec::new();

    for (&user_id, alerts) in book.iter_mut() {
        for alert in alerts.iter_mut() {
            if let Some(n) = check_alert(catalog, snapshot, user_id, alert) {
                out.push(n);
            }
        }
    }

    out
}

fn check_alert(
    catalog: &Catalog,
    snapshot: &Snapshot,
    user_id: UserId,
    alert: &mut Alert,
) -> Option<Notification> {
    if !alert.active {
        return None;
    }
    let target = alert.target?;
    let current = snapshot.price(&alert.pair)?;

    let tier = catalog.tier(&alert.pair);
    if !tier.tolerance().is_hit(current, target) {
        return None;
    }

    alert.active = false;
    tracing::info!(
        user_id,
        pair = %alert.pair,
        target = %format_price(target, tier.precision()),
        current = %format_price(current, tier.precision()),
        "target reached"
    );

    Some(Notification {
        user_id,
        text: hit_message(&alert.pair, target, current, tier),
    })
}

pub fn hit_message(pair: &str, target: Decimal, current: Decimal, tier: PriceTier) -> String {
    let dp = tier.precision();
    format!(
        "🎯 <b>TARGET REACHED!</b>\n\n📊 {pair}\n🎯 Target: {}\n💰 Current: {}",
        format_price(target, dp),
        format_price(current, dp)
    )
}
