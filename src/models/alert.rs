use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Chat id of the user owning alerts. Also the chat notifications go to.
pub type UserId = i64;

/// All alerts keyed by owner, in creation order.
pub type AlertBook = BTreeMap<UserId, Vec<Alert>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub pair: String,

    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub target: Option<Decimal>,

    // one-shot: flipped to false on hit, never back
    #[serde(default)]
    pub active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}

impl Alert {
    pub fn new(pair: &str, target: Decimal, created: String) -> Self {
        Self {
            pair: pair.to_string(),
            target: Some(target),
            active: true,
            created: Some(created),
        }
    }
}
