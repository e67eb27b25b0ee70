//! Crate-level error types.
//!
//! Each boundary gets its own enum (providers, alert store, messaging,
//! configuration) and [`BotError`] wraps them so loop bodies can use `?`.

use rust_decimal::Decimal;

/// Convenience alias used by the loops and handlers.
pub type Result<T> = std::result::Result<T, BotError>;

/// A single provider failed to produce a usable price.
///
/// These are soft failures: the adapter logs them and moves on to the next
/// provider, and finally to the last-known-good cache.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned status {status}")]
    Status { provider: String, status: u16 },

    #[error("malformed response from {provider}: {reason}")]
    Malformed { provider: String, reason: String },

    #[error("{provider} has no price for {instrument}")]
    Missing { provider: String, instrument: String },

    #[error("implausible price {price} for {instrument}")]
    Implausible { instrument: String, price: Decimal },
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("alert file io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("alert file json error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum MessengerError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("messaging api rejected {method}: {description}")]
    Api { method: String, description: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: String, value: String },
}

/// Top-level error for ticks, handlers and start-up.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Messenger(#[from] MessengerError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("tick panicked: {0}")]
    Panicked(String),
}
