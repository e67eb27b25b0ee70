use std::{env, time::Duration};

use crate::error::ConfigError;

/// Who may talk to the bot and receive notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Public,
    Private,
}

impl AccessMode {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "public" => Some(Self::Public),
            "private" => Some(Self::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub telegram_bot_token: String,
    pub telegram_api_url: String,

    pub host: String,
    pub port: u16,
    pub public_url: String,

    pub alerts_file: String,

    pub mode: AccessMode,
    pub allowed_user_ids: Vec<i64>,

    pub rate_check_interval: Duration,
    pub command_poll_interval: Duration,
    pub command_error_backoff: Duration,
    pub self_ping_interval: Duration,
    pub request_timeout: Duration,
    pub index_cache_ttl: Duration,
    pub crypto_request_gap: Duration,

    pub goldapi_key: String,
    pub metals_api_key: String,
    pub alphavantage_key: String,
    pub finnhub_api_key: String,
}

/// Loads settings from `.env` / the environment. The first CLI argument
/// (`public` or `private`) overrides `BOT_MODE`.
pub fn load() -> Result<Settings, ConfigError> {
    // Loads .env if present (no crash if missing)
    dotenvy::dotenv().ok();

    let mode_arg = env::args().nth(1);
    from_lookup(mode_arg.as_deref(), |name| env::var(name).ok())
}

/// Builds settings from an arbitrary variable lookup.
pub fn from_lookup<F>(mode_arg: Option<&str>, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let text = |name: &str, default: &str| var(name).unwrap_or_else(|| default.to_string());

    let port = match var("PORT") {
        Some(v) => v.trim().parse::<u16>().map_err(|_| invalid("PORT", &v))?,
        None => 8080,
    };

    let mode = match mode_arg {
        Some(arg) => AccessMode::parse(arg).ok_or_else(|| invalid("mode argument", arg))?,
        None => match var("BOT_MODE") {
            Some(v) => AccessMode::parse(&v).ok_or_else(|| invalid("BOT_MODE", &v))?,
            None => AccessMode::Public,
        },
    };

    let allowed_user_ids = match var("ALLOWED_USER_IDS") {
        Some(v) => parse_id_list(&v).ok_or_else(|| invalid("ALLOWED_USER_IDS", &v))?,
        None => Vec::new(),
    };

    let secs = |name: &str, default: u64| -> Result<Duration, ConfigError> {
        match var(name) {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| invalid(name, &v)),
            None => Ok(Duration::from_secs(default)),
        }
    };
    // loop periods and timeouts: zero would panic in `interval` or spin
    let period = |name: &str, default: u64| -> Result<Duration, ConfigError> {
        let d = secs(name, default)?;
        if d.is_zero() {
            return Err(invalid(name, "0"));
        }
        Ok(d)
    };

    let crypto_request_gap = match var("CRYPTO_REQUEST_GAP_MS") {
        Some(v) => v
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| invalid("CRYPTO_REQUEST_GAP_MS", &v))?,
        None => Duration::from_millis(100),
    };

    Ok(Settings {
        telegram_bot_token: text("TELEGRAM_BOT_TOKEN", ""),
        telegram_api_url: text("TELEGRAM_API_URL", "https://api.telegram.org"),
        host: text("HOST", "0.0.0.0"),
        port,
        public_url: text("RENDER_EXTERNAL_URL", &format!("http://localhost:{port}")),
        alerts_file: text("ALERTS_FILE", "user_alerts.json"),
        mode,
        allowed_user_ids,
        rate_check_interval: period("RATE_CHECK_INTERVAL_SECS", 10)?,
        command_poll_interval: period("COMMAND_POLL_INTERVAL_SECS", 2)?,
        command_error_backoff: secs("COMMAND_ERROR_BACKOFF_SECS", 5)?,
        self_ping_interval: period("SELF_PING_INTERVAL_SECS", 240)?,
        request_timeout: period("REQUEST_TIMEOUT_SECS", 5)?,
        index_cache_ttl: secs("INDEX_CACHE_TTL_SECS", 60)?,
        crypto_request_gap,
        goldapi_key: text("GOLDAPI_KEY", ""),
        metals_api_key: text("METALS_API_KEY", ""),
        alphavantage_key: text("ALPHAVANTAGE_KEY", "demo"),
        finnhub_api_key: text("FINNHUB_API_KEY", ""),
    })
}

fn parse_id_list(s: &str) -> Option<Vec<i64>> {
    s.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<i64>().ok())
        .collect()
}

fn invalid(name: &str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name: name.to_string(),
        value: value.to_string(),
    }
}
