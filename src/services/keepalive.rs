use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

/// Periodically GETs our own `/health` so the host keeps the process warm.
pub async fn run_self_ping(http: Client, public_url: String, every: Duration, shutdown: CancellationToken) {
    let url = format!("{}/health", public_url.trim_end_matches('/'));

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(every) => {}
        }

        match http.get(&url).timeout(Duration::from_secs(30)).send().await {
            Ok(res) if res.status().is_success() => tracing::info!(%url, "self-ping ok"),
            Ok(res) => tracing::warn!(%url, status = %res.status(), "self-ping returned non-success"),
            Err(e) => tracing::error!(%url, error = %e, "self-ping failed"),
        }
    }

    tracing::info!("self-ping stopped");
}
