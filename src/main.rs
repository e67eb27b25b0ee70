use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use ratewatch::{
    AppState, config, routes,
    models::Catalog,
    services::{
        aggregator::RateAggregator,
        alert_monitor::run_rate_monitor,
        alert_store::AlertStore,
        command_poller::{CommandPoller, run_command_poller},
        commands::CommandHandler,
        keepalive::run_self_ping,
        rate_cache::RateCache,
        sources::{Endpoints, build_sources},
        supervisor::TaskSupervisor,
        telegram::{Messenger, TelegramClient},
    },
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = config::load()?;
    if settings.telegram_bot_token.is_empty() {
        tracing::warn!("TELEGRAM_BOT_TOKEN is empty, messaging calls will fail");
    }

    let http = reqwest::Client::builder()
        .timeout(settings.request_timeout)
        .build()?;

    let catalog = Arc::new(Catalog::standard());
    let cache = Arc::new(RateCache::seeded(&catalog));
    let sources = build_sources(&settings, &Endpoints::default(), &http, &catalog, &cache);
    let aggregator = Arc::new(RateAggregator::new(sources, cache));
    let store = Arc::new(AlertStore::open(&settings.alerts_file).await?);
    let messenger: Arc<dyn Messenger> = Arc::new(TelegramClient::new(
        http.clone(),
        &settings.telegram_api_url,
        settings.telegram_bot_token.clone(),
    ));

    let state = AppState::new(settings.clone(), catalog.clone(), store, aggregator, messenger.clone());

    tracing::info!(
        mode = ?settings.mode,
        instruments = catalog.all().len(),
        rate_check_secs = settings.rate_check_interval.as_secs(),
        command_poll_secs = settings.command_poll_interval.as_secs(),
        "starting bot"
    );

    let shutdown = CancellationToken::new();
    let mut tasks = TaskSupervisor::new();

    tasks.spawn("rate-monitor", run_rate_monitor(state.clone(), shutdown.clone()));

    let handler = Arc::new(CommandHandler::new(state.clone()));
    tasks.spawn(
        "command-poller",
        run_command_poller(
            CommandPoller::new(messenger, handler),
            settings.command_poll_interval,
            settings.command_error_backoff,
            shutdown.clone(),
        ),
    );

    tasks.spawn(
        "self-ping",
        run_self_ping(
            http.clone(),
            settings.public_url.clone(),
            settings.self_ping_interval,
            shutdown.clone(),
        ),
    );

    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("shutdown requested");
        signal_token.cancel();
    });

    let addr = SocketAddr::from((settings.host.parse::<IpAddr>()?, settings.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", addr);

    let server_token = shutdown.clone();
    axum::serve(listener, routes::app(state))
        .with_graceful_shutdown(async move { server_token.cancelled().await })
        .await?;

    shutdown.cancel();
    tasks.join_all().await;
    tracing::info!("bye");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "ctrl-c handler failed");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler failed");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
