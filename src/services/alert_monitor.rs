use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::services::dispatch::DispatchReport;
use crate::services::evaluator::evaluate;
use crate::services::supervisor::contain;
use crate::AppState;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub instruments: usize,
    pub hits: usize,
    pub dispatch: DispatchReport,
}

/// Rate-check loop: collect, evaluate, dispatch, every
/// `rate_check_interval`. A slow tick delays the next one instead of
/// overlapping it, and a failed tick is logged and skipped.
pub async fn run_rate_monitor(state: AppState, shutdown: CancellationToken) {
    let mut interval = time::interval(state.settings.rate_check_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {}
        }

        match contain(run_tick(&state)).await {
            Ok(report) if report.hits > 0 => {
                tracing::info!(hits = report.hits, sent = report.dispatch.sent, "alerts fired");
            }
            Ok(_) => {}
            Err(e) => tracing::error!(error = %e, "[rate-monitor] tick error"),
        }
    }

    tracing::info!("rate monitor stopped");
}

pub async fn run_tick(state: &AppState) -> Result<TickReport> {
    let snapshot = state.aggregator.collect().await;

    // the flag flips are on disk before anyone is told
    let notifications = state
        .store
        .modify(|book| evaluate(&state.catalog, &snapshot, book))
        .await?;

    let hits = notifications.len();
    let dispatch = state.dispatcher.dispatch(notifications).await;

    Ok(TickReport {
        instruments: snapshot.len(),
        hits,
        dispatch,
    })
}
