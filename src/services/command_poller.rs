use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::services::commands::CommandHandler;
use crate::services::supervisor::contain;
use crate::services::telegram::Messenger;

/// Pulls pending updates and feeds them to the menu handler, tracking the
/// update cursor so each update is seen once.
pub struct CommandPoller {
    messenger: Arc<dyn Messenger>,
    handler: Arc<CommandHandler>,
    offset: Option<i64>,
}

impl CommandPoller {
    pub fn new(messenger: Arc<dyn Messenger>, handler: Arc<CommandHandler>) -> Self {
        Self {
            messenger,
            handler,
            offset: None,
        }
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// One poll. A failing update is logged and skipped; the cursor still
    /// moves past it.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let updates = self.messenger.poll_updates(self.offset).await?;

        for update in &updates {
            if let Err(e) = self.handler.handle(update).await {
                tracing::warn!(update_id = update.update_id, error = %e, "update handling failed");
            }
            let next = update.update_id + 1;
            if self.offset.is_none_or(|o| next > o) {
                self.offset = Some(next);
            }
        }

        Ok(updates.len())
    }
}

/// Command-poll loop. Sleeps `interval` after a good poll and `backoff`
/// after a failed one.
pub async fn run_command_poller(
    mut poller: CommandPoller,
    interval: Duration,
    backoff: Duration,
    shutdown: CancellationToken,
) {
    let mut delay = Duration::ZERO;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::time::sleep(delay) => {}
        }

        delay = match contain(poller.poll_once()).await {
            Ok(_) => interval,
            Err(e) => {
                tracing::error!(error = %e, "[command-poller] tick error");
                backoff
            }
        };
    }

    tracing::info!("command poller stopped");
}
