use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::{self, Instant};

/// Fixed-gap request spacer for providers with tight rate limits.
///
/// `acquire` returns immediately for the first caller and otherwise waits
/// until `gap` has passed since the previous permit. Built on `tokio::time`
/// so a paused test clock drives it without wall-clock waits.
#[derive(Debug)]
pub struct Throttle {
    gap: Duration,
    last: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(gap: Duration) -> Self {
        Self {
            gap,
            last: Mutex::new(None),
        }
    }

    pub fn gap(&self) -> Duration {
        self.gap
    }

    pub async fn acquire(&self) {
        let mut last = self.last.lock().await;
        if let Some(prev) = *last {
            time::sleep_until(prev + self.gap).await;
        }
        *last = Some(Instant::now());
    }
}
