use std::sync::Arc;

use crate::models::Notification;
use crate::services::access::AccessControl;
use crate::services::telegram::Messenger;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub denied: usize,
    pub failed: usize,
}

/// Delivers notifications, skipping users the access gate rejects.
/// Delivery is best-effort: failures are logged, never retried.
#[derive(Clone)]
pub struct Dispatcher {
    messenger: Arc<dyn Messenger>,
    access: AccessControl,
}

impl Dispatcher {
    pub fn new(messenger: Arc<dyn Messenger>, access: AccessControl) -> Self {
        Self { messenger, access }
    }

    pub async fn dispatch(&self, notifications: Vec<Notification>) -> DispatchReport {
        let mut report = DispatchReport::default();

        for n in notifications {
            if !self.access.is_allowed(n.user_id) {
                tracing::info!(user_id = n.user_id, "notification suppressed, user not allowed");
                report.denied += 1;
                continue;
            }

            match self.messenger.send(n.user_id, &n.text).await {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    tracing::error!(user_id = n.user_id, error = %e, "notification send failed");
                    report.failed += 1;
                }
            }
        }

        report
    }
}
