use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio::task::JoinHandle;

use crate::error::{BotError, Result};

/// Runs one loop body, turning a panic into an error so the loop survives.
pub async fn contain<F, T>(tick: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match AssertUnwindSafe(tick).catch_unwind().await {
        Ok(res) => res,
        Err(payload) => Err(BotError::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Named long-lived tasks, joined on shutdown.
#[derive(Default)]
pub struct TaskSupervisor {
    tasks: Vec<(String, JoinHandle<()>)>,
}

impl TaskSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&mut self, name: impl Into<String>, future: F) -> &mut Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        tracing::info!(task = %name, "spawned background task");
        self.tasks.push((name, tokio::spawn(future)));
        self
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every task to finish (they exit once cancelled).
    pub async fn join_all(self) {
        for (name, handle) in self.tasks {
            match handle.await {
                Ok(()) => tracing::info!(task = %name, "task stopped"),
                Err(e) => tracing::error!(task = %name, error = %e, "task ended abnormally"),
            }
        }
    }
}
