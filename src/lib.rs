//! Library entrypoint for RateWatch.
//!
//! Everything the binary wires together lives here so integration tests
//! under `tests/` can build an `AppState` and drive the loops directly.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub mod controllers;
pub mod routes;

use models::Catalog;
use services::access::AccessControl;
use services::aggregator::RateAggregator;
use services::alert_store::AlertStore;
use services::dispatch::Dispatcher;
use services::telegram::Messenger;

/// Shared handles, injected into the loops and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub settings: config::Settings,
    pub catalog: Arc<Catalog>,
    pub store: Arc<AlertStore>,
    pub aggregator: Arc<RateAggregator>,
    pub messenger: Arc<dyn Messenger>,
    pub access: AccessControl,
    pub dispatcher: Dispatcher,
}

impl AppState {
    pub fn new(
        settings: config::Settings,
        catalog: Arc<Catalog>,
        store: Arc<AlertStore>,
        aggregator: Arc<RateAggregator>,
        messenger: Arc<dyn Messenger>,
    ) -> Self {
        let access = AccessControl::from_settings(&settings);
        let dispatcher = Dispatcher::new(messenger.clone(), access.clone());

        Self {
            settings,
            catalog,
            store,
            aggregator,
            messenger,
            access,
            dispatcher,
        }
    }
}
