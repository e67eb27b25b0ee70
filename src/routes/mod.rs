use axum::Router;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub mod health_routes;

pub fn app(state: AppState) -> Router {
    let router = Router::<AppState>::new();

    let router = health_routes::add_routes(router);

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
