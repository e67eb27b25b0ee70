use axum::{extract::State, http::StatusCode, response::IntoResponse};

use crate::AppState;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

pub async fn health_store(State(state): State<AppState>) -> impl IntoResponse {
    let book = state.store.read().await;
    let alerts: usize = book.values().map(Vec::len).sum();
    (StatusCode::OK, format!("store: ok ({} users, {} alerts)", book.len(), alerts))
}
