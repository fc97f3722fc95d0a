use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Router};

use crate::main_lib::AppState;

#[utoipa::path(get, path = "/api/v1/healthz", responses((status = 200, description = "Health")))]
pub async fn healthz() -> &'static str {
    "ok"
}

/// Ready once the settings store answers queries.
#[utoipa::path(
    get,
    path = "/api/v1/readyz",
    responses(
        (status = 200, description = "Ready"),
        (status = 503, description = "Settings store unavailable")
    )
)]
pub async fn readyz(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    match state.settings_service.list_account_ids() {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!("Readiness check failed for {}: {}", state.db_path, e);
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
}
