use std::sync::Arc;

use axum::{routing::get, Json, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{config::Config, main_lib::AppState, models};

pub mod automation;
pub mod health;
pub mod settings;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        health::readyz,
        automation::apply_changes,
        automation::get_queue_status,
        automation::get_cooldown,
        automation::stream_events,
        settings::list_accounts,
        settings::get_account_settings,
        settings::save_account_settings,
    ),
    components(schemas(
        models::ApplyChangesRequest,
        models::ApplyChangesResponse,
        models::QueueStatusResponse,
        models::CooldownResponse,
        models::AccountSettingsResponse,
    )),
    tags((name = "botpilot"))
)]
pub struct ApiDoc;

pub fn app_router(state: Arc<AppState>, config: &Config) -> Router {
    let cors = if config.cors_allow.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins = config
            .cors_allow
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin {}", o);
                    None
                }
            })
            .collect::<Vec<_>>();
        CorsLayer::new().allow_origin(origins)
    };

    let openapi = ApiDoc::openapi();

    let api = Router::new()
        .merge(health::router())
        .merge(automation::router())
        .merge(settings::router());

    Router::new()
        .nest("/api/v1", api)
        .route("/openapi.json", get(|| async { Json(openapi) }))
        .with_state(state)
        .layer(cors)
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
}
