use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::get,
    Json, Router,
};

use crate::{error::ApiResult, main_lib::AppState, models::AccountSettingsResponse};

#[utoipa::path(
    get,
    path = "/api/v1/settings",
    responses((status = 200, description = "Accounts with saved settings", body = [String]))
)]
pub async fn list_accounts(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(state.settings_service.list_account_ids()?))
}

#[utoipa::path(
    get,
    path = "/api/v1/settings/{account_id}",
    params(("account_id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, body = AccountSettingsResponse),
        (status = 404, description = "No settings saved for this account")
    )
)]
pub async fn get_account_settings(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> ApiResult<Json<AccountSettingsResponse>> {
    let settings = state.settings_service.get_account_settings(&account_id)?;
    Ok(Json(settings.into()))
}

/// Replaces the saved blob. The body is stored verbatim.
#[utoipa::path(
    put,
    path = "/api/v1/settings/{account_id}",
    request_body = serde_json::Value,
    params(("account_id" = String, Path, description = "Account identifier")),
    responses((status = 200, body = AccountSettingsResponse))
)]
pub async fn save_account_settings(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
    payload: Result<Json<serde_json::Value>, JsonRejection>,
) -> ApiResult<Json<AccountSettingsResponse>> {
    let Json(settings) = payload?;
    let saved = state
        .settings_service
        .save_settings(&account_id, settings)
        .await?;
    Ok(Json(saved.into()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/settings", get(list_accounts))
        .route(
            "/settings/{account_id}",
            get(get_account_settings).put(save_account_settings),
        )
}
