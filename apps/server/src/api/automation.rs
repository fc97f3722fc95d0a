use std::{convert::Infallible, sync::Arc, time::Duration};

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    response::sse::{Event as SseEvent, KeepAlive, Sse},
    routing::{get, post},
    Json, Router,
};
use botpilot_core::automation::{validate_account_id, StatusEvent};
use botpilot_core::errors::Error as CoreError;
use futures::stream::{self, Stream, StreamExt};

use crate::{
    error::ApiResult,
    events::to_sse_event,
    main_lib::AppState,
    models::{
        AccountQuery, ApplyChangesRequest, ApplyChangesResponse, CooldownResponse,
        QueueStatusResponse,
    },
};

/// Queue an apply for the account. Returns as soon as the job is accepted.
#[utoipa::path(
    post,
    path = "/api/v1/automation/apply-changes",
    request_body = ApplyChangesRequest,
    responses(
        (status = 200, body = ApplyChangesResponse),
        (status = 400, description = "Malformed body or account id"),
        (status = 404, description = "Unknown account"),
        (status = 409, description = "Already queued or running"),
        (status = 429, description = "Cooldown active"),
        (status = 503, description = "Queue not running")
    )
)]
pub async fn apply_changes(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ApplyChangesRequest>, JsonRejection>,
) -> ApiResult<Json<ApplyChangesResponse>> {
    let Json(body) = payload?;
    let receipt = state
        .automation_service
        .apply_changes(&body.account_id)
        .await?;
    Ok(Json(receipt.into()))
}

#[utoipa::path(
    get,
    path = "/api/v1/automation/queue",
    params(AccountQuery),
    responses((status = 200, body = QueueStatusResponse))
)]
pub async fn get_queue_status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccountQuery>,
) -> ApiResult<Json<QueueStatusResponse>> {
    let snapshot = state.automation_service.queue_snapshot().await?;
    Ok(Json(QueueStatusResponse::new(
        snapshot,
        query.account_id.as_deref(),
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/automation/cooldown/{account_id}",
    params(("account_id" = String, Path, description = "Account identifier")),
    responses((status = 200, body = CooldownResponse))
)]
pub async fn get_cooldown(
    State(state): State<Arc<AppState>>,
    Path(account_id): Path<String>,
) -> ApiResult<Json<CooldownResponse>> {
    let status = state.automation_service.cooldown_status(&account_id).await?;
    Ok(Json(status.into()))
}

/// Server-sent `queue-status` and `automation-status` events.
///
/// The first frame is always the current queue snapshot.
#[utoipa::path(
    get,
    path = "/api/v1/automation/events",
    params(AccountQuery),
    responses((status = 200, description = "text/event-stream of status events"))
)]
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccountQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>> {
    if let Some(account_id) = query.account_id.as_deref() {
        validate_account_id(account_id).map_err(CoreError::from)?;
    }

    // Subscribe before taking the snapshot so nothing falls in between.
    let subscription = state
        .automation_service
        .subscribe(query.account_id.as_deref());
    let snapshot = state.automation_service.queue_snapshot().await?;

    let initial = stream::once(async move { StatusEvent::QueueStatus(snapshot) });
    let updates = stream::unfold(subscription, |mut subscription| async move {
        subscription
            .recv()
            .await
            .map(|event| (event, subscription))
    });
    let events = initial
        .chain(updates)
        .filter_map(|event| async move { to_sse_event(&event).map(Ok) });

    Ok(Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/automation/apply-changes", post(apply_changes))
        .route("/automation/queue", get(get_queue_status))
        .route("/automation/cooldown/{account_id}", get(get_cooldown))
        .route("/automation/events", get(stream_events))
}
