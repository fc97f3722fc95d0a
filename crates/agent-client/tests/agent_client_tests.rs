//! Drives `AgentApiClient` against an in-process fake agent.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use botpilot_agent_client::AgentApiClient;
use botpilot_core::automation::{WorkerAdapter, WorkerError, WorkerOutcome, WorkerProgress};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct RecordingProgress {
    waiting: Mutex<Vec<Option<String>>>,
}

impl WorkerProgress for RecordingProgress {
    fn waiting(&self, message: Option<String>) {
        self.waiting.lock().unwrap().push(message);
    }
}

#[derive(Clone, Default)]
struct FakeAgent {
    submitted: Arc<Mutex<Vec<serde_json::Value>>>,
    polls: Arc<AtomicUsize>,
    script: Arc<Vec<serde_json::Value>>,
}

async fn submit(
    State(agent): State<FakeAgent>,
    Json(body): Json<serde_json::Value>,
) -> Json<serde_json::Value> {
    agent.submitted.lock().unwrap().push(body);
    Json(serde_json::json!({ "status": "waiting", "message": "solve captcha" }))
}

async fn poll(
    State(agent): State<FakeAgent>,
    Path(account_id): Path<String>,
) -> (StatusCode, Json<serde_json::Value>) {
    assert_eq!(account_id, "acc1");
    let n = agent.polls.fetch_add(1, Ordering::SeqCst);
    match agent.script.get(n) {
        Some(step) => (StatusCode::OK, Json(step.clone())),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": "script exhausted" })),
        ),
    }
}

async fn spawn_agent(script: Vec<serde_json::Value>) -> (String, FakeAgent) {
    let agent = FakeAgent {
        script: Arc::new(script),
        ..FakeAgent::default()
    };
    let app = Router::new()
        .route("/api/apply", post(submit))
        .route("/api/apply/{account_id}", get(poll))
        .with_state(agent.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{}", addr), agent)
}

#[tokio::test]
async fn polls_until_completed_and_reports_waiting() {
    let (url, agent) = spawn_agent(vec![
        serde_json::json!({ "status": "running" }),
        serde_json::json!({ "status": "waiting", "message": "still on captcha" }),
        serde_json::json!({ "status": "completed", "message": "applied" }),
    ])
    .await;
    let client = AgentApiClient::new(&url, Duration::from_millis(10)).unwrap();
    let progress = Arc::new(RecordingProgress::default());

    let settings = serde_json::json!({ "farm": { "enabled": true } });
    let outcome = client
        .run("acc1", settings.clone(), progress.clone())
        .await
        .unwrap();

    assert_eq!(
        outcome,
        WorkerOutcome::Completed {
            message: Some("applied".to_string())
        }
    );
    assert_eq!(
        *progress.waiting.lock().unwrap(),
        vec![
            Some("solve captcha".to_string()),
            Some("still on captcha".to_string())
        ]
    );
    assert_eq!(agent.polls.load(Ordering::SeqCst), 3);
    assert_eq!(
        agent.submitted.lock().unwrap()[0],
        serde_json::json!({ "accountId": "acc1", "settings": settings })
    );
}

#[tokio::test]
async fn agent_error_status_is_a_failed_outcome() {
    let (url, _agent) = spawn_agent(vec![
        serde_json::json!({ "status": "error", "message": "account locked" }),
    ])
    .await;
    let client = AgentApiClient::new(&url, Duration::from_millis(10)).unwrap();

    let outcome = client
        .run("acc1", serde_json::json!({}), Arc::new(RecordingProgress::default()))
        .await
        .unwrap();
    assert_eq!(
        outcome,
        WorkerOutcome::Failed {
            message: "account locked".to_string()
        }
    );
}

#[tokio::test]
async fn http_failure_is_a_transport_error() {
    let (url, _agent) = spawn_agent(Vec::new()).await;
    let client = AgentApiClient::new(&url, Duration::from_millis(10)).unwrap();

    let err = client
        .run("acc1", serde_json::json!({}), Arc::new(RecordingProgress::default()))
        .await
        .unwrap_err();
    match err {
        WorkerError::Transport(message) => assert!(message.contains("script exhausted")),
        other => panic!("expected transport error, got {other:?}"),
    }
}

#[tokio::test]
async fn unreachable_agent_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let client = AgentApiClient::new(&url, Duration::from_millis(10)).unwrap();
    let err = client
        .run("acc1", serde_json::json!({}), Arc::new(RecordingProgress::default()))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Transport(_)));
}
