//! HTTP handlers. Every endpoint answers 200 with a result envelope;
//! faults are data, never HTTP errors.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::{models::TaskResult, AppState};

#[derive(Debug, Deserialize)]
pub struct ExecuteTaskRequest {
    task_name: String,
    #[serde(default)]
    params: Value,
}

pub async fn execute_task(
    State(state): State<AppState>,
    Json(req): Json<ExecuteTaskRequest>,
) -> Json<TaskResult> {
    Json(state.dispatcher.execute(&req.task_name, &req.params).await)
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(state.health.check().await)
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<i64>,
}

pub async fn task_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Json<Value> {
    match state.events.recent(query.limit.unwrap_or(100)).await {
        Ok(history) => Json(json!({ "history": history })),
        Err(e) => Json(json!({
            "error": format!("Failed to retrieve task history: {e}")
        })),
    }
}

#[derive(Debug, Deserialize)]
pub struct NotifyRequest {
    message: String,
    channels: Option<Vec<String>>,
}

pub async fn notify(
    State(state): State<AppState>,
    Json(req): Json<NotifyRequest>,
) -> Json<Value> {
    let results = state.notifier.send(&req.message, req.channels).await;
    Json(json!(results))
}

#[derive(Debug, Deserialize)]
pub struct ApiCheckRequest {
    url: String,
}

pub async fn api_check(
    State(state): State<AppState>,
    Json(req): Json<ApiCheckRequest>,
) -> Json<TaskResult> {
    Json(state.scanner.check_api_security(&req.url).await)
}
