/*
 * Responsibility
 * - GET /health (疎通用)
 * - Reports the size of the authorization set alongside the status
 */
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({"status": "ok", "users": state.authz.len()})),
    )
}
