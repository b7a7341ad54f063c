/*
 * Responsibility
 * - Authorization set の管理 handler (add / remove / replace / list / sync)
 * - Every write is applied to the store before the response is sent, so the
 *   next gateway request already sees it
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    api::v1::dto::users::{ReplaceUsersRequest, SyncResponse, UsersResponse, validate_uid},
    error::AppError,
    services::authz,
    state::AppState,
};

pub async fn list_users(State(state): State<AppState>) -> Json<UsersResponse> {
    let mut users: Vec<String> = state.authz.snapshot().iter().cloned().collect();
    users.sort();

    Json(UsersResponse { users })
}

pub async fn add_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<StatusCode, AppError> {
    validate_uid(&uid).map_err(|msg| AppError::bad_request("INVALID_UID", msg))?;

    if state.authz.add(uid.clone()) {
        tracing::info!(uid = %uid, "user added to authorization set");
        Ok(StatusCode::CREATED)
    } else {
        Ok(StatusCode::OK)
    }
}

pub async fn remove_user(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<StatusCode, AppError> {
    if state.authz.remove(&uid) {
        tracing::info!(uid = %uid, "user removed from authorization set");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::not_found("user"))
    }
}

pub async fn replace_users(
    State(state): State<AppState>,
    Json(req): Json<ReplaceUsersRequest>,
) -> Result<Json<SyncResponse>, AppError> {
    req.validate()
        .map_err(|msg| AppError::bad_request("INVALID_UID", msg))?;

    state.authz.sync(req.users);
    let users = state.authz.len();
    tracing::info!(users, "authorization set replaced");

    Ok(Json(SyncResponse { users }))
}

pub async fn sync_users(State(state): State<AppState>) -> Result<Json<SyncResponse>, AppError> {
    let users = authz::sync_once(state.identity.as_ref(), &state.authz)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "on-demand authorization sync failed");
            AppError::from(err)
        })?;

    Ok(Json(SyncResponse { users }))
}
