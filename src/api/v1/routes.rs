/*
 * Responsibility
 * - Admin API v1 の URL 構造
 * - /users: list / full replace, /users/{uid}: add / remove, /users/sync: pull from IAM
 * - Served on the admin listener only; no token auth here
 */
use axum::{
    Router,
    routing::{post, put},
};

use crate::state::AppState;

use crate::api::v1::handlers::users::{add_user, list_users, remove_user, replace_users, sync_users};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", put(replace_users).get(list_users))
        .route("/users/sync", post(sync_users))
        .route("/users/{uid}", put(add_user).delete(remove_user))
}
