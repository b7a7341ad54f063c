/*
 * Responsibility
 * - Router 組み立て (gateway / admin)
 *   - gateway: every path and method → auth middleware → proxy handler
 *   - admin: /health + /api/v1 authorization set management
 */
use axum::{Router, routing::get};

use crate::middleware;
use crate::state::AppState;

pub mod extractors;
pub mod proxy;
pub mod v1;

/// Router for the public gateway listener.
///
/// Must be served with `into_make_service_with_connect_info::<SocketAddr>()`;
/// the client address feeds `X-Forwarded-For` / `X-Real-IP`.
pub fn gateway_router(state: AppState, body_limit: usize) -> Router {
    let router = Router::new().fallback(proxy::forward);
    let router = middleware::auth::access::apply(router, state.clone());

    middleware::http::apply(router.with_state(state), body_limit)
}

/// Router for the administrative listener.
pub fn admin_router(state: AppState, body_limit: usize) -> Router {
    let router = Router::new()
        .route("/health", get(v1::handlers::health::health))
        .nest("/api/v1", v1::routes())
        .with_state(state);

    middleware::http::apply(router, body_limit)
}
