/*
 * Responsibility
 * - Gateway fallback handler: every authenticated request lands here
 * - Route selection by path prefix (404 when nothing matches)
 * - Hand-off to the dispatcher; upstream failures become 502 / 504
 *
 * AuthCtxExtractor makes the handler refuse to run without the access
 * middleware in front of it.
 */
use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    response::Response,
};

use crate::api::extractors::AuthCtxExtractor;
use crate::error::AppError;
use crate::services::upstream::ForwardContext;
use crate::state::AppState;

#[tracing::instrument(
    name = "proxy",
    skip_all,
    fields(uid = %auth.0.uid, method = %req.method(), path = %req.uri().path())
)]
pub async fn forward(
    State(state): State<AppState>,
    ConnectInfo(client): ConnectInfo<SocketAddr>,
    auth: AuthCtxExtractor,
    req: Request<Body>,
) -> Result<Response, AppError> {
    let Some(route) = state.routes.route(req.uri().path()) else {
        tracing::debug!("no upstream route");
        return Err(AppError::not_found("route"));
    };

    let ctx = ForwardContext {
        client_ip: client.ip().to_canonical(),
        scheme: req.uri().scheme_str().unwrap_or("http").to_string(),
    };

    state
        .dispatcher
        .forward(&route, req, &ctx)
        .await
        .map_err(|err| {
            tracing::warn!(
                upstream = %route.route.upstream(),
                error = %err,
                "upstream request failed"
            );
            AppError::from(err)
        })
}
