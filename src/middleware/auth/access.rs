//! `Authorization: token=<jwt>` を検証 → AuthCtx を extensions に入れる
//!
//! Every request on the gateway listener passes through here before the
//! proxy handler. A denied request is answered with a bare 401 right here,
//! so it never reaches route selection or any upstream.

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::extractors::AuthCtx;
use crate::error::AppError;
use crate::state::AppState;

/// Puts authentication in front of every route (and fallback) of `router`.
///
/// ```ignore
/// let gateway = Router::new().fallback(proxy::forward);
/// let gateway = middleware::auth::access::apply(gateway, state.clone());
/// ```
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    // axum 0.8 の from_fn は State extractor を受け取れないため、`from_fn_with_state` で明示的に state を渡す
    router.layer(middleware::from_fn_with_state(state, access_middleware))
}

async fn access_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    // A header that is not valid UTF-8 is treated like a missing one.
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    // The authenticator writes the audit record; nothing more to log here.
    let result = state
        .authenticator
        .authenticate(auth)
        .map_err(|_| AppError::Unauthorized)?;

    // middleware → extractor への受け渡し
    req.extensions_mut().insert(AuthCtx::new(result.uid));

    Ok(next.run(req).await)
}
