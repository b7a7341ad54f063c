//! Forwards an authorized request to the selected upstream and relays the
//! upstream response.
//!
//! - no retries, no redirect following
//! - bounded by the client timeout (timeout → 504, connect failure → 502)
//! - the client's HTTP/1.x version is reused for the upstream request;
//!   HTTP/2 clients are forwarded over HTTP/1.1
use std::error::Error as _;
use std::net::IpAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, Response, Version, header};
use http_body_util::LengthLimitError;
use thiserror::Error;

use super::routes::RouteMatch;

pub const X_FORWARDED_FOR: HeaderName = HeaderName::from_static("x-forwarded-for");
pub const X_FORWARDED_PROTO: HeaderName = HeaderName::from_static("x-forwarded-proto");
pub const X_REAL_IP: HeaderName = HeaderName::from_static("x-real-ip");

// Connection-scoped headers that must not cross the proxy.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("failed to read request body: {0}")]
    RequestBody(axum::Error),
    #[error("request body exceeds the configured limit")]
    PayloadTooLarge,
    #[error("upstream timed out")]
    Timeout,
    #[error("upstream unavailable: {0}")]
    Unavailable(#[source] reqwest::Error),
    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Unavailable(e)
        }
    }
}

/// Facts about the inbound connection that end up in the forwarding headers.
#[derive(Debug, Clone)]
pub struct ForwardContext {
    pub client_ip: IpAddr,
    pub scheme: String,
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    client: reqwest::Client,
}

impl Dispatcher {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .tcp_keepalive(Duration::from_secs(30))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()?;

        Ok(Self { client })
    }

    pub async fn forward(
        &self,
        route: &RouteMatch<'_>,
        request: Request<Body>,
        ctx: &ForwardContext,
    ) -> Result<Response<Body>, UpstreamError> {
        let target = route.target_url(request.uri().query());

        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX)
            .await
            .map_err(|e| {
                if is_length_limit(&e) {
                    UpstreamError::PayloadTooLarge
                } else {
                    UpstreamError::RequestBody(e)
                }
            })?;

        let headers = forwarded_headers(&parts.headers, ctx);

        tracing::debug!(
            method = %parts.method,
            version = ?parts.version,
            upstream = %target,
            "forwarding request"
        );

        let upstream = self
            .client
            .request(parts.method, target)
            .version(upstream_version(parts.version))
            .headers(headers)
            .body(body)
            .send()
            .await?;

        let status = upstream.status();
        let response_headers = strip_hop_by_hop(upstream.headers());
        let bytes = upstream.bytes().await?;

        let mut response = Response::builder()
            .status(status)
            .body(Body::from(bytes))
            .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;
        *response.headers_mut() = response_headers;

        Ok(response)
    }
}

/// The upstream client speaks HTTP/1.x only. HTTP/1.0 is kept so the
/// upstream sees what the client sent; anything else goes out as HTTP/1.1.
pub fn upstream_version(inbound: Version) -> Version {
    if inbound == Version::HTTP_10 {
        Version::HTTP_10
    } else {
        Version::HTTP_11
    }
}

// A streamed body that overruns `RequestBodyLimitLayer` surfaces as a
// `LengthLimitError` somewhere in the source chain.
fn is_length_limit(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}

/// Copies the end-to-end request headers and sets the forwarding headers,
/// replacing any values the client supplied for them.
pub fn forwarded_headers(inbound: &HeaderMap, ctx: &ForwardContext) -> HeaderMap {
    let mut headers = strip_hop_by_hop(inbound);
    headers.remove(header::HOST);
    headers.remove(header::CONTENT_LENGTH);

    let ip = HeaderValue::from_str(&ctx.client_ip.to_string())
        .unwrap_or_else(|_| HeaderValue::from_static("unknown"));
    let proto = HeaderValue::from_str(&ctx.scheme)
        .unwrap_or_else(|_| HeaderValue::from_static("http"));

    headers.insert(X_FORWARDED_FOR, ip.clone());
    headers.insert(X_REAL_IP, ip);
    headers.insert(X_FORWARDED_PROTO, proto);

    headers
}

fn strip_hop_by_hop(source: &HeaderMap) -> HeaderMap {
    // Headers named in `Connection` are hop-by-hop as well.
    let listed: Vec<String> = source
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut headers = HeaderMap::with_capacity(source.len());
    for (name, value) in source {
        let name_str = name.as_str();
        if HOP_BY_HOP.contains(&name_str) || listed.iter().any(|l| l == name_str) {
            continue;
        }
        headers.append(name.clone(), value.clone());
    }
    headers
}
