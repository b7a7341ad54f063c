//! Shared fixtures for the integration tests.
//!
//! - an echo upstream that reflects what it received as JSON
//! - a fake IAM serving `/acs/api/v1/users`
//! - a gateway + admin pair bound to ephemeral loopback ports
#![allow(dead_code)]

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use admin_gateway::api;
use admin_gateway::config::TokenKeyConfig;
use admin_gateway::services::audit::MemoryAuditSink;
use admin_gateway::services::auth::{Authenticator, TokenVerifier};
use admin_gateway::services::authz::{AuthzStore, IamClient, IdentitySource};
use admin_gateway::services::upstream::{Dispatcher, RouteTable, UpstreamRoute};
use admin_gateway::state::AppState;
use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde_json::{Value, json};

pub const SECRET: &str = "integration-secret";

pub fn token_for(uid: &str) -> String {
    sign(uid, SECRET)
}

pub fn sign(uid: &str, secret: &str) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({ "uid": uid, "exp": jsonwebtoken::get_current_timestamp() + 3600 }),
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn auth_header(uid: &str) -> String {
    format!("token={}", token_for(uid))
}

/// Client that never follows redirects and never reuses connections.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap()
}

// ── Echo upstream ────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Echo {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl Echo {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
struct EchoState {
    endpoint_id: String,
    hits: Arc<AtomicUsize>,
}

async fn echo(State(state): State<EchoState>, req: Request<Body>) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);

    if req.uri().path() == "/redirect" {
        return (
            StatusCode::TEMPORARY_REDIRECT,
            [(header::LOCATION, "/somewhere-else")],
        )
            .into_response();
    }
    if req.uri().path() == "/teapot" {
        return (StatusCode::IM_A_TEAPOT, "short and stout").into_response();
    }
    if req.uri().path() == "/slow" {
        tokio::time::sleep(Duration::from_secs(5)).await;
    }

    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), v.to_str().unwrap_or("").to_string()))
        .collect();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let query = req.uri().query().map(str::to_string);
    let version = format!("{:?}", req.version());
    let body = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .unwrap();

    Json(json!({
        "endpoint_id": state.endpoint_id,
        "method": method,
        "path": path,
        "query": query,
        "request_version": version,
        "headers": headers,
        "body": String::from_utf8_lossy(&body),
    }))
    .into_response()
}

pub async fn spawn_echo() -> Echo {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new().fallback(echo).with_state(EchoState {
        endpoint_id: format!("http://{}", addr),
        hits: hits.clone(),
    });
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    Echo { addr, hits }
}

/// All values of header `name` in an echo response (case-insensitive).
pub fn header_values(echoed: &Value, name: &str) -> Vec<String> {
    echoed["headers"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|pair| pair[0].as_str().unwrap().eq_ignore_ascii_case(name))
        .map(|pair| pair[1].as_str().unwrap().to_string())
        .collect()
}

// ── Fake IAM ─────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct FakeIam {
    pub addr: SocketAddr,
    users: Arc<Mutex<Vec<String>>>,
}

impl FakeIam {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Handle for an address with no server behind it.
    pub fn unreachable(addr: SocketAddr) -> Self {
        Self {
            addr,
            users: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn set_users(&self, users: &[&str]) {
        *self.users.lock().unwrap() = users.iter().map(|u| u.to_string()).collect();
    }
}

async fn iam_users(State(users): State<Arc<Mutex<Vec<String>>>>) -> Json<Value> {
    let array: Vec<Value> = users
        .lock()
        .unwrap()
        .iter()
        .map(|uid| json!({ "uid": uid, "description": "user", "is_remote": false }))
        .collect();
    Json(json!({ "array": array }))
}

pub async fn spawn_fake_iam(users: &[&str]) -> FakeIam {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let users = Arc::new(Mutex::new(users.iter().map(|u| u.to_string()).collect()));

    let app = Router::new()
        .route("/acs/api/v1/users", get(iam_users))
        .with_state(users.clone());
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    FakeIam { addr, users }
}

/// Identity source with a fixed user list.
pub struct StaticIdentity(pub Vec<String>);

#[async_trait::async_trait]
impl IdentitySource for StaticIdentity {
    fn name(&self) -> &str {
        "static"
    }

    async fn list_users(
        &self,
    ) -> Result<HashSet<String>, admin_gateway::services::authz::IdentityError> {
        Ok(self.0.iter().cloned().collect())
    }
}

// ── Gateway ──────────────────────────────────────────────────────────────────

pub struct Gateway {
    pub addr: SocketAddr,
    pub admin_addr: SocketAddr,
    pub store: Arc<AuthzStore>,
    pub audit: Arc<MemoryAuditSink>,
}

impl Gateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn admin_url(&self, path: &str) -> String {
        format!("http://{}{}", self.admin_addr, path)
    }
}

pub struct GatewayOptions {
    pub routes: Vec<(String, String)>,
    pub users: Vec<String>,
    pub identity: Option<Arc<dyn IdentitySource>>,
    pub upstream_timeout: Duration,
}

impl GatewayOptions {
    pub fn new(routes: &[(&str, String)]) -> Self {
        Self {
            routes: routes
                .iter()
                .map(|(p, u)| (p.to_string(), u.clone()))
                .collect(),
            users: Vec::new(),
            identity: None,
            upstream_timeout: Duration::from_secs(5),
        }
    }

    pub fn users(mut self, users: &[&str]) -> Self {
        self.users = users.iter().map(|u| u.to_string()).collect();
        self
    }

    pub fn iam(mut self, iam: &FakeIam) -> Self {
        let base = url::Url::parse(&iam.base_url()).unwrap();
        let client = IamClient::new(&base, Duration::from_secs(2)).unwrap();
        self.identity = Some(Arc::new(client) as Arc<dyn IdentitySource>);
        self
    }

    pub fn upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }
}

pub async fn spawn_gateway(opts: GatewayOptions) -> Gateway {
    let verifier = TokenVerifier::new(&TokenKeyConfig {
        algorithm: Algorithm::HS256,
        key: SECRET.to_string(),
        leeway_seconds: 0,
    })
    .unwrap();
    let store = Arc::new(AuthzStore::with_users(opts.users));
    let audit = Arc::new(MemoryAuditSink::new());
    let authenticator = Arc::new(Authenticator::new(verifier, store.clone(), audit.clone()));

    let routes = RouteTable::new(
        opts.routes
            .iter()
            .map(|(p, u)| UpstreamRoute::new(p, u).unwrap())
            .collect(),
    );
    let dispatcher = Dispatcher::new(opts.upstream_timeout).unwrap();
    let identity = opts
        .identity
        .unwrap_or_else(|| Arc::new(StaticIdentity(Vec::new())) as Arc<dyn IdentitySource>);

    let state = AppState::new(
        authenticator,
        Arc::new(routes),
        Arc::new(dispatcher),
        identity,
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let gateway = api::gateway_router(state.clone(), 1024 * 1024);
    tokio::spawn(async move {
        axum::serve(
            listener,
            gateway.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap()
    });

    let admin_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let admin_addr = admin_listener.local_addr().unwrap();
    let admin = api::admin_router(state, 1024 * 1024);
    tokio::spawn(async move { axum::serve(admin_listener, admin).await.unwrap() });

    Gateway {
        addr,
        admin_addr,
        store,
        audit,
    }
}
