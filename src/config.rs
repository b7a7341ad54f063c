/*
 * Responsibility
 * - Load settings from the environment (.env supported via dotenvy)
 * - Validate them up front (missing / malformed values fail startup)
 * - Built-in upstream table used when UPSTREAM_ROUTES is not set
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use url::Url;

use crate::services::upstream::UpstreamRoute;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()))
    }

    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
        }
    }
}

impl std::error::Error for ConfigError {}

pub const DEFAULT_ROUTES: &[(&str, &str)] = &[
    ("/exhibitor", "http://127.0.0.1:8181"),
    ("/acs/api/v1", "http://127.0.0.1:8101"),
    ("/mesos", "http://127.0.0.1:5050"),
    ("/marathon", "http://127.0.0.1:8080"),
    ("/", "http://127.0.0.1:9000"),
];

/// Key material and algorithm used to verify inbound tokens.
#[derive(Clone)]
pub struct TokenKeyConfig {
    pub algorithm: Algorithm,
    /// HMAC secret for HS256, public key PEM otherwise.
    pub key: String,
    pub leeway_seconds: u64,
}

impl fmt::Debug for TokenKeyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenKeyConfig")
            .field("algorithm", &self.algorithm)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,

    pub gateway_addr: SocketAddr,
    pub admin_addr: SocketAddr,

    pub token: TokenKeyConfig,

    pub routes: Vec<UpstreamRoute>,
    pub upstream_timeout: Duration,
    pub request_body_limit: usize,

    pub iam_url: Url,
    pub iam_sync_interval: Option<Duration>,
    pub seed_users: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let app_env = AppEnv::from_env();

        let gateway_addr = parse_addr("GATEWAY_ADDR", "0.0.0.0:8000")?;
        let admin_addr = parse_addr("ADMIN_ADDR", "127.0.0.1:8001")?;

        let algorithm = parse_algorithm(
            &std::env::var("AUTH_JWT_ALGORITHM").unwrap_or_else(|_| "RS256".to_string()),
        )
        .ok_or(ConfigError::Invalid("AUTH_JWT_ALGORITHM"))?;

        let key = std::env::var("AUTH_JWT_KEY")
            .map_err(|_| ConfigError::Missing("AUTH_JWT_KEY"))?
            .replace("\\n", "\n");
        if key.trim().is_empty() {
            return Err(ConfigError::Invalid("AUTH_JWT_KEY"));
        }

        let leeway_seconds = parse_number("AUTH_TOKEN_LEEWAY_SECONDS", 60)?;

        let routes = match std::env::var("UPSTREAM_ROUTES") {
            Ok(raw) if !raw.trim().is_empty() => {
                parse_routes(&raw).ok_or(ConfigError::Invalid("UPSTREAM_ROUTES"))?
            }
            _ => default_routes(),
        };

        let upstream_timeout =
            Duration::from_secs(parse_number("UPSTREAM_TIMEOUT_SECONDS", 30)?);
        if upstream_timeout.is_zero() {
            return Err(ConfigError::Invalid("UPSTREAM_TIMEOUT_SECONDS"));
        }

        let request_body_limit =
            parse_number("REQUEST_BODY_LIMIT_BYTES", 10 * 1024 * 1024)? as usize;

        let iam_url = Url::parse(
            &std::env::var("IAM_URL").unwrap_or_else(|_| "http://127.0.0.1:8101".to_string()),
        )
        .map_err(|_| ConfigError::Invalid("IAM_URL"))?;

        let iam_sync_interval = match parse_number("IAM_SYNC_INTERVAL_SECONDS", 30)? {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let seed_users = split_list(&std::env::var("AUTHZ_SEED_USERS").unwrap_or_default());

        Ok(Self {
            app_env,
            gateway_addr,
            admin_addr,
            token: TokenKeyConfig {
                algorithm,
                key,
                leeway_seconds,
            },
            routes,
            upstream_timeout,
            request_body_limit,
            iam_url,
            iam_sync_interval,
            seed_users,
        })
    }
}

fn parse_addr(key: &'static str, default: &str) -> Result<SocketAddr, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_string());
    SocketAddr::from_str(raw.trim()).map_err(|_| ConfigError::Invalid(key))
}

fn parse_number(key: &'static str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid(key)),
        Err(_) => Ok(default),
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

pub fn parse_algorithm(raw: &str) -> Option<Algorithm> {
    match raw.trim().to_ascii_uppercase().as_str() {
        "HS256" => Some(Algorithm::HS256),
        "RS256" => Some(Algorithm::RS256),
        "ES256" => Some(Algorithm::ES256),
        "EDDSA" => Some(Algorithm::EdDSA),
        _ => None,
    }
}

/// Parses `prefix=url,prefix=url`. Returns `None` if any entry is malformed.
pub fn parse_routes(raw: &str) -> Option<Vec<UpstreamRoute>> {
    let mut routes = Vec::new();
    for entry in split_list(raw) {
        let (prefix, upstream) = entry.split_once('=')?;
        routes.push(UpstreamRoute::new(prefix.trim(), upstream.trim()).ok()?);
    }

    if routes.is_empty() { None } else { Some(routes) }
}

pub fn default_routes() -> Vec<UpstreamRoute> {
    DEFAULT_ROUTES
        .iter()
        .filter_map(|(prefix, upstream)| UpstreamRoute::new(prefix, upstream).ok())
        .collect()
}
