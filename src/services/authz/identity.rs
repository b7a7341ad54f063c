//! Identity service client and the sync loop that feeds [`AuthzStore`].
//!
//! The identity service is the source of truth for who may use the
//! gateway. A successful pull replaces the store contents; a failed pull
//! leaves the store untouched and is retried only at the next tick.
//! A pull that was in flight while the store was written to is dropped
//! as stale: it must not bring back a user removed after it started.
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

use super::store::AuthzStore;

pub const USERS_PATH: &str = "/acs/api/v1/users";

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("identity service request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("identity service returned {0}")]
    Status(reqwest::StatusCode),
    #[error("invalid identity service url: {0}")]
    InvalidUrl(String),
    #[error("authorization set changed while the user list was being fetched")]
    Stale,
}

/// Read side of the identity service.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    // Name used in logs.
    fn name(&self) -> &str;

    // Full list of UIDs currently known to the identity service.
    async fn list_users(&self) -> Result<HashSet<String>, IdentityError>;
}

#[derive(Debug, Deserialize)]
struct UserList {
    #[serde(default)]
    array: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    uid: String,
}

/// HTTP client for the IAM `users` collection.
#[derive(Debug, Clone)]
pub struct IamClient {
    client: reqwest::Client,
    users_url: Url,
}

impl IamClient {
    pub fn new(base: &Url, timeout: Duration) -> Result<Self, IdentityError> {
        let users_url = base
            .join(USERS_PATH)
            .map_err(|_| IdentityError::InvalidUrl(base.to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .no_proxy()
            .build()?;

        Ok(Self { client, users_url })
    }
}

#[async_trait]
impl IdentitySource for IamClient {
    fn name(&self) -> &str {
        self.users_url.as_str()
    }

    async fn list_users(&self) -> Result<HashSet<String>, IdentityError> {
        let resp = self.client.get(self.users_url.clone()).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(IdentityError::Status(status));
        }

        let body: UserList = resp.json().await?;
        Ok(body
            .array
            .into_iter()
            .map(|u| u.uid)
            .filter(|uid| !uid.trim().is_empty())
            .collect())
    }
}

/// Pulls the user list once and applies it. Returns the new set size.
pub async fn sync_once(
    source: &dyn IdentitySource,
    store: &AuthzStore,
) -> Result<usize, IdentityError> {
    let seen = store.generation();
    let users = source.list_users().await?;
    let count = users.len();
    if !store.sync_if_unchanged(seen, users) {
        return Err(IdentityError::Stale);
    }

    tracing::info!(source = source.name(), users = count, "authorization set synced");
    Ok(count)
}

/// Spawns the periodic sync. The first pull happens after one `interval`;
/// callers run [`sync_once`] themselves at startup.
pub fn spawn_periodic_sync(
    source: Arc<dyn IdentitySource>,
    store: Arc<AuthzStore>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match sync_once(source.as_ref(), &store).await {
                Ok(_) => {}
                Err(IdentityError::Stale) => tracing::info!(
                    source = source.name(),
                    "authorization sync skipped; set changed meanwhile"
                ),
                Err(err) => tracing::warn!(
                    source = source.name(),
                    error = %err,
                    "authorization sync failed; keeping previous set"
                ),
            }
        }
    })
}
