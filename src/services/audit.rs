//! Authentication decision records.
//!
//! One record per authentication attempt. The rendered message is a stable,
//! greppable line; the UID appears verbatim between backticks so log
//! tooling can match a single user without picking up unrelated lines:
//!
//! ```text
//! auth: UID from valid JWT: `alice`
//! auth: User not found: `mallory`
//! auth: Invalid token
//! auth: Malformed credential
//! ```
use std::fmt;
use std::sync::{Mutex, PoisonError};

pub const AUDIT_TARGET: &str = "admin_gateway::audit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    Valid,
    UserNotFound,
    InvalidToken,
    MalformedCredential,
}

impl AuthOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::UserNotFound => "user_not_found",
            Self::InvalidToken => "invalid_token",
            Self::MalformedCredential => "malformed_credential",
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRecord {
    pub outcome: AuthOutcome,
    pub uid: Option<String>,
}

impl DecisionRecord {
    pub fn valid(uid: impl Into<String>) -> Self {
        Self {
            outcome: AuthOutcome::Valid,
            uid: Some(uid.into()),
        }
    }

    pub fn user_not_found(uid: impl Into<String>) -> Self {
        Self {
            outcome: AuthOutcome::UserNotFound,
            uid: Some(uid.into()),
        }
    }

    pub fn invalid_token() -> Self {
        Self {
            outcome: AuthOutcome::InvalidToken,
            uid: None,
        }
    }

    pub fn malformed_credential() -> Self {
        Self {
            outcome: AuthOutcome::MalformedCredential,
            uid: None,
        }
    }
}

impl fmt::Display for DecisionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.outcome, self.uid.as_deref()) {
            (AuthOutcome::Valid, Some(uid)) => write!(f, "auth: UID from valid JWT: `{}`", uid),
            (AuthOutcome::UserNotFound, Some(uid)) => write!(f, "auth: User not found: `{}`", uid),
            (AuthOutcome::InvalidToken, _) => f.write_str("auth: Invalid token"),
            (AuthOutcome::MalformedCredential, _) => f.write_str("auth: Malformed credential"),
            (outcome, None) => write!(f, "auth: {}", outcome.as_str()),
        }
    }
}

/// Destination for decision records.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &DecisionRecord);
}

/// Writes each record as one `tracing` event on [`AUDIT_TARGET`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, record: &DecisionRecord) {
        let uid = record.uid.as_deref().unwrap_or("-");
        if record.outcome.is_valid() {
            tracing::info!(
                target: AUDIT_TARGET,
                outcome = record.outcome.as_str(),
                uid,
                "{}",
                record
            );
        } else {
            tracing::warn!(
                target: AUDIT_TARGET,
                outcome = record.outcome.as_str(),
                uid,
                "{}",
                record
            );
        }
    }
}

/// Keeps records in memory. Used by tests and by embedders that ship
/// records somewhere other than the log stream.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    records: Mutex<Vec<DecisionRecord>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DecisionRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Rendered lines, in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.records().iter().map(ToString::to_string).collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, record: &DecisionRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
    }
}
