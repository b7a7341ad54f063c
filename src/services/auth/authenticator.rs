/*
 * Responsibility
 * - Authorization header → credential → verified token → UID → store lookup
 * - Emit exactly one DecisionRecord per attempt
 * - The reason for a denial stays in the audit record; callers only get
 *   "deny" (the HTTP layer answers a bare 401)
 */
use std::sync::Arc;

use thiserror::Error;

use crate::services::audit::{AuditSink, AuthOutcome, DecisionRecord};
use crate::services::authz::AuthzStore;

use super::credential::{Credential, CredentialError};
use super::token::{TokenError, TokenVerifier};

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("malformed credential: {0}")]
    MalformedCredential(#[from] CredentialError),
    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),
    #[error("user not found: {uid}")]
    UserNotFound { uid: String },
}

impl AuthError {
    pub fn outcome(&self) -> AuthOutcome {
        match self {
            Self::MalformedCredential(_) => AuthOutcome::MalformedCredential,
            Self::InvalidToken(_) => AuthOutcome::InvalidToken,
            Self::UserNotFound { .. } => AuthOutcome::UserNotFound,
        }
    }

    fn record(&self) -> DecisionRecord {
        match self {
            Self::MalformedCredential(_) => DecisionRecord::malformed_credential(),
            Self::InvalidToken(_) => DecisionRecord::invalid_token(),
            Self::UserNotFound { uid } => DecisionRecord::user_not_found(uid.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthResult {
    pub uid: String,
    pub outcome: AuthOutcome,
}

pub struct Authenticator {
    verifier: TokenVerifier,
    store: Arc<AuthzStore>,
    audit: Arc<dyn AuditSink>,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("verifier", &self.verifier)
            .field("users", &self.store.len())
            .finish()
    }
}

impl Authenticator {
    pub fn new(verifier: TokenVerifier, store: Arc<AuthzStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            verifier,
            store,
            audit,
        }
    }

    pub fn store(&self) -> &Arc<AuthzStore> {
        &self.store
    }

    /// Authenticate the raw `Authorization` header value.
    pub fn authenticate(&self, header: Option<&str>) -> Result<AuthResult, AuthError> {
        let result = self.decide(header);

        match &result {
            Ok(ok) => self.audit.record(&DecisionRecord::valid(ok.uid.clone())),
            Err(err) => {
                tracing::debug!(error = %err, "authentication rejected");
                self.audit.record(&err.record());
            }
        }

        result
    }

    fn decide(&self, header: Option<&str>) -> Result<AuthResult, AuthError> {
        let credential = Credential::parse(header)?;
        let token = self.verifier.verify(credential.token())?;

        if !self.store.contains(&token.uid) {
            return Err(AuthError::UserNotFound { uid: token.uid });
        }

        Ok(AuthResult {
            uid: token.uid,
            outcome: AuthOutcome::Valid,
        })
    }
}
