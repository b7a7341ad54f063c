/// Factory: build the `Authenticator` from application `Config`.
use std::sync::Arc;

use crate::config::Config;
use crate::error::AppError;
use crate::services::audit::AuditSink;
use crate::services::auth::{Authenticator, TokenVerifier};
use crate::services::authz::AuthzStore;

pub fn build_authenticator(
    config: &Config,
    store: Arc<AuthzStore>,
    audit: Arc<dyn AuditSink>,
) -> Result<Arc<Authenticator>, AppError> {
    let verifier = TokenVerifier::new(&config.token).map_err(|e| {
        tracing::error!(error = %e, "failed to build token verifier");
        AppError::Internal
    })?;

    Ok(Arc::new(Authenticator::new(verifier, store, audit)))
}
