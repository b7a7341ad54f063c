/*
 * Responsibility
 * - Shared context attached to the gateway and admin routers (AppState)
 *   - authenticator, authorization set, route table, dispatcher, identity source
 * - Clone 前提で持つ (内部は Arc/Clone cheap)
 */
use std::sync::Arc;

use crate::services::{
    auth::Authenticator,
    authz::{AuthzStore, IdentitySource},
    upstream::{Dispatcher, RouteTable},
};

#[derive(Clone)]
pub struct AppState {
    pub authenticator: Arc<Authenticator>,
    pub authz: Arc<AuthzStore>,
    pub routes: Arc<RouteTable>,
    pub dispatcher: Arc<Dispatcher>,
    pub identity: Arc<dyn IdentitySource>,
}

impl AppState {
    pub fn new(
        authenticator: Arc<Authenticator>,
        routes: Arc<RouteTable>,
        dispatcher: Arc<Dispatcher>,
        identity: Arc<dyn IdentitySource>,
    ) -> Self {
        // The admin API and the authenticator must share one store.
        let authz = authenticator.store().clone();
        Self {
            authenticator,
            authz,
            routes,
            dispatcher,
            identity,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("authenticator", &self.authenticator)
            .field("routes", &self.routes)
            .field("identity", &self.identity.name())
            .finish()
    }
}
