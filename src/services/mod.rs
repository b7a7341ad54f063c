/*
 * Responsibility
 * - Domain services shared by the gateway and admin routers
 *   (authn, authz set, audit, upstream dispatch)
 * - No axum routing here; handlers/middleware call into these
 */
pub mod audit;
pub mod auth;
pub mod authz;
pub mod upstream;
