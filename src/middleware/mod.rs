/*
 * Responsibility
 * - middleware の公開インターフェース
 * - auth: token authentication in front of the proxy handler
 * - http: request id / access log / body limit for every listener
 */
pub mod auth;
pub mod http;
