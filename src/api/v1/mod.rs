/*
 * Responsibility
 * - Admin API v1 (authorization set management)
 * - routes() の re-export
 */
pub mod dto;
pub mod handlers;
mod routes;

pub use routes::routes;
