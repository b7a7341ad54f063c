//! Authenticating reverse-proxy gateway.
//!
//! Every request on the gateway listener must carry
//! `Authorization: token=<jwt>`. The token's `uid` claim has to be in the
//! in-memory authorization set (kept in sync with the identity service and
//! editable through the admin listener). Authorized requests are forwarded
//! to the upstream selected by path prefix, with the prefix stripped and
//! `X-Forwarded-For` / `X-Forwarded-Proto` / `X-Real-IP` set.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
pub mod state;
