pub mod identity;
pub mod store;

pub use identity::{IamClient, IdentityError, IdentitySource, spawn_periodic_sync, sync_once};
pub use store::AuthzStore;
