pub mod authenticator;
pub mod credential;
pub mod factory;
pub mod token;

pub use authenticator::{AuthError, AuthResult, Authenticator};
pub use credential::{Credential, CredentialError};
pub use factory::build_authenticator;
pub use token::{TokenError, TokenVerifier, VerifiedToken};
