use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use std::{error::Error as StdError, fmt};

use crate::config::TokenKeyConfig;

// Errors returned by token verification + claim validation.
#[derive(Debug)]
pub enum TokenError {
    Jwt(jsonwebtoken::errors::Error),
    MissingUid,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Jwt(e) => write!(f, "jwt verification failed: {}", e),
            Self::MissingUid => write!(f, "missing or empty 'uid' claim"),
        }
    }
}

impl StdError for TokenError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Jwt(e) => Some(e),
            Self::MissingUid => None,
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        Self::Jwt(e)
    }
}

/// Claims the gateway cares about. Anything else in the token is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub uid: Option<String>,
    pub exp: u64,
}

/// A token whose signature and expiry checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub uid: String,
}

/// Verifies inbound JWTs against the configured key.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Do not print key material
        f.debug_struct("TokenVerifier")
            .field("validation", &self.validation)
            .finish()
    }
}

impl TokenVerifier {
    pub fn new(config: &TokenKeyConfig) -> Result<Self, String> {
        let key = config.key.as_bytes();
        let decoding_key = match config.algorithm {
            Algorithm::HS256 => DecodingKey::from_secret(key),
            Algorithm::RS256 => DecodingKey::from_rsa_pem(key)
                .map_err(|e| format!("invalid rsa public key pem: {}", e))?,
            Algorithm::ES256 => DecodingKey::from_ec_pem(key)
                .map_err(|e| format!("invalid ec public key pem: {}", e))?,
            Algorithm::EdDSA => DecodingKey::from_ed_pem(key)
                .map_err(|e| format!("invalid ed25519 public key pem: {}", e))?,
            other => return Err(format!("unsupported algorithm: {:?}", other)),
        };

        let mut validation = Validation::new(config.algorithm);
        validation.leeway = config.leeway_seconds;
        // Tokens are minted for the whole cluster; no audience is pinned.
        validation.validate_aud = false;

        Ok(Self {
            decoding_key,
            validation,
        })
    }

    // Signature, algorithm and `exp` are checked by jsonwebtoken.
    pub fn verify(&self, token: &str) -> Result<VerifiedToken, TokenError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding_key, &self.validation)?;

        let uid = data
            .claims
            .uid
            .filter(|uid| !uid.trim().is_empty())
            .ok_or(TokenError::MissingUid)?;

        Ok(VerifiedToken { uid })
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{EncodingKey, Header};
    use serde_json::json;

    use super::*;

    const SECRET: &str = "test-secret";

    fn verifier() -> TokenVerifier {
        TokenVerifier::new(&TokenKeyConfig {
            algorithm: Algorithm::HS256,
            key: SECRET.to_string(),
            leeway_seconds: 0,
        })
        .unwrap()
    }

    fn now() -> u64 {
        jsonwebtoken::get_current_timestamp()
    }

    fn sign(claims: serde_json::Value, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn extracts_uid() {
        let token = sign(json!({ "uid": "bozydar", "exp": now() + 600 }), SECRET);

        assert_eq!(verifier().verify(&token).unwrap().uid, "bozydar");
    }

    #[test]
    fn rejects_wrong_signature() {
        let token = sign(json!({ "uid": "bozydar", "exp": now() + 600 }), "other-secret");

        assert!(matches!(verifier().verify(&token), Err(TokenError::Jwt(_))));
    }

    #[test]
    fn rejects_expired_token() {
        let token = sign(json!({ "uid": "bozydar", "exp": now() - 600 }), SECRET);

        assert!(matches!(verifier().verify(&token), Err(TokenError::Jwt(_))));
    }

    #[test]
    fn rejects_missing_or_empty_uid() {
        let no_uid = sign(json!({ "sub": "bozydar", "exp": now() + 600 }), SECRET);
        let empty_uid = sign(json!({ "uid": " ", "exp": now() + 600 }), SECRET);

        assert!(matches!(verifier().verify(&no_uid), Err(TokenError::MissingUid)));
        assert!(matches!(verifier().verify(&empty_uid), Err(TokenError::MissingUid)));
    }

    #[test]
    fn ignores_audience_claim() {
        let token = sign(
            json!({ "uid": "bozydar", "aud": "cluster", "exp": now() + 600 }),
            SECRET,
        );

        assert!(verifier().verify(&token).is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(verifier().verify("not-a-jwt").is_err());
    }
}
