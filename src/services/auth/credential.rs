//! `Authorization` header grammar.
//!
//! ```text
//! credential  = OWS scheme OWS "=" OWS token-value OWS
//! scheme      = "token"            ; case-insensitive
//! token-value = 1*VCHAR            ; no whitespace
//! ```
use thiserror::Error;

pub const SCHEME: &str = "token";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("authorization header missing")]
    Missing,
    #[error("unsupported authorization scheme")]
    WrongScheme,
    #[error("empty token value")]
    EmptyValue,
    #[error("token value contains invalid characters")]
    InvalidCharacter,
}

/// A syntactically valid credential; the token itself is not verified yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credential<'a> {
    token: &'a str,
}

impl<'a> Credential<'a> {
    pub fn parse(header: Option<&'a str>) -> Result<Self, CredentialError> {
        let raw = header.map(str::trim).filter(|s| !s.is_empty());
        let raw = raw.ok_or(CredentialError::Missing)?;

        let (scheme, value) = raw.split_once('=').ok_or(CredentialError::WrongScheme)?;
        if !scheme.trim().eq_ignore_ascii_case(SCHEME) {
            return Err(CredentialError::WrongScheme);
        }

        let token = value.trim();
        if token.is_empty() {
            return Err(CredentialError::EmptyValue);
        }
        if !token.bytes().all(|b| b.is_ascii_graphic()) {
            return Err(CredentialError::InvalidCharacter);
        }

        Ok(Self { token })
    }

    pub fn token(&self) -> &'a str {
        self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_token_scheme() {
        let cred = Credential::parse(Some("token=eyJ.abc.def")).unwrap();
        assert_eq!(cred.token(), "eyJ.abc.def");
    }

    #[test]
    fn tolerates_case_and_whitespace() {
        let cred = Credential::parse(Some("  Token = eyJ.abc.def ")).unwrap();
        assert_eq!(cred.token(), "eyJ.abc.def");
    }

    #[test]
    fn missing_header() {
        assert_eq!(Credential::parse(None), Err(CredentialError::Missing));
        assert_eq!(Credential::parse(Some("   ")), Err(CredentialError::Missing));
    }

    #[test]
    fn bearer_is_not_accepted() {
        assert_eq!(
            Credential::parse(Some("Bearer eyJ.abc.def")),
            Err(CredentialError::WrongScheme)
        );
        assert_eq!(
            Credential::parse(Some("bearer=eyJ.abc.def")),
            Err(CredentialError::WrongScheme)
        );
    }

    #[test]
    fn empty_or_spaced_values() {
        assert_eq!(Credential::parse(Some("token=")), Err(CredentialError::EmptyValue));
        assert_eq!(
            Credential::parse(Some("token=abc def")),
            Err(CredentialError::InvalidCharacter)
        );
    }
}
