//! Token signing and signature verification.
//!
//! [`TokenSigner::verify_signature`] is the first of the two authentication
//! gates: a pure function of the signing key and the clock. It never touches
//! the store; the session lookup is the second gate, in `session.rs`.

use crate::error::{AuthError, AuthResult};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use chrono::Utc;
use kodbank_core::TokenClaims;
use std::fmt;

/// HS256 signer/verifier for session tokens
#[derive(Clone)]
pub struct TokenSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ignore_expiry: Validation,
}

impl TokenSigner {
    /// Create a signer from a shared secret.
    ///
    /// An empty secret is refused: it would make every token forgeable.
    pub fn new(secret: &[u8]) -> AuthResult<Self> {
        if secret.is_empty() {
            return Err(AuthError::Signing("signing secret must not be empty".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let mut ignore_expiry = validation.clone();
        ignore_expiry.validate_exp = false;

        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ignore_expiry,
        })
    }

    /// Sign claims into a compact token
    pub fn sign(&self, claims: &TokenClaims) -> AuthResult<String> {
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Verify signature and embedded expiry.
    ///
    /// A token with a valid signature whose `exp` has been reached is
    /// [`AuthError::TokenExpired`]; anything else that fails to decode is
    /// [`AuthError::TokenInvalid`].
    pub fn verify_signature(&self, token: &str) -> AuthResult<TokenClaims> {
        let claims = jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid(e.to_string()),
            })?;

        // jsonwebtoken only rejects `exp < now`; the session row is dead from `exp` on
        if claims.exp <= Utc::now().timestamp() {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    /// Verify the signature only, accepting a token past its expiry.
    ///
    /// Used to find the owner of an expired token on logout; never for
    /// authentication.
    pub fn decode_expired(&self, token: &str) -> AuthResult<TokenClaims> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.ignore_expiry)
            .map(|data| data.claims)
            .map_err(|e| AuthError::TokenInvalid(e.to_string()))
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("algorithm", &"HS256")
            .finish_non_exhaustive()
    }
}
