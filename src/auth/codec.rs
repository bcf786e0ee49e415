//! Issuance and verification of signed, expiring tokens.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::error::{DoormanError, Result};

use super::claims::{TokenClaims, TokenKind, UserIdentity};

/// Stateless issuer and verifier of session tokens.
///
/// Holds only the fixed key material, so it is shared across concurrent
/// callers without synchronization.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenCodec {
    /// Create a codec signing with HS256 and the given secret.
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Issue a signed token of the given kind for `identity`, expiring
    /// after `ttl`.
    pub fn issue(&self, identity: &UserIdentity, kind: TokenKind, ttl: Duration) -> Result<String> {
        self.issue_at(identity, kind, ttl, Utc::now())
    }

    pub(crate) fn issue_at(
        &self,
        identity: &UserIdentity,
        kind: TokenKind,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<String> {
        let claims = TokenClaims {
            sub: identity.id,
            email: identity.email.clone(),
            role: identity.role,
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| DoormanError::InvalidCredential)
    }

    /// Verify a token and require its kind to match the caller's context.
    ///
    /// Bad signature, malformed encoding, expiry, and kind mismatch all
    /// collapse into `InvalidCredential`; callers learn nothing about which
    /// check failed.
    pub fn verify(&self, token: &str, expected_kind: TokenKind) -> Result<TokenClaims> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|_| DoormanError::InvalidCredential)?;

        if data.claims.exp <= Utc::now().timestamp() {
            return Err(DoormanError::InvalidCredential);
        }
        if data.claims.kind != expected_kind {
            return Err(DoormanError::InvalidCredential);
        }

        Ok(data.claims)
    }
}
