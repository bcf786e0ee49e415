//! Claim and identity value types.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which of the two session credentials a token is.
///
/// A token is only ever one kind; verification requires the kind to match
/// the caller's context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Account roles, a closed set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Maid,
}

/// Payload embedded in every signed token.
///
/// Email and role are denormalized copies of identity attributes so a
/// token can be verified without a storage round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject user id
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    /// Token kind, access or refresh
    pub kind: TokenKind,
    /// Unique token id
    pub jti: Uuid,
    /// Issued-at, epoch seconds
    pub iat: i64,
    /// Expiry, epoch seconds
    pub exp: i64,
}

/// Identity attributes this service needs from the persistence collaborator.
#[derive(Debug, Clone)]
pub struct UserIdentity {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    /// Hashed secret, opaque to everything but `verify_secret`
    pub secret_hash: String,
    pub is_active: bool,
}
