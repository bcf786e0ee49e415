//! Credential issuance, verification, and session lifecycle.

mod claims;
mod codec;
mod identity;
mod session;

pub use claims::{Role, TokenClaims, TokenKind, UserIdentity};
pub use codec::TokenCodec;
pub use identity::{IdentityStore, MemoryIdentityStore};
pub use session::{SessionManager, SessionTokens};
