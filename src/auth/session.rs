//! Session issuance and renewal.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::error::{DoormanError, Result};

use super::claims::{TokenClaims, TokenKind, UserIdentity};
use super::codec::TokenCodec;
use super::identity::IdentityStore;

/// Access and refresh tokens issued together.
///
/// The pair shares its subject but each token carries an independent
/// expiry and encoding. There is no server-side revocation; expiry is the
/// only termination.
#[derive(Debug, Clone)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// Orchestrates login and refresh, bridging the token codec with the
/// identity store.
pub struct SessionManager {
    codec: TokenCodec,
    store: Arc<dyn IdentityStore>,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SessionManager {
    pub fn new(
        codec: TokenCodec,
        store: Arc<dyn IdentityStore>,
        access_ttl: Duration,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            codec,
            store,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Resolve an identity by email and check its secret.
    ///
    /// Returns `None` alike for an unknown email, an inactive account, or
    /// a failed secret check; the cases are never distinguished.
    pub async fn authenticate(&self, email: &str, secret: &str) -> Result<Option<UserIdentity>> {
        let Some(identity) = self.store.find_user_by_email(email).await? else {
            debug!("Authentication failed: unknown email");
            return Ok(None);
        };

        if !identity.is_active {
            debug!(user_id = %identity.id, "Authentication failed: inactive account");
            return Ok(None);
        }

        if !self
            .store
            .verify_secret(secret, &identity.secret_hash)
            .await?
        {
            debug!(user_id = %identity.id, "Authentication failed: secret mismatch");
            return Ok(None);
        }

        Ok(Some(identity))
    }

    /// Issue a fresh access/refresh pair for `identity`.
    pub fn issue_session(&self, identity: &UserIdentity) -> Result<SessionTokens> {
        let access_token = self
            .codec
            .issue(identity, TokenKind::Access, self.access_ttl)?;
        let refresh_token = self
            .codec
            .issue(identity, TokenKind::Refresh, self.refresh_ttl)?;

        debug!(user_id = %identity.id, "Issued session tokens");
        Ok(SessionTokens {
            access_token,
            refresh_token,
        })
    }

    /// Trade a refresh token for a new pair.
    ///
    /// The identity is re-resolved by id and must still be active. Both
    /// tokens rotate; the presented refresh token is never re-issued.
    pub async fn renew_session(&self, refresh_token: &str) -> Result<SessionTokens> {
        let claims = self.codec.verify(refresh_token, TokenKind::Refresh)?;

        let identity = self
            .store
            .find_user_by_id(claims.sub)
            .await?
            .ok_or(DoormanError::IdentityNotFound)?;

        if !identity.is_active {
            return Err(DoormanError::IdentityInactive);
        }

        self.issue_session(&identity)
    }

    /// Verify a bearer token presented on a protected endpoint.
    pub fn verify_access(&self, token: &str) -> Result<TokenClaims> {
        self.codec.verify(token, TokenKind::Access)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::claims::Role;
    use crate::auth::identity::MemoryIdentityStore;
    use uuid::Uuid;

    fn manager_with_store() -> (SessionManager, Arc<MemoryIdentityStore>) {
        let store = Arc::new(MemoryIdentityStore::new());
        let manager = SessionManager::new(
            TokenCodec::new("test-secret"),
            store.clone(),
            Duration::from_secs(1800),
            Duration::from_secs(7 * 86400),
        );
        (manager, store)
    }

    #[tokio::test]
    async fn test_authenticate_succeeds_with_valid_credentials() {
        let (manager, store) = manager_with_store();
        let id = store
            .register("customer@example.com", "password123", Role::Customer)
            .unwrap();

        let identity = manager
            .authenticate("customer@example.com", "password123")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(identity.id, id);
    }

    #[tokio::test]
    async fn test_authenticate_failures_are_indistinguishable() {
        let (manager, store) = manager_with_store();
        let id = store
            .register("customer@example.com", "password123", Role::Customer)
            .unwrap();

        // Unknown email and bad secret both come back as a plain None.
        assert!(manager
            .authenticate("nobody@example.com", "password123")
            .await
            .unwrap()
            .is_none());
        assert!(manager
            .authenticate("customer@example.com", "wrong")
            .await
            .unwrap()
            .is_none());

        store.set_active(id, false);
        assert!(manager
            .authenticate("customer@example.com", "password123")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_issue_session_produces_both_kinds() {
        let (manager, store) = manager_with_store();
        let id = store
            .register("maid@example.com", "password123", Role::Maid)
            .unwrap();
        let identity = store.find_user_by_id(id).await.unwrap().unwrap();

        let tokens = manager.issue_session(&identity).unwrap();
        let access = manager.verify_access(&tokens.access_token).unwrap();
        assert_eq!(access.sub, id);
        assert_eq!(access.kind, TokenKind::Access);

        // The refresh token is not usable as an access token.
        assert!(manager.verify_access(&tokens.refresh_token).is_err());
    }

    #[tokio::test]
    async fn test_renew_session_rotates_both_tokens() {
        let (manager, store) = manager_with_store();
        let id = store
            .register("customer@example.com", "password123", Role::Customer)
            .unwrap();
        let identity = store.find_user_by_id(id).await.unwrap().unwrap();

        let original = manager.issue_session(&identity).unwrap();
        let renewed = manager
            .renew_session(&original.refresh_token)
            .await
            .unwrap();

        assert_ne!(renewed.refresh_token, original.refresh_token);
        assert_ne!(renewed.access_token, original.access_token);

        let claims = manager.verify_access(&renewed.access_token).unwrap();
        assert_eq!(claims.sub, id);
    }

    #[tokio::test]
    async fn test_renew_session_rejects_access_token() {
        let (manager, store) = manager_with_store();
        let id = store
            .register("customer@example.com", "password123", Role::Customer)
            .unwrap();
        let identity = store.find_user_by_id(id).await.unwrap().unwrap();

        let tokens = manager.issue_session(&identity).unwrap();
        assert!(manager.renew_session(&tokens.access_token).await.is_err());
    }

    #[tokio::test]
    async fn test_renew_session_requires_live_identity() {
        let (manager, store) = manager_with_store();
        let id = store
            .register("customer@example.com", "password123", Role::Customer)
            .unwrap();
        let identity = store.find_user_by_id(id).await.unwrap().unwrap();
        let tokens = manager.issue_session(&identity).unwrap();

        store.set_active(id, false);
        assert!(matches!(
            manager.renew_session(&tokens.refresh_token).await,
            Err(DoormanError::IdentityInactive)
        ));
    }

    #[tokio::test]
    async fn test_renew_session_fails_for_unresolvable_identity() {
        let (manager, _store) = manager_with_store();

        // A token for an identity the store has never seen.
        let ghost = UserIdentity {
            id: Uuid::new_v4(),
            email: "ghost@example.com".to_string(),
            role: Role::Customer,
            secret_hash: String::new(),
            is_active: true,
        };
        let tokens = manager.issue_session(&ghost).unwrap();

        assert!(matches!(
            manager.renew_session(&tokens.refresh_token).await,
            Err(DoormanError::IdentityNotFound)
        ));
    }
}
