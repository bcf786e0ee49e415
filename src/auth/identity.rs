//! Identity lookup and secret verification collaborators.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DoormanError, Result};

use super::claims::{Role, UserIdentity};

const BCRYPT_COST: u32 = 10;

/// Persistence collaborator for identity resolution.
///
/// The session layer never touches storage directly; everything it needs
/// from persistence goes through this trait.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserIdentity>>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserIdentity>>;

    /// Check a plaintext secret against a stored hash.
    async fn verify_secret(&self, plain: &str, hash: &str) -> Result<bool>;
}

/// In-memory identity store backed by bcrypt hashes.
///
/// Serves the seeded demo accounts in the binary and doubles as the test
/// store.
pub struct MemoryIdentityStore {
    users: RwLock<HashMap<Uuid, UserIdentity>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Hash `password` and add a new active identity, returning its id.
    pub fn register(&self, email: &str, password: &str, role: Role) -> Result<Uuid> {
        let secret_hash = bcrypt::hash(password, BCRYPT_COST)
            .map_err(|e| DoormanError::Config(format!("Password hashing failed: {e}")))?;

        let identity = UserIdentity {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
            secret_hash,
            is_active: true,
        };
        let id = identity.id;

        debug!(user_id = %id, email = %email, "Registered identity");
        self.users.write().insert(id, identity);
        Ok(id)
    }

    /// Enable or disable an identity.
    pub fn set_active(&self, id: Uuid, is_active: bool) {
        if let Some(identity) = self.users.write().get_mut(&id) {
            identity.is_active = is_active;
        }
    }
}

impl Default for MemoryIdentityStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<UserIdentity>> {
        Ok(self.users.read().get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserIdentity>> {
        Ok(self
            .users
            .read()
            .values()
            .find(|identity| identity.email == email)
            .cloned())
    }

    async fn verify_secret(&self, plain: &str, hash: &str) -> Result<bool> {
        bcrypt::verify(plain, hash).map_err(|_| DoormanError::InvalidCredential)
    }
}
