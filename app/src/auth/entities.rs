use crate::user;
use sha2::Digest;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("access denied")]
    AccessDenied,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// This grant represents a compile-time proof that the holder authenticated as the user.
#[derive(Debug, Clone)]
pub struct Grant {
    pub user_id: user::Id,
    pub name: user::Name,
}

/// A hash of the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes a password with SHA256, hex encoded.
    ///
    /// There is no per-user salt, so equal passwords produce equal hashes. Rows written by earlier
    /// deployments use the same digest, which keeps them verifiable.
    pub(crate) fn generate(password: &str) -> Self {
        let mut hasher = sha2::Sha256::new();
        hasher.update(password);
        Self(hex::encode(hasher.finalize()))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn matches(&self, stored: &str) -> bool {
        self.0 == stored
    }
}
