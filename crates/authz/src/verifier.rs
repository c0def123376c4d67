use async_trait::async_trait;
use bookshelf_kernel::UserId;

use crate::error::AuthError;

/// Resolves a bearer token to the user it was issued for.
///
/// Implementations make one provider call per invocation and never cache.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError>;
}
