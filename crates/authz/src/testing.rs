//! Fixed token table standing in for the identity provider in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use bookshelf_kernel::UserId;

use crate::error::AuthError;
use crate::verifier::IdentityVerifier;

#[derive(Default)]
pub struct StaticIdentityVerifier {
    tokens: HashMap<String, UserId>,
    unavailable: bool,
    calls: AtomicUsize,
}

impl StaticIdentityVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as belonging to `user`.
    pub fn with_token(mut self, token: impl Into<String>, user: impl Into<String>) -> Self {
        self.tokens.insert(token.into(), UserId::new(user));
        self
    }

    /// Behave like a provider that cannot be reached.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityVerifier for StaticIdentityVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(AuthError::ProviderUnavailable(
                "connection refused".to_string(),
            ));
        }
        self.tokens
            .get(token)
            .cloned()
            .ok_or_else(|| AuthError::Invalid("unknown token".to_string()))
    }
}
