use thiserror::Error;

/// Why a request could not be tied to a user. Clients see the same 401 for
/// every variant; the distinction exists for logs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing bearer token")]
    Missing,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("identity provider unavailable: {0}")]
    ProviderUnavailable(String),
}

impl AuthError {
    /// Stable tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Missing => "auth_missing",
            AuthError::Invalid(_) => "auth_invalid",
            AuthError::ProviderUnavailable(_) => "auth_provider_unavailable",
        }
    }
}
