//! Authentication guard inputs: bearer extraction and identity verification.

pub mod bearer;
pub mod error;
pub mod gotrue;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod verifier;

pub use bearer::bearer_token;
pub use error::AuthError;
pub use gotrue::GoTrueVerifier;
pub use verifier::IdentityVerifier;
