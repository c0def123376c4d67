use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::error::AuthError;

/// Extract the token from `Authorization: Bearer <token>`.
///
/// A missing header, another scheme, or a blank token all count as
/// [`AuthError::Missing`].
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::Missing)?;

    let (scheme, token) = value.trim().split_once(' ').ok_or(AuthError::Missing)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AuthError::Missing);
    }

    let token = token.trim();
    if token.is_empty() {
        return Err(AuthError::Missing);
    }
    Ok(token)
}
