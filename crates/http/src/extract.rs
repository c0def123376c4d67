//! Request extractors shared by module routes.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequest, FromRequestParts, Request},
    http::{header::CONTENT_TYPE, request::Parts, HeaderMap},
    Json,
};
use bookshelf_authz::{bearer_token, IdentityVerifier};
use bookshelf_kernel::UserId;
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// Caller resolved from the bearer token by the state's [`IdentityVerifier`].
///
/// Place it before any body extractor so unauthenticated requests are turned
/// away before the body is read.
#[derive(Debug, Clone)]
pub struct AuthUser(pub UserId);

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<dyn IdentityVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)?.to_owned();
        let verifier = <Arc<dyn IdentityVerifier> as FromRef<S>>::from_ref(state);

        let user = verifier.verify(&token).await?;
        tracing::debug!(user_id = %user, "request authenticated");
        Ok(AuthUser(user))
    }
}

/// JSON request body.
///
/// A request that does not declare a JSON content type reads as an empty
/// object (`T::default()`). A declared JSON body that fails to parse is
/// rejected with `400 {"error": ...}`.
#[derive(Debug)]
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned + Default + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !declares_json(req.headers()) {
            return Ok(AppJson(T::default()));
        }
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}

/// `application/json` or any `application/*+json` type, parameters ignored.
fn declares_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    essence == "application/json"
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{HeaderValue, StatusCode};
    use axum::response::IntoResponse;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Flag {
        #[serde(default)]
        on: Option<bool>,
    }

    fn with_content_type(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(value));
        headers
    }

    fn body_request(content_type: Option<&str>, body: &'static str) -> Request {
        let mut builder = axum::http::Request::builder().method("PUT").uri("/");
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder.body(Body::from(body)).unwrap()
    }

    #[test]
    fn recognizes_json_content_types() {
        assert!(declares_json(&with_content_type("application/json")));
        assert!(declares_json(&with_content_type("application/json; charset=utf-8")));
        assert!(declares_json(&with_content_type("application/merge-patch+json")));
        assert!(!declares_json(&with_content_type("text/plain")));
        assert!(!declares_json(&HeaderMap::new()));
    }

    #[tokio::test]
    async fn undeclared_body_reads_as_empty_object() {
        let AppJson(flag) =
            AppJson::<Flag>::from_request(body_request(None, r#"{"on": true}"#), &())
                .await
                .unwrap();
        assert_eq!(flag, Flag::default());
    }

    #[tokio::test]
    async fn declared_json_is_parsed() {
        let request = body_request(Some("application/json"), r#"{"on": false}"#);
        let AppJson(flag) = AppJson::<Flag>::from_request(request, &()).await.unwrap();
        assert_eq!(flag.on, Some(false));
    }

    #[tokio::test]
    async fn malformed_declared_json_is_a_bad_request() {
        let request = body_request(Some("application/json"), r#"{"on": "#);
        let err = AppJson::<Flag>::from_request(request, &()).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
