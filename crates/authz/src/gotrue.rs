//! [`IdentityVerifier`] backed by a GoTrue user endpoint (`{endpoint}/auth/v1/user`).

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use bookshelf_kernel::settings::IdentitySettings;
use bookshelf_kernel::UserId;
use reqwest::Url;
use serde::Deserialize;

use crate::error::AuthError;
use crate::verifier::IdentityVerifier;

const USER_AGENT: &str = concat!("bookshelf/", env!("CARGO_PKG_VERSION"));

pub struct GoTrueVerifier {
    client: reqwest::Client,
    user_url: Url,
    api_key: String,
}

#[derive(Deserialize)]
struct GoTrueUser {
    id: String,
}

impl GoTrueVerifier {
    pub fn new(settings: &IdentitySettings) -> anyhow::Result<Self> {
        let user_url = format!("{}/auth/v1/user", settings.endpoint.trim_end_matches('/'));
        let user_url = Url::parse(&user_url)
            .with_context(|| format!("invalid identity endpoint '{}'", settings.endpoint))?;

        let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
        if let Some(timeout_ms) = settings.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        let client = builder
            .build()
            .with_context(|| "failed to build identity HTTP client")?;

        Ok(Self {
            client,
            user_url,
            api_key: settings.api_key.clone(),
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoTrueVerifier {
    async fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::Missing);
        }

        let response = self
            .client
            .get(self.user_url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AuthError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() {
            return Err(AuthError::ProviderUnavailable(format!(
                "identity provider responded with {status}"
            )));
        }
        if !status.is_success() {
            return Err(AuthError::Invalid(format!(
                "identity provider responded with {status}"
            )));
        }

        let user: GoTrueUser = response
            .json()
            .await
            .map_err(|e| AuthError::Invalid(format!("malformed user payload: {e}")))?;
        if user.id.is_empty() {
            return Err(AuthError::Invalid("user payload has an empty id".to_string()));
        }

        Ok(UserId::new(user.id))
    }
}
