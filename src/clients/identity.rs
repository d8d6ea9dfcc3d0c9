use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use crate::database::StoreError;

/// Authenticated account as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Principal {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Resolves a bearer token to the account it belongs to. Account lifecycle
/// (sign-up, sign-in, recovery) stays with the provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means the token is not recognised
    async fn resolve(&self, token: &str) -> Result<Option<Principal>, StoreError>;
}

/// Development provider: the token is the profile id itself
#[derive(Debug, Clone, Default)]
pub struct DevIdentityProvider;

#[async_trait]
impl IdentityProvider for DevIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<Principal>, StoreError> {
        let token = token.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(Principal {
            id: token.to_string(),
            email: None,
        }))
    }
}

/// Hosted auth endpoint (`GET {base}/auth/v1/user`)
#[derive(Clone)]
pub struct SupabaseIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl SupabaseIdentityProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn resolve(&self, token: &str) -> Result<Option<Principal>, StoreError> {
        let url = format!("{}/auth/v1/user", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        match response.status() {
            status if status.is_success() => {
                let principal = response
                    .json::<Principal>()
                    .await
                    .map_err(|e| StoreError::Unavailable(format!("invalid user payload: {e}")))?;
                Ok(Some(principal))
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Ok(None),
            status => {
                let text = response.text().await.unwrap_or_default();
                Err(StoreError::Unavailable(format!("{status}: {text}")))
            }
        }
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}
