//! Access token collaborator.
//!
//! Token acquisition and refresh live outside this SDK; the connection only
//! needs something that can hand it a bearer token on demand.

use async_trait::async_trait;
use graphcal_domain::Result;

/// Source of bearer tokens for outgoing requests.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Current access token, refreshed by the provider as needed.
    async fn access_token(&self) -> Result<String>;

    /// Exchange a refresh token for a fresh access token.
    async fn refresh(&self, refresh_token: &str) -> Result<String>;
}

/// Fixed-token provider for tests and short-lived scripts.
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }

    async fn refresh(&self, _refresh_token: &str) -> Result<String> {
        Ok(self.token.clone())
    }
}
