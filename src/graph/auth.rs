//! OAuth2 client-credentials authentication for Microsoft Graph.

use serde::Deserialize;
use tokio::sync::OnceCell;

use crate::config::GraphConfig;
use crate::error::{AppError, AppResult};

/// OAuth2 token response from the login endpoint
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

/// Acquires an access token on first use and reuses it for the rest of the
/// pass. A single pass is expected to finish within one token lifetime; if
/// the token expires mid-pass the pass fails rather than refreshing.
#[derive(Debug)]
pub struct TokenProvider {
    config: GraphConfig,
    http: reqwest::Client,
    token: OnceCell<String>,
}

impl TokenProvider {
    /// Creates a new token provider sharing the client's HTTP pool
    pub fn new(config: GraphConfig, http: reqwest::Client) -> Self {
        Self {
            config,
            http,
            token: OnceCell::new(),
        }
    }

    /// Returns the pass-scoped bearer token, acquiring it if necessary
    pub async fn bearer_token(&self) -> AppResult<&str> {
        let token = self
            .token
            .get_or_try_init(|| self.acquire_token())
            .await?;
        Ok(token.as_str())
    }

    /// Performs the client-credentials exchange against the tenant's token endpoint
    async fn acquire_token(&self) -> AppResult<String> {
        let token_url = self.config.token_url();
        let scope = self.config.scope();

        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
            ("scope", scope.as_str()),
        ];

        let response = self
            .http
            .post(&token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Auth(format!(
                "Token request failed with status {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse token response: {}", e)))?;

        log::debug!(
            "Acquired Graph access token (expires in {}s)",
            token.expires_in
        );

        Ok(token.access_token)
    }
}
