use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const TOKEN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("Token request timed out")]
    Timeout,
    #[error("Token request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Token endpoint returned status {0}")]
    HttpStatus(u16),
    #[error("Token response could not be decoded: {0}")]
    Decode(String),
    #[error("Token endpoint returned an empty access token")]
    EmptyToken,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
}

/// Exchanges a client-credentials grant for a bearer token.
///
/// Every call performs a fresh request; tokens are not cached.
#[derive(Clone)]
pub struct TokenProvider {
    client: reqwest::Client,
    token_url: String,
    authorization: Option<SecretString>,
    timeout: Duration,
}

impl TokenProvider {
    pub fn new(
        client: reqwest::Client,
        token_url: impl Into<String>,
        authorization: Option<SecretString>,
    ) -> Self {
        Self {
            client,
            token_url: token_url.into(),
            authorization,
            timeout: TOKEN_TIMEOUT,
        }
    }

    /// Limit for the whole exchange, body included (default 30 s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the HTTP client for the token endpoint.
    ///
    /// `accept_invalid_certs` disables certificate verification for endpoints
    /// served with self-signed certificates.
    pub fn build_client(accept_invalid_certs: bool) -> Result<reqwest::Client, reqwest::Error> {
        if accept_invalid_certs {
            tracing::warn!("TLS certificate verification disabled for the token endpoint");
        }
        reqwest::Client::builder()
            .danger_accept_invalid_certs(accept_invalid_certs)
            .timeout(TOKEN_TIMEOUT)
            .build()
    }

    /// Request a new access token.
    pub async fn fetch(&self) -> Result<String, TokenError> {
        tokio::time::timeout(self.timeout, self.exchange())
            .await
            .map_err(|_| TokenError::Timeout)?
    }

    async fn exchange(&self) -> Result<String, TokenError> {
        let mut request = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", "client_credentials")]);
        if let Some(authorization) = &self.authorization {
            request = request.header(
                reqwest::header::AUTHORIZATION,
                authorization.expose_secret(),
            );
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(status = %status, url = %self.token_url, "Token endpoint rejected request");
            return Err(TokenError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await?;
        let token: TokenResponse =
            serde_json::from_slice(&body).map_err(|e| TokenError::Decode(e.to_string()))?;

        if token.access_token.is_empty() {
            return Err(TokenError::EmptyToken);
        }

        tracing::debug!("Fetched catalog access token");
        Ok(token.access_token)
    }
}
