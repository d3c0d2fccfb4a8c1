//! reCAPTCHA token verification.
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("CAPTCHA rejected: {0:?}")]
    Rejected(Vec<String>),
    #[error("CAPTCHA verification timed out")]
    Timeout,
    #[error("CAPTCHA verification request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("CAPTCHA verification returned status {0}")]
    HttpStatus(u16),
    #[error("CAPTCHA verification response could not be decoded: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

/// Checks form tokens against the verification endpoint.
#[derive(Clone)]
pub struct CaptchaVerifier {
    client: reqwest::Client,
    verify_url: String,
    secret: SecretString,
}

impl CaptchaVerifier {
    pub fn new(client: reqwest::Client, verify_url: impl Into<String>, secret: SecretString) -> Self {
        Self {
            client,
            verify_url: verify_url.into(),
            secret,
        }
    }

    /// Verify a `g-recaptcha-response` token.
    ///
    /// `Ok(())` only when the endpoint answers `success: true`.
    pub async fn verify(&self, token: &str) -> Result<(), CaptchaError> {
        let request = self.client.post(&self.verify_url).form(&[
            ("secret", self.secret.expose_secret()),
            ("response", token),
        ]);

        let response = tokio::time::timeout(VERIFY_TIMEOUT, request.send())
            .await
            .map_err(|_| CaptchaError::Timeout)?
            .map_err(CaptchaError::Network)?;

        if !response.status().is_success() {
            return Err(CaptchaError::HttpStatus(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        let verdict: VerifyResponse =
            serde_json::from_slice(&body).map_err(|e| CaptchaError::Decode(e.to_string()))?;

        if verdict.success {
            Ok(())
        } else {
            Err(CaptchaError::Rejected(verdict.error_codes))
        }
    }
}
