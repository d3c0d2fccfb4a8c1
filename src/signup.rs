//! Newsletter signup.
//!
//! One submission runs the whole sequence: email syntax, CAPTCHA, upsert keyed
//! by email, and a welcome email for addresses seen for the first time. The
//! welcome email is sent after the row is committed; a failed send leaves the
//! row in place.
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::captcha::{CaptchaError, CaptchaVerifier};
use crate::mailer::{is_valid_address, MailError, Mailer, OutgoingEmail};
use crate::render::{RenderError, Renderer, WelcomeContext};
use crate::storage::{Database, DatabaseError, NewSubscriber, UpsertOutcome};

/// Fields posted by the newsletter form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub nome: String,
    pub email: String,
    #[serde(rename = "g-recaptcha-response")]
    pub recaptcha: String,
    #[serde(rename = "codRec")]
    pub cod_rec: String,
}

#[derive(Debug, Error)]
pub enum SignupError {
    #[error("invalid email address")]
    InvalidEmail,
    #[error("CAPTCHA verification failed: {0}")]
    Captcha(#[from] CaptchaError),
    #[error(transparent)]
    Storage(#[from] DatabaseError),
    #[error("failed to render welcome email: {0}")]
    Render(#[from] RenderError),
    #[error("failed to send welcome email: {0}")]
    Welcome(#[from] MailError),
}

/// What a successful signup did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupOutcome {
    /// New subscriber; the welcome email was sent
    Created(i64),
    /// Existing subscriber refreshed; no email
    Updated,
}

/// Sender and subject of the welcome email, plus the site link it contains.
#[derive(Debug, Clone)]
pub struct WelcomeSettings {
    pub subject: String,
    pub site_url: String,
}

#[derive(Clone)]
pub struct SignupService {
    db: Database,
    captcha: CaptchaVerifier,
    mailer: Arc<dyn Mailer>,
    renderer: Renderer,
    welcome: WelcomeSettings,
}

impl SignupService {
    pub fn new(
        db: Database,
        captcha: CaptchaVerifier,
        mailer: Arc<dyn Mailer>,
        renderer: Renderer,
        welcome: WelcomeSettings,
    ) -> Self {
        Self {
            db,
            captcha,
            mailer,
            renderer,
            welcome,
        }
    }

    /// Process one form submission received at `now`.
    pub async fn submit(
        &self,
        form: SignupForm,
        now: DateTime<Utc>,
    ) -> Result<SignupOutcome, SignupError> {
        let email = form.email.trim().to_string();
        if !is_valid_address(&email) {
            tracing::info!(email = %form.email, "Rejected signup with invalid email");
            return Err(SignupError::InvalidEmail);
        }

        if let Err(e) = self.captcha.verify(&form.recaptcha).await {
            tracing::warn!(email = %email, error = %e, "Rejected signup with invalid CAPTCHA");
            return Err(e.into());
        }

        let subscriber = NewSubscriber {
            nome: form.nome.trim().to_string(),
            email,
            cod_rec: form.cod_rec.trim().to_string(),
            data_hora: now.timestamp(),
        };

        match self.db.upsert_subscriber(&subscriber).await? {
            UpsertOutcome::Updated => {
                tracing::info!(email = %subscriber.email, "Existing subscriber refreshed");
                Ok(SignupOutcome::Updated)
            }
            UpsertOutcome::Inserted(id) => {
                tracing::info!(id, email = %subscriber.email, "New subscriber stored");
                self.send_welcome(&subscriber).await.inspect_err(|e| {
                    tracing::error!(
                        id,
                        email = %subscriber.email,
                        error = %e,
                        "Welcome email failed; subscriber kept"
                    );
                })?;
                Ok(SignupOutcome::Created(id))
            }
        }
    }

    async fn send_welcome(&self, subscriber: &NewSubscriber) -> Result<(), SignupError> {
        let html_body = self.renderer.render_welcome(&WelcomeContext {
            nome: &subscriber.nome,
            email: &subscriber.email,
            site: &self.welcome.site_url,
        })?;

        self.mailer
            .send(&OutgoingEmail {
                to_name: subscriber.nome.clone(),
                to: subscriber.email.clone(),
                subject: self.welcome.subject.clone(),
                html_body,
            })
            .await?;
        Ok(())
    }
}
