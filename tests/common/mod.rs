//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use academy_landing::captcha::CaptchaVerifier;
use academy_landing::catalog::{CatalogError, CatalogSnapshot, CourseSource};
use academy_landing::feed::FeedLoader;
use academy_landing::mailer::{MailError, Mailer, OutgoingEmail};
use academy_landing::render::Renderer;
use academy_landing::server::AppState;
use academy_landing::signup::{SignupService, WelcomeSettings};
use academy_landing::storage::Database;

pub const TEMPLATE_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/templates");
pub const STATIC_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/static");
pub const SITE_URL: &str = "https://guerra.academy";

pub async fn test_db() -> Database {
    Database::open("sqlite::memory:").await.unwrap()
}

pub fn renderer() -> Renderer {
    Renderer::from_dir(TEMPLATE_DIR)
}

/// Keeps every email instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    fail: bool,
}

impl RecordingMailer {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Address {
                address: email.to.clone(),
                reason: "relay refused".into(),
            });
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Fixed catalog answer.
pub struct StaticCatalog(pub CatalogSnapshot);

#[async_trait]
impl CourseSource for StaticCatalog {
    async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        Ok(self.0.clone())
    }
}

/// CAPTCHA endpoint answering every request with `success`.
pub async fn captcha_server(success: bool) -> MockServer {
    let server = MockServer::start().await;
    let error_codes: Vec<&str> = if success {
        Vec::new()
    } else {
        vec!["invalid-input-response"]
    };
    Mock::given(method("POST"))
        .and(path("/siteverify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "success": success,
            "error-codes": error_codes,
        })))
        .mount(&server)
        .await;
    server
}

pub fn captcha_verifier(server: &MockServer) -> CaptchaVerifier {
    CaptchaVerifier::new(
        reqwest::Client::new(),
        format!("{}/siteverify", server.uri()),
        SecretString::from("captcha-secret"),
    )
}

pub fn signup_service(
    db: Database,
    captcha: &MockServer,
    mailer: Arc<RecordingMailer>,
) -> SignupService {
    SignupService::new(
        db,
        captcha_verifier(captcha),
        mailer,
        renderer(),
        WelcomeSettings {
            subject: "Welcome to Guerra Academy".into(),
            site_url: SITE_URL.into(),
        },
    )
}

pub fn app_state(
    courses: Arc<dyn CourseSource>,
    feed_url: impl Into<String>,
    signup: SignupService,
) -> Arc<AppState> {
    Arc::new(AppState {
        courses,
        feed: FeedLoader::new(reqwest::Client::new(), feed_url, 3),
        renderer: renderer(),
        signup,
        sitekey: "site-key-123".into(),
    })
}
