//! HTTP surface: router, shared state and startup wiring.
mod error;
mod routes;

use axum::{
    routing::{get, post},
    Router,
};
use secrecy::SecretString;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::{net::TcpListener, signal};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::captcha::CaptchaVerifier;
use crate::catalog::{CatalogError, CourseSource, LocalCatalog, RemoteCatalog, TokenProvider};
use crate::config::{CatalogConfig, Config, CourseSourceKind};
use crate::feed::FeedLoader;
use crate::mailer::{MailError, SmtpMailer, SmtpSettings};
use crate::render::Renderer;
use crate::signup::{SignupService, WelcomeSettings};
use crate::storage::{Database, DatabaseError};

pub use error::{AppError, ErrorResponseBody};
pub use routes::build_index_context;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("Failed to open database: {0}")]
    Database(#[from] DatabaseError),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("Invalid catalog configuration: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Invalid SMTP configuration: {0}")]
    Mail(#[from] MailError),
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: String,
        source: std::io::Error,
    },
    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Shared by every request; read-only after startup.
pub struct AppState {
    pub courses: Arc<dyn CourseSource>,
    pub feed: FeedLoader,
    pub renderer: Renderer,
    pub signup: SignupService,
    pub sitekey: String,
}

impl AppState {
    /// Wire every component from `config`.
    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        let db = Database::open(&config.database_url).await?;
        let http_client = http_client()?;
        let renderer = Renderer::from_dir(&config.template_dir);

        let courses: Arc<dyn CourseSource> = match config.course_source {
            CourseSourceKind::Remote => Arc::new(remote_catalog(&config.catalog)?),
            CourseSourceKind::Local => Arc::new(LocalCatalog::new(db.clone())),
        };

        if config.captcha.secret.is_none() {
            tracing::warn!("No CAPTCHA secret configured; every signup will be rejected");
        }
        let captcha = CaptchaVerifier::new(
            http_client.clone(),
            config.captcha.verify_url.clone(),
            SecretString::from(config.captcha.secret.clone().unwrap_or_default()),
        );

        let mailer = SmtpMailer::new(SmtpSettings {
            host: config.smtp.host.clone(),
            port: config.smtp.port,
            user: config.smtp.user.clone(),
            password: SecretString::from(config.smtp.password.clone().unwrap_or_default()),
            from: config.smtp.from.clone(),
        })?;

        let signup = SignupService::new(
            db,
            captcha,
            Arc::new(mailer),
            renderer.clone(),
            WelcomeSettings {
                subject: config.smtp.subject.clone(),
                site_url: config.site_url.clone(),
            },
        );

        Ok(Self {
            courses,
            feed: FeedLoader::new(http_client, config.feed_url.clone(), config.feed_limit),
            renderer,
            signup,
            sitekey: config.captcha.site_key.clone(),
        })
    }
}

/// Client shared by the feed, catalog and CAPTCHA calls.
fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .pool_max_idle_per_host(4)
        .pool_idle_timeout(Duration::from_secs(30))
        .tcp_keepalive(Duration::from_secs(60))
        .timeout(Duration::from_secs(30))
        .build()
}

/// Remote catalog client for `catalog`.
///
/// The token endpoint gets its own client so certificate checks can be relaxed
/// for it alone.
pub fn remote_catalog(catalog: &CatalogConfig) -> Result<RemoteCatalog, StartupError> {
    let tokens = TokenProvider::new(
        TokenProvider::build_client(catalog.accept_invalid_certs)?,
        catalog.token_url.clone(),
        catalog.authorization.clone().map(SecretString::from),
    );
    Ok(RemoteCatalog::new(http_client()?, &catalog.api_url, tokens)?)
}

pub fn make_router(state: Arc<AppState>, static_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/adicionar", post(routes::subscribe))
        .nest_service("/static", ServeDir::new(static_dir.as_ref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `config.bind_address` and serve until Ctrl+C or SIGTERM.
pub async fn serve(config: Config) -> Result<(), StartupError> {
    let state = Arc::new(AppState::from_config(&config).await?);
    let app = make_router(state, &config.static_dir);

    let listener = TcpListener::bind(&config.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;
    tracing::info!(
        address = %config.bind_address,
        course_source = ?config.course_source,
        "Server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(StartupError::Serve)?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
