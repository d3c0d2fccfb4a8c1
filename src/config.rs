//! Configuration for the landing server.
//!
//! Values come from an optional TOML file (a missing or empty file yields
//! `Config::default()`), then environment variables override individual keys
//! using the names the deployment already exports (`SMTPSERVER`, `DSN`, ...).
//! Unknown keys in the file are accepted but logged as a warning.
use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: &'static str, reason: String },

    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Where the landing page gets its course listing from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourseSourceKind {
    /// Remote catalog API with a client-credentials bearer token
    Remote,
    /// The local `courses` table
    Local,
}

impl std::str::FromStr for CourseSourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Self::Remote),
            "local" => Ok(Self::Local),
            other => Err(format!("expected \"remote\" or \"local\", got \"{other}\"")),
        }
    }
}

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Socket address the HTTP server binds to.
    pub bind_address: String,

    /// Public base URL of the site, passed to the welcome email.
    pub site_url: String,

    /// Directory holding `index.html`, `sucesso.html` and `boasvindas.html`.
    pub template_dir: String,

    /// Directory served under `/static`.
    pub static_dir: String,

    /// sqlx SQLite URL for subscribers and the local catalog.
    pub database_url: String,

    /// Blog feed shown on the landing page.
    pub feed_url: String,

    /// Number of feed items shown.
    pub feed_limit: usize,

    pub course_source: CourseSourceKind,

    pub catalog: CatalogConfig,
    pub captcha: CaptchaConfig,
    pub smtp: SmtpConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            site_url: String::new(),
            template_dir: "templates".to_string(),
            static_dir: "static".to_string(),
            database_url: "sqlite:academy.db".to_string(),
            feed_url: "https://blog.guerra.academy/rss/".to_string(),
            feed_limit: 3,
            course_source: CourseSourceKind::Remote,
            catalog: CatalogConfig::default(),
            captcha: CaptchaConfig::default(),
            smtp: SmtpConfig::default(),
        }
    }
}

/// Remote catalog API settings.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Base URL of the course listing; `totalStudents` and `totalReviews` are
    /// resolved relative to it.
    pub api_url: String,

    /// Client-credentials token endpoint.
    pub token_url: String,

    /// Static `Authorization` header value sent to the token endpoint.
    pub authorization: Option<String>,

    /// Skip TLS certificate verification on the token endpoint.
    pub accept_invalid_certs: bool,
}

impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("api_url", &self.api_url)
            .field("token_url", &self.token_url)
            .field(
                "authorization",
                &self.authorization.as_ref().map(|_| "[REDACTED]"),
            )
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

/// reCAPTCHA settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct CaptchaConfig {
    pub verify_url: String,
    pub site_key: String,
    pub secret: Option<String>,
}

impl Default for CaptchaConfig {
    fn default() -> Self {
        Self {
            verify_url: "https://www.google.com/recaptcha/api/siteverify".to_string(),
            site_key: String::new(),
            secret: None,
        }
    }
}

impl std::fmt::Debug for CaptchaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptchaConfig")
            .field("verify_url", &self.verify_url)
            .field("site_key", &self.site_key)
            .field("secret", &self.secret.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// SMTP relay used for the welcome email.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub from: String,
    pub subject: String,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            user: String::new(),
            password: None,
            from: "noreply@guerra.academy".to_string(),
            subject: "Welcome to Guerra Academy".to_string(),
        }
    }
}

impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("from", &self.from)
            .field("subject", &self.subject)
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 11] = [
        "bind_address",
        "site_url",
        "template_dir",
        "static_dir",
        "database_url",
        "feed_url",
        "feed_limit",
        "course_source",
        "catalog",
        "captcha",
        "smtp",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)`
    /// - Unknown top-level keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load from `path`, apply process environment overrides and validate.
    pub fn from_file_and_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Override settings from environment-style variables.
    ///
    /// `lookup` returns the value for a variable name; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("SMTPSERVER") {
            self.smtp.host = v;
        }
        if let Some(v) = get("SMTPPORT") {
            self.smtp.port = v.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "SMTPPORT",
                reason: format!("{e}"),
            })?;
        }
        if let Some(v) = get("SMTPUSER") {
            self.smtp.user = v;
        }
        if let Some(v) = get("SMTPPASS") {
            self.smtp.password = Some(v);
        }
        if let Some(v) = get("CAPTCHASECRET") {
            self.captcha.secret = Some(v);
        }
        if let Some(v) = get("CAPTCHASITEKEY") {
            self.captcha.site_key = v;
        }
        if let Some(v) = get("DSN") {
            self.database_url = v;
        }
        if let Some(v) = get("SITE") {
            self.site_url = v;
        }
        if let Some(v) = get("API_URL") {
            self.catalog.api_url = v;
        }
        if let Some(v) = get("TOKEN_API_URL") {
            self.catalog.token_url = v;
        }
        if let Some(v) = get("AUTHORIZATION") {
            self.catalog.authorization = Some(v);
        }
        if let Some(v) = get("PORT") {
            let port: u16 = v.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: "PORT",
                reason: format!("{e}"),
            })?;
            self.bind_address = format!("0.0.0.0:{port}");
        }
        if let Some(v) = get("COURSE_SOURCE") {
            self.course_source = v
                .parse()
                .map_err(|reason| ConfigError::InvalidValue {
                    key: "COURSE_SOURCE",
                    reason,
                })?;
        }
        Ok(())
    }

    /// Check settings that have no usable default.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.course_source == CourseSourceKind::Remote {
            if self.catalog.api_url.trim().is_empty() {
                return Err(ConfigError::Missing("catalog.api_url (API_URL)"));
            }
            if self.catalog.token_url.trim().is_empty() {
                return Err(ConfigError::Missing("catalog.token_url (TOKEN_API_URL)"));
            }
        }
        if self.feed_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "feed_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
