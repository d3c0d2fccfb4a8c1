//! HTML rendering over the template directory.
//!
//! Templates are loaded lazily from disk by name. `.html` templates are
//! auto-escaped; the feed description is marked `|safe` in `index.html`.
use minijinja::Environment;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use crate::catalog::CatalogSnapshot;
use crate::feed::FeedItem;
use crate::storage::CourseData;

pub const INDEX_TEMPLATE: &str = "index.html";
pub const SUCCESS_TEMPLATE: &str = "sucesso.html";
pub const WELCOME_TEMPLATE: &str = "boasvindas.html";

pub type RenderError = minijinja::Error;

/// Context for `index.html`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexContext {
    pub courses: Vec<CourseData>,
    pub feed: Vec<FeedItem>,
    #[serde(rename = "totalStudents")]
    pub total_students: i64,
    #[serde(rename = "totalReviews")]
    pub total_reviews: i64,
    pub sitekey: String,
}

impl IndexContext {
    pub fn new(snapshot: CatalogSnapshot, feed: Vec<FeedItem>, sitekey: impl Into<String>) -> Self {
        Self {
            courses: snapshot.courses,
            feed,
            total_students: snapshot.total_students,
            total_reviews: snapshot.total_reviews,
            sitekey: sitekey.into(),
        }
    }
}

/// Context for `boasvindas.html`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct WelcomeContext<'a> {
    pub nome: &'a str,
    pub email: &'a str,
    pub site: &'a str,
}

/// Shared, cheaply cloneable template environment.
#[derive(Clone)]
pub struct Renderer {
    env: Arc<Environment<'static>>,
}

impl Renderer {
    /// Templates are read from `dir` on first use.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir.as_ref()));
        Self { env: Arc::new(env) }
    }

    pub fn render_index(&self, ctx: &IndexContext) -> Result<String, RenderError> {
        self.render(INDEX_TEMPLATE, ctx)
    }

    pub fn render_success(&self) -> Result<String, RenderError> {
        self.render(SUCCESS_TEMPLATE, minijinja::context! {})
    }

    pub fn render_welcome(&self, ctx: &WelcomeContext<'_>) -> Result<String, RenderError> {
        self.render(WELCOME_TEMPLATE, ctx)
    }

    fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, RenderError> {
        self.env.get_template(name)?.render(ctx)
    }
}
