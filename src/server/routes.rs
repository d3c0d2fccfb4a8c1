use axum::{
    extract::{rejection::FormRejection, State},
    response::Html,
    Form,
};
use chrono::Utc;
use std::sync::Arc;

use super::{error::AppError, AppState};
use crate::catalog::CatalogError;
use crate::render::IndexContext;
use crate::signup::{SignupForm, SignupOutcome};

/// Gather everything `index.html` needs.
///
/// A catalog failure fails the page; a feed failure only empties the post
/// list.
pub async fn build_index_context(state: &AppState) -> Result<IndexContext, CatalogError> {
    let snapshot = state.courses.snapshot().await?;
    let feed = state.feed.load().await;
    Ok(IndexContext::new(snapshot, feed, state.sitekey.clone()))
}

/// `GET /`
pub async fn index(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let ctx = build_index_context(&state).await?;
    tracing::debug!(
        courses = ctx.courses.len(),
        posts = ctx.feed.len(),
        "Rendering landing page"
    );
    Ok(Html(state.renderer.render_index(&ctx)?))
}

/// `POST /adicionar`
pub async fn subscribe(
    State(state): State<Arc<AppState>>,
    form: Result<Form<SignupForm>, FormRejection>,
) -> Result<Html<String>, AppError> {
    let Form(form) = form?;
    match state.signup.submit(form, Utc::now()).await? {
        SignupOutcome::Created(id) => tracing::info!(id, "Signup completed"),
        SignupOutcome::Updated => tracing::info!("Signup refreshed existing subscriber"),
    }
    Ok(Html(state.renderer.render_success()?))
}
