//! Course data for the landing page.
//!
//! [`CourseSource`] is the one capability the page needs: the course listing
//! plus the two aggregate counters. Two implementations exist and one is
//! chosen when the server starts:
//!
//! - [`RemoteCatalog`] - the catalog API, authorized by a client-credentials
//!   token from [`TokenProvider`]
//! - [`LocalCatalog`] - the `courses` table, filled by [`sync_to_database`]

mod local;
mod remote;
mod token;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::storage::{CourseData, Database, DatabaseError};

pub use local::LocalCatalog;
pub use remote::RemoteCatalog;
pub use token::{TokenError, TokenProvider};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Access token unavailable: {0}")]
    Token(#[from] TokenError),
    #[error("Catalog request timed out")]
    Timeout,
    #[error("Catalog request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Catalog returned status {0}")]
    HttpStatus(u16),
    #[error("Catalog response could not be decoded: {0}")]
    Decode(String),
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl CatalogError {
    /// True when the failure is the upstream taking too long rather than
    /// answering badly.
    pub fn is_timeout(&self) -> bool {
        match self {
            CatalogError::Timeout | CatalogError::Token(TokenError::Timeout) => true,
            CatalogError::Network(e) => e.is_timeout(),
            CatalogError::Token(TokenError::Network(e)) => e.is_timeout(),
            _ => false,
        }
    }
}

/// Courses plus the aggregate counters shown on the landing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CatalogSnapshot {
    pub courses: Vec<CourseData>,
    pub total_students: i64,
    pub total_reviews: i64,
}

#[async_trait]
pub trait CourseSource: Send + Sync {
    /// Current listing and totals
    async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError>;
}

/// Copy the remote listing into the local `courses` table.
///
/// Returns the number of courses stored. The local totals are sums over the
/// stored rows, so they can differ from the remote counters.
pub async fn sync_to_database(
    remote: &RemoteCatalog,
    db: &Database,
) -> Result<usize, CatalogError> {
    let snapshot = remote.snapshot().await?;
    let stored = db.replace_courses(&snapshot.courses).await?;

    tracing::info!(
        courses = stored,
        remote_students = snapshot.total_students,
        remote_reviews = snapshot.total_reviews,
        "Catalog synced to database"
    );
    Ok(stored)
}
