use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// The DSN could not be parsed into connection options
    #[error("Invalid database DSN: {0}")]
    InvalidDsn(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

// ============================================================================
// Data Structures
// ============================================================================

/// A course as served by the catalog API and mirrored in the `courses` table.
///
/// Field names match the catalog's JSON payload. Missing JSON fields decode to
/// zero values rather than failing the whole listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(default)]
pub struct CourseData {
    pub course_id: i64,
    pub title: String,
    pub rating: f64,
    pub num_reviews: i64,
    pub num_students: i64,
    pub hours: f64,
    pub discount_url: String,
    pub image_url: String,
}

/// A newsletter subscriber row.
///
/// `email` is the business key: signups update the existing row for an address
/// instead of creating a second one.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Usuario {
    pub id: i64,
    pub nome: String,
    pub email: String,
    pub subscribed: bool,
    /// Unix timestamp (seconds, UTC) of the latest signup
    pub data_hora: i64,
    pub cod_rec: String,
    pub gerou_cert: bool,
}

/// Values written by a signup.
#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub nome: String,
    pub email: String,
    pub cod_rec: String,
    pub data_hora: i64,
}

/// What an upsert did to the `usuarios` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// A new row was inserted with this id
    Inserted(i64),
    /// An existing row for the same email was updated
    Updated,
}
