//! SQLite persistence for subscribers and the mirrored course catalog.

mod courses;
mod schema;
mod subscribers;
mod types;

pub use schema::Database;
pub use types::{CourseData, DatabaseError, NewSubscriber, UpsertOutcome, Usuario};
