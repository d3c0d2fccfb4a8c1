use async_trait::async_trait;

use super::{CatalogError, CatalogSnapshot, CourseSource};
use crate::storage::Database;

/// Course data from the local `courses` table.
#[derive(Clone)]
pub struct LocalCatalog {
    db: Database,
}

impl LocalCatalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CourseSource for LocalCatalog {
    async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        let courses = self.db.list_courses().await?;
        let total_students = self.db.total_students().await?;
        let total_reviews = self.db.total_reviews().await?;

        Ok(CatalogSnapshot {
            courses,
            total_students,
            total_reviews,
        })
    }
}
