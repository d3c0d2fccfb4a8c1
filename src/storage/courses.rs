use sqlx::QueryBuilder;

use super::schema::Database;
use super::types::{CourseData, DatabaseError};

impl Database {
    // ========================================================================
    // Course Operations
    // ========================================================================

    /// All mirrored courses, ordered by catalog id
    pub async fn list_courses(&self) -> Result<Vec<CourseData>, DatabaseError> {
        let courses = sqlx::query_as::<_, CourseData>(
            r#"
            SELECT course_id, title, rating, num_reviews, num_students, hours,
                   discount_url, image_url
            FROM courses
            ORDER BY course_id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    /// Sum of `num_students` over all courses (0 for an empty table)
    pub async fn total_students(&self) -> Result<i64, DatabaseError> {
        let (sum,): (i64,) = sqlx::query_as("SELECT COALESCE(SUM(num_students), 0) FROM courses")
            .fetch_one(&self.pool)
            .await?;
        Ok(sum)
    }

    /// Sum of `num_reviews` over all courses (0 for an empty table)
    pub async fn total_reviews(&self) -> Result<i64, DatabaseError> {
        let (sum,): (i64,) = sqlx::query_as("SELECT COALESCE(SUM(num_reviews), 0) FROM courses")
            .fetch_one(&self.pool)
            .await?;
        Ok(sum)
    }

    /// Replace the mirrored catalog with `courses` in a single transaction.
    ///
    /// Returns the number of rows written. Duplicate ids in the input keep the
    /// last occurrence.
    pub async fn replace_courses(&self, courses: &[CourseData]) -> Result<usize, DatabaseError> {
        const BATCH_SIZE: usize = 100;
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM courses").execute(&mut *tx).await?;

        for chunk in courses.chunks(BATCH_SIZE) {
            let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
                "INSERT OR REPLACE INTO courses (course_id, title, rating, num_reviews, \
                 num_students, hours, discount_url, image_url) ",
            );

            builder.push_values(chunk, |mut b, course| {
                b.push_bind(course.course_id)
                    .push_bind(&course.title)
                    .push_bind(course.rating)
                    .push_bind(course.num_reviews)
                    .push_bind(course.num_students)
                    .push_bind(course.hours)
                    .push_bind(&course.discount_url)
                    .push_bind(&course.image_url);
            });

            builder.build().execute(&mut *tx).await?;
        }

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM courses")
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(count as usize)
    }
}
