use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use std::str::FromStr;
use std::time::Duration;

use super::types::DatabaseError;

// ============================================================================
// Database
// ============================================================================

#[derive(Clone)]
pub struct Database {
    pub(crate) pool: SqlitePool,
}

impl Database {
    /// Open a connection pool for `dsn` and run migrations.
    ///
    /// `dsn` is a sqlx SQLite URL such as `sqlite:academy.db` or
    /// `sqlite::memory:`. The database file is created when missing.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::InvalidDsn` if the DSN cannot be parsed,
    /// `DatabaseError::Migration` if the schema cannot be created and
    /// `DatabaseError::Other` for connection failures.
    pub async fn open(dsn: &str) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(dsn)
            .map_err(|e| DatabaseError::InvalidDsn(e.to_string()))?
            .create_if_missing(true)
            .pragma("busy_timeout", "5000");

        // An in-memory database lives only as long as its connections; a single
        // connection keeps every query on the same data.
        let max_connections = if dsn.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.migrate()
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        tracing::debug!(max_connections, "Database opened");
        Ok(db)
    }

    /// Run database migrations atomically within a transaction.
    ///
    /// All statements use `IF NOT EXISTS`, so re-running on an existing
    /// database is a no-op.
    async fn migrate(&self) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS usuarios (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                nome TEXT NOT NULL DEFAULT '',
                email TEXT NOT NULL,
                subscribed INTEGER NOT NULL DEFAULT 0,
                data_hora INTEGER NOT NULL,
                cod_rec TEXT NOT NULL DEFAULT '',
                gerou_cert INTEGER NOT NULL DEFAULT 0
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS idx_usuarios_email ON usuarios(email)")
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS courses (
                course_id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                rating REAL NOT NULL DEFAULT 0,
                num_reviews INTEGER NOT NULL DEFAULT 0,
                num_students INTEGER NOT NULL DEFAULT 0,
                hours REAL NOT NULL DEFAULT 0,
                discount_url TEXT NOT NULL DEFAULT '',
                image_url TEXT NOT NULL DEFAULT ''
            )
        "#,
        )
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
