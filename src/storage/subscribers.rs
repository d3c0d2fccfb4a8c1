use super::schema::Database;
use super::types::{DatabaseError, NewSubscriber, UpsertOutcome, Usuario};

impl Database {
    // ========================================================================
    // Subscriber Operations
    // ========================================================================

    /// Update the subscriber row for `sub.email`, inserting it when none exists.
    ///
    /// The update touches `nome`, `subscribed`, `data_hora` and `cod_rec`; blank
    /// `nome` or `cod_rec` values keep the stored ones. `gerou_cert` is never
    /// changed here.
    /// Both statements run in one transaction.
    pub async fn upsert_subscriber(
        &self,
        sub: &NewSubscriber,
    ) -> Result<UpsertOutcome, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE usuarios
            SET nome = COALESCE(NULLIF(?, ''), nome),
                subscribed = 1,
                data_hora = ?,
                cod_rec = COALESCE(NULLIF(?, ''), cod_rec)
            WHERE email = ?
        "#,
        )
        .bind(&sub.nome)
        .bind(sub.data_hora)
        .bind(&sub.cod_rec)
        .bind(&sub.email)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let outcome = if updated == 0 {
            let id = sqlx::query(
                r#"
                INSERT INTO usuarios (nome, email, subscribed, data_hora, cod_rec, gerou_cert)
                VALUES (?, ?, 1, ?, ?, 0)
            "#,
            )
            .bind(&sub.nome)
            .bind(&sub.email)
            .bind(sub.data_hora)
            .bind(&sub.cod_rec)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();
            UpsertOutcome::Inserted(id)
        } else {
            UpsertOutcome::Updated
        };

        tx.commit().await?;
        Ok(outcome)
    }

    /// Look up a subscriber by email
    pub async fn subscriber_by_email(&self, email: &str) -> Result<Option<Usuario>, DatabaseError> {
        let row = sqlx::query_as::<_, Usuario>(
            r#"
            SELECT id, nome, email, subscribed, data_hora, cod_rec, gerou_cert
            FROM usuarios
            WHERE email = ?
        "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn count_subscribers(&self) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM usuarios")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::open("sqlite::memory:").await.unwrap()
    }

    fn subscriber(email: &str, nome: &str, cod_rec: &str, data_hora: i64) -> NewSubscriber {
        NewSubscriber {
            nome: nome.to_string(),
            email: email.to_string(),
            cod_rec: cod_rec.to_string(),
            data_hora,
        }
    }

    #[tokio::test]
    async fn test_first_signup_inserts() {
        let db = test_db().await;

        let outcome = db
            .upsert_subscriber(&subscriber("ana@example.com", "Ana", "", 1_700_000_000))
            .await
            .unwrap();
        assert!(matches!(outcome, UpsertOutcome::Inserted(id) if id > 0));

        let row = db
            .subscriber_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.nome, "Ana");
        assert!(row.subscribed);
        assert!(!row.gerou_cert);
        assert_eq!(row.data_hora, 1_700_000_000);
    }

    #[tokio::test]
    async fn test_repeat_signup_updates_same_row() {
        let db = test_db().await;

        db.upsert_subscriber(&subscriber("ana@example.com", "Ana", "REF1", 100))
            .await
            .unwrap();
        let outcome = db
            .upsert_subscriber(&subscriber("ana@example.com", "Ana Maria", "", 200))
            .await
            .unwrap();

        assert_eq!(outcome, UpsertOutcome::Updated);
        assert_eq!(db.count_subscribers().await.unwrap(), 1);

        let row = db
            .subscriber_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.nome, "Ana Maria");
        assert_eq!(row.data_hora, 200);
        // Empty referral code keeps the stored one
        assert_eq!(row.cod_rec, "REF1");
    }

    #[tokio::test]
    async fn test_blank_name_keeps_stored_name() {
        let db = test_db().await;

        db.upsert_subscriber(&subscriber("ana@example.com", "Ana", "", 100))
            .await
            .unwrap();
        db.upsert_subscriber(&subscriber("ana@example.com", "", "", 200))
            .await
            .unwrap();

        let row = db
            .subscriber_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.nome, "Ana");
        assert_eq!(row.data_hora, 200);
    }

    #[tokio::test]
    async fn test_distinct_emails_get_distinct_rows() {
        let db = test_db().await;

        db.upsert_subscriber(&subscriber("a@example.com", "A", "", 1))
            .await
            .unwrap();
        db.upsert_subscriber(&subscriber("b@example.com", "B", "", 1))
            .await
            .unwrap();

        assert_eq!(db.count_subscribers().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_unknown_email_returns_none() {
        let db = test_db().await;
        assert!(db
            .subscriber_by_email("nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }
}
