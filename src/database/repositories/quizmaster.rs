use anyhow::Result;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

use crate::database::models::Quizmaster;

#[derive(Clone)]
pub struct QuizmasterRepository {
    pool: PgPool,
}

impl QuizmasterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Quizmaster>> {
        let quizmaster =
            sqlx::query_as::<_, Quizmaster>("SELECT * FROM quizmasters WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;

        Ok(quizmaster)
    }

    /// Insert any missing quizmasters and read the set back as a
    /// name -> id lookup.
    pub async fn upsert_names(
        &self,
        conn: &mut PgConnection,
        names: &[String],
    ) -> Result<HashMap<String, i64>> {
        sqlx::query(
            r#"
            INSERT INTO
                quizmasters (name)
            SELECT
                UNNEST($1::text[])
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(names)
        .execute(&mut *conn)
        .await?;

        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT name, id FROM quizmasters WHERE name = ANY($1)")
                .bind(names)
                .fetch_all(&mut *conn)
                .await?;

        Ok(rows.into_iter().collect())
    }
}
