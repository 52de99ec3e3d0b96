use anyhow::Result;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

use crate::database::models::{Team, TeamName};

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_external_id(&self, team_id: i64) -> Result<Option<Team>> {
        let team = sqlx::query_as::<_, Team>("SELECT * FROM teams WHERE team_id = $1")
            .bind(team_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(team)
    }

    pub async fn names_for_team(&self, team_pk: i64) -> Result<Vec<TeamName>> {
        let names = sqlx::query_as::<_, TeamName>(
            "SELECT * FROM team_names WHERE team_id = $1 ORDER BY name",
        )
        .bind(team_pk)
        .fetch_all(&self.pool)
        .await?;

        Ok(names)
    }

    /// Insert bare official teams for any unseen external ids and read
    /// the whole set back as an external-id -> pk lookup.
    pub async fn upsert_official(
        &self,
        conn: &mut PgConnection,
        team_ids: &[i64],
    ) -> Result<HashMap<i64, i64>> {
        sqlx::query(
            r#"
            INSERT INTO
                teams (team_id)
            SELECT
                UNNEST($1::bigint[])
            ON CONFLICT (team_id) DO NOTHING
            "#,
        )
        .bind(team_ids)
        .execute(&mut *conn)
        .await?;

        let rows: Vec<(i64, i64)> =
            sqlx::query_as("SELECT team_id, id FROM teams WHERE team_id = ANY($1)")
                .bind(team_ids)
                .fetch_all(&mut *conn)
                .await?;

        Ok(rows.into_iter().collect())
    }

    /// Bulk-insert (name, team) pairs for official teams. Conflicts are
    /// skipped, so teams keep accumulating historical names across
    /// scrapes without duplication.
    pub async fn insert_official_names(
        &self,
        conn: &mut PgConnection,
        pairs: &[(i64, String)],
    ) -> Result<()> {
        let team_pks: Vec<i64> = pairs.iter().map(|p| p.0).collect();
        let names: Vec<String> = pairs.iter().map(|p| p.1.clone()).collect();

        sqlx::query(
            r#"
            INSERT INTO
                team_names (name, team_id, guest)
            SELECT
                t.name, t.team_id, FALSE
            FROM
                UNNEST($1::text[], $2::bigint[]) AS t (name, team_id)
            ON CONFLICT (name, team_id) DO NOTHING
            "#,
        )
        .bind(&names)
        .bind(&team_pks)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Existing guest teams looked up by their (single, permanent) name.
    pub async fn find_guest_teams_by_names(
        &self,
        conn: &mut PgConnection,
        names: &[String],
    ) -> Result<HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT
                tn.name, t.id
            FROM
                teams t
            JOIN
                team_names tn ON tn.team_id = t.id
            WHERE
                tn.guest
                AND tn.name = ANY($1)
            "#,
        )
        .bind(names)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows.into_iter().collect())
    }

    /// Create one guest team together with its single name record.
    /// Guest teams have no natural key, so the pairing is done here
    /// explicitly rather than by zipping bulk-created rows.
    pub async fn create_guest_team(&self, conn: &mut PgConnection, name: &str) -> Result<i64> {
        let (team_pk,): (i64,) =
            sqlx::query_as("INSERT INTO teams DEFAULT VALUES RETURNING id")
                .fetch_one(&mut *conn)
                .await?;

        sqlx::query(
            r#"
            INSERT INTO
                team_names (name, team_id, guest)
            VALUES
                ($1, $2, TRUE)
            "#,
        )
        .bind(name)
        .bind(team_pk)
        .execute(&mut *conn)
        .await?;

        Ok(team_pk)
    }

    /// (team pk, display name) -> TeamName pk across the given teams.
    pub async fn team_name_map(
        &self,
        conn: &mut PgConnection,
        team_pks: &[i64],
    ) -> Result<HashMap<(i64, String), i64>> {
        let rows: Vec<(i64, String, i64)> =
            sqlx::query_as("SELECT team_id, name, id FROM team_names WHERE team_id = ANY($1)")
                .bind(team_pks)
                .fetch_all(&mut *conn)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(team_pk, name, id)| ((team_pk, name), id))
            .collect())
    }
}
