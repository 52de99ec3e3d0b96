use anyhow::Result;
use chrono::NaiveTime;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

use crate::database::models::GameInfo;

#[derive(Clone)]
pub struct GameRepository {
    pool: PgPool,
}

impl GameRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_info(&self, game_id: i64) -> Result<Option<GameInfo>> {
        let game = sqlx::query_as::<_, GameInfo>(
            r#"
            SELECT
                g.id,
                g.game_type_id,
                gt.name AS game_type_name,
                g.day,
                g.time,
                g.venue_id
            FROM
                games g
            JOIN
                game_types gt ON gt.id = g.game_type_id
            WHERE
                g.id = $1
            "#,
        )
        .bind(game_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(game)
    }

    /// Insert any missing game types and read the whole set back as a
    /// name -> id lookup.
    pub async fn upsert_game_types(
        &self,
        conn: &mut PgConnection,
        names: &[String],
    ) -> Result<HashMap<String, i64>> {
        sqlx::query(
            r#"
            INSERT INTO
                game_types (name)
            SELECT
                UNNEST($1::text[])
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(names)
        .execute(&mut *conn)
        .await?;

        let rows: Vec<(String, i64)> =
            sqlx::query_as("SELECT name, id FROM game_types WHERE name = ANY($1)")
                .bind(names)
                .fetch_all(&mut *conn)
                .await?;

        Ok(rows.into_iter().collect())
    }

    /// Bulk-insert official (type, day, time) slots for a venue, skipping
    /// ones that already exist.
    pub async fn insert_official_games(
        &self,
        conn: &mut PgConnection,
        venue_id: i64,
        slots: &[(i64, i16, NaiveTime)],
    ) -> Result<()> {
        let game_type_ids: Vec<i64> = slots.iter().map(|s| s.0).collect();
        let days: Vec<i16> = slots.iter().map(|s| s.1).collect();
        let times: Vec<NaiveTime> = slots.iter().map(|s| s.2).collect();

        sqlx::query(
            r#"
            INSERT INTO
                games (game_type_id, day, time, venue_id)
            SELECT
                t.game_type_id, t.day, t.time, $4
            FROM
                UNNEST($1::bigint[], $2::smallint[], $3::time[])
                    AS t (game_type_id, day, time)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&game_type_ids)
        .bind(&days)
        .bind(&times)
        .bind(venue_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Bulk-insert custom (day/time both NULL) games for a venue.
    pub async fn insert_custom_games(
        &self,
        conn: &mut PgConnection,
        venue_id: i64,
        game_type_ids: &[i64],
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO
                games (game_type_id, venue_id)
            SELECT
                UNNEST($1::bigint[]), $2
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(game_type_ids)
        .bind(venue_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Read back every game at the venue for the involved game types,
    /// joined with its type name, for the per-call matching lookup.
    pub async fn list_for_lookup(
        &self,
        conn: &mut PgConnection,
        venue_id: i64,
        game_type_ids: &[i64],
    ) -> Result<Vec<GameInfo>> {
        let games = sqlx::query_as::<_, GameInfo>(
            r#"
            SELECT
                g.id,
                g.game_type_id,
                gt.name AS game_type_name,
                g.day,
                g.time,
                g.venue_id
            FROM
                games g
            JOIN
                game_types gt ON gt.id = g.game_type_id
            WHERE
                g.venue_id = $1
                AND g.game_type_id = ANY($2)
            "#,
        )
        .bind(venue_id)
        .bind(game_type_ids)
        .fetch_all(&mut *conn)
        .await?;

        Ok(games)
    }
}
