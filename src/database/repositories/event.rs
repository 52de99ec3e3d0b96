use anyhow::Result;
use chrono::NaiveDate;
use sqlx::{PgConnection, PgPool};
use std::collections::HashMap;

use crate::database::models::{Event, NewEvent};

#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Date of the most recent event at the venue, scraped or not. Used
    /// as the default cutoff for manual scrapes.
    pub async fn latest_event_date(&self, venue_url: &str) -> Result<Option<NaiveDate>> {
        let date: Option<(NaiveDate,)> = sqlx::query_as(
            r#"
            SELECT
                e.date
            FROM
                events e
            JOIN
                games g ON g.id = e.game_id
            JOIN
                venues v ON v.id = g.venue_id
            WHERE
                v.url = $1
            ORDER BY
                e.date DESC
            LIMIT 1
            "#,
        )
        .bind(venue_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(date.map(|d| d.0))
    }

    /// Date of the most recent fully-quizmastered event at the venue.
    /// Placeholder events (quizmaster NULL) do not count; the autoscrape
    /// pass uses this as its lookback cutoff.
    pub async fn latest_quizmastered_date(&self, venue_url: &str) -> Result<Option<NaiveDate>> {
        let date: Option<(NaiveDate,)> = sqlx::query_as(
            r#"
            SELECT
                e.date
            FROM
                events e
            JOIN
                games g ON g.id = e.game_id
            JOIN
                venues v ON v.id = g.venue_id
            WHERE
                v.url = $1
                AND e.quizmaster_id IS NOT NULL
            ORDER BY
                e.date DESC
            LIMIT 1
            "#,
        )
        .bind(venue_url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(date.map(|d| d.0))
    }

    /// Create the bare placeholder event an autoscrape pass will later
    /// fill in. Conflict-ignoring so back-to-back ticks cannot abort.
    pub async fn insert_placeholder(&self, game_id: i64, date: NaiveDate) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO
                events (game_id, date)
            VALUES
                ($1, $2)
            ON CONFLICT (game_id, date) DO NOTHING
            "#,
        )
        .bind(game_id)
        .bind(date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// A placeholder that was created but never resolved: end_datetime
    /// still NULL on the given date.
    pub async fn find_dangling_placeholder(
        &self,
        game_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT
                *
            FROM
                events
            WHERE
                game_id = $1
                AND date = $2
                AND end_datetime IS NULL
            "#,
        )
        .bind(game_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(event)
    }

    pub async fn delete(&self, event_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(event_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Lock the still-open placeholder row for the game on the given
    /// date. The row lock is what keeps two overlapping autoscrape ticks
    /// from resolving the same placeholder twice.
    pub async fn lock_open_placeholder(
        &self,
        conn: &mut PgConnection,
        game_id: i64,
        date: NaiveDate,
    ) -> Result<Option<Event>> {
        let event = sqlx::query_as::<_, Event>(
            r#"
            SELECT
                *
            FROM
                events
            WHERE
                game_id = $1
                AND date = $2
                AND quizmaster_id IS NULL
            FOR UPDATE
            "#,
        )
        .bind(game_id)
        .bind(date)
        .fetch_optional(&mut *conn)
        .await?;

        Ok(event)
    }

    /// Fill in a resolved placeholder: end_datetime marks scraping
    /// completion.
    pub async fn resolve_placeholder(
        &self,
        conn: &mut PgConnection,
        event_id: i64,
        description: Option<&str>,
        quizmaster_id: i64,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE events
            SET
                end_datetime = NOW(),
                description = $1,
                quizmaster_id = $2,
                updated_at = NOW()
            WHERE
                id = $3
            "#,
        )
        .bind(description)
        .bind(quizmaster_id)
        .bind(event_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Bulk-insert scraped events, skipping (game, date) pairs that
    /// already exist.
    pub async fn bulk_insert(&self, conn: &mut PgConnection, events: &[NewEvent]) -> Result<()> {
        let game_ids: Vec<i64> = events.iter().map(|e| e.game_id).collect();
        let dates: Vec<NaiveDate> = events.iter().map(|e| e.date).collect();
        let descriptions: Vec<Option<String>> =
            events.iter().map(|e| e.description.clone()).collect();
        let quizmaster_ids: Vec<i64> = events.iter().map(|e| e.quizmaster_id).collect();

        sqlx::query(
            r#"
            INSERT INTO
                events (game_id, date, description, quizmaster_id)
            SELECT
                t.game_id, t.date, t.description, t.quizmaster_id
            FROM
                UNNEST($1::bigint[], $2::date[], $3::text[], $4::bigint[])
                    AS t (game_id, date, description, quizmaster_id)
            ON CONFLICT (game_id, date) DO NOTHING
            "#,
        )
        .bind(&game_ids)
        .bind(&dates)
        .bind(&descriptions)
        .bind(&quizmaster_ids)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Read back the events matching the scraped set as a
    /// (game id, date) -> event id lookup.
    pub async fn map_by_game_and_date(
        &self,
        conn: &mut PgConnection,
        keys: &[(i64, NaiveDate)],
    ) -> Result<HashMap<(i64, NaiveDate), i64>> {
        let game_ids: Vec<i64> = keys.iter().map(|k| k.0).collect();
        let dates: Vec<NaiveDate> = keys.iter().map(|k| k.1).collect();

        let rows: Vec<(i64, NaiveDate, i64)> = sqlx::query_as(
            r#"
            SELECT
                e.game_id, e.date, e.id
            FROM
                events e
            JOIN
                UNNEST($1::bigint[], $2::date[]) AS t (game_id, date)
                ON t.game_id = e.game_id AND t.date = e.date
            "#,
        )
        .bind(&game_ids)
        .bind(&dates)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(game_id, date, id)| ((game_id, date), id))
            .collect())
    }
}
