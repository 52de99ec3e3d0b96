use anyhow::Result;
use sqlx::{PgConnection, PgPool};

use crate::database::models::{NewParticipation, TeamEventParticipation, UnscoredParticipation};

#[derive(Clone)]
pub struct ParticipationRepository {
    pool: PgPool,
}

impl ParticipationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_event(&self, event_id: i64) -> Result<Vec<TeamEventParticipation>> {
        let participations = sqlx::query_as::<_, TeamEventParticipation>(
            "SELECT * FROM team_event_participations WHERE event_id = $1 ORDER BY score DESC",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(participations)
    }

    /// Lock the participations for an event that still lack a score,
    /// joined with team identity for matching against scraped data.
    /// Only the participation rows are locked, not the joined teams.
    pub async fn lock_unscored(
        &self,
        conn: &mut PgConnection,
        event_id: i64,
    ) -> Result<Vec<UnscoredParticipation>> {
        let rows = sqlx::query_as::<_, UnscoredParticipation>(
            r#"
            SELECT
                tep.id,
                tep.team_id,
                t.team_id AS external_team_id,
                tn.name AS team_name
            FROM
                team_event_participations tep
            JOIN
                teams t ON t.id = tep.team_id
            JOIN
                team_names tn ON tn.id = tep.team_name_id
            WHERE
                tep.event_id = $1
                AND tep.score IS NULL
            FOR UPDATE OF tep
            "#,
        )
        .bind(event_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(rows)
    }

    pub async fn set_score(
        &self,
        conn: &mut PgConnection,
        participation_id: i64,
        score: i16,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE team_event_participations
            SET
                score = $1,
                updated_at = NOW()
            WHERE
                id = $2
            "#,
        )
        .bind(score)
        .bind(participation_id)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Bulk-insert participations, skipping (team, event) pairs that
    /// already exist so a re-scrape of fully-persisted events is a no-op.
    pub async fn bulk_insert(
        &self,
        conn: &mut PgConnection,
        participations: &[NewParticipation],
    ) -> Result<()> {
        let team_ids: Vec<i64> = participations.iter().map(|p| p.team_id).collect();
        let team_name_ids: Vec<i64> = participations.iter().map(|p| p.team_name_id).collect();
        let event_ids: Vec<i64> = participations.iter().map(|p| p.event_id).collect();
        let scores: Vec<i16> = participations.iter().map(|p| p.score).collect();

        sqlx::query(
            r#"
            INSERT INTO
                team_event_participations (team_id, team_name_id, event_id, score)
            SELECT
                t.team_id, t.team_name_id, t.event_id, t.score
            FROM
                UNNEST($1::bigint[], $2::bigint[], $3::bigint[], $4::smallint[])
                    AS t (team_id, team_name_id, event_id, score)
            ON CONFLICT (team_id, event_id) DO NOTHING
            "#,
        )
        .bind(&team_ids)
        .bind(&team_name_ids)
        .bind(&event_ids)
        .bind(&scores)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
