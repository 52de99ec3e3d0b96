use anyhow::Result;
use sqlx::{PgConnection, PgPool};

use crate::database::models::{PeriodicTask, TaskKind};

#[derive(Clone)]
pub struct TaskRepository {
    pool: PgPool,
}

impl TaskRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<PeriodicTask>> {
        let task = sqlx::query_as::<_, PeriodicTask>("SELECT * FROM periodic_tasks WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(task)
    }

    /// Flip a recurring task on or off by its lookup-key name. Returns
    /// whether a task with that name existed.
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE periodic_tasks
            SET
                enabled = $1,
                updated_at = NOW()
            WHERE
                name = $2
            "#,
        )
        .bind(enabled)
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Get-or-create a crontab row by its five-field schedule.
    pub async fn get_or_create_crontab(
        &self,
        conn: &mut PgConnection,
        minute: &str,
        hour: &str,
        day_of_week: &str,
    ) -> Result<i64> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO
                crontab_schedules (minute, hour, day_of_week)
            VALUES
                ($1, $2, $3)
            ON CONFLICT (minute, hour, day_of_week, day_of_month, month_of_year)
                DO UPDATE SET updated_at = NOW()
            RETURNING
                id
            "#,
        )
        .bind(minute)
        .bind(hour)
        .bind(day_of_week)
        .fetch_one(&mut *conn)
        .await?;

        Ok(id)
    }

    /// Create a periodic task if one with the same name does not exist.
    /// Existing tasks are left untouched, enabled state included.
    pub async fn get_or_create_task(
        &self,
        conn: &mut PgConnection,
        name: &str,
        kind: TaskKind,
        crontab_id: i64,
        kwargs: &str,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO
                periodic_tasks (name, task_kind, crontab_id, kwargs)
            VALUES
                ($1, $2, $3, $4)
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(kind)
        .bind(crontab_id)
        .bind(kwargs)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}
