use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CrontabSchedule {
    pub id: i64,
    pub minute: String,
    pub hour: String,
    pub day_of_week: String,
    pub day_of_month: String,
    pub month_of_year: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PeriodicTask {
    pub id: i64,
    pub name: String,
    pub task_kind: TaskKind,
    pub crontab_id: i64,
    pub kwargs: String, // JSON as String
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The three recurring-job kinds the beat scheduler knows how to fire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    GeneratePlaceholderEvent,
    AutoScrape,
    ReenableScraping,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskKind::GeneratePlaceholderEvent => "generate_placeholder_event",
            TaskKind::AutoScrape => "auto_scrape",
            TaskKind::ReenableScraping => "reenable_scraping",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for TaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generate_placeholder_event" => Ok(TaskKind::GeneratePlaceholderEvent),
            "auto_scrape" => Ok(TaskKind::AutoScrape),
            "reenable_scraping" => Ok(TaskKind::ReenableScraping),
            _ => Err(format!("Invalid TaskKind: {}", s)),
        }
    }
}

impl sqlx::Type<sqlx::Postgres> for TaskKind {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }
}

impl<'q> sqlx::Encode<'q, sqlx::Postgres> for TaskKind {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        let s = self.to_string();
        <String as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&s, buf)
    }
}

impl<'r> sqlx::Decode<'r, sqlx::Postgres> for TaskKind {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        TaskKind::from_str(&s).map_err(Into::into)
    }
}
