use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Quizmaster {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One concrete occurrence of a game on a date.
///
/// A placeholder event (created ahead of an autoscrape pass) has
/// quizmaster_id and end_datetime both NULL; the pass that resolves it
/// fills in both.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub game_id: i64,
    pub date: NaiveDate,
    pub end_datetime: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub quizmaster_id: Option<i64>,
    pub theme_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the bulk event-creation step.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub game_id: i64,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub quizmaster_id: i64,
}
