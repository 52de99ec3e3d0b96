use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A team. Official teams carry the venue system's external id in
/// team_id; guest teams have team_id NULL and derive identity from their
/// single name.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub team_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A display name belonging to a team. Official teams accumulate names
/// as they rename over time; a guest team has exactly one.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamName {
    pub id: i64,
    pub name: String,
    pub team_id: i64,
    pub guest: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TeamEventParticipation {
    pub id: i64,
    pub team_id: i64,
    pub team_name_id: i64,
    pub event_id: i64,
    pub score: Option<i16>,
    pub table_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for the bulk participation step.
#[derive(Debug, Clone)]
pub struct NewParticipation {
    pub team_id: i64,
    pub team_name_id: i64,
    pub event_id: i64,
    pub score: i16,
}

/// A participation still awaiting its score, joined with enough team
/// identity to match it against scraped data.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UnscoredParticipation {
    pub id: i64,
    pub team_id: i64,
    pub external_team_id: Option<i64>,
    pub team_name: String,
}
