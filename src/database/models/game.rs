use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GameType {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A game slot at a venue. Official games carry a recurring (day, time)
/// pair; custom/unofficial games carry neither. day is 0=Monday, 6=Sunday.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: i64,
    pub game_type_id: i64,
    pub day: Option<i16>,
    pub time: Option<NaiveTime>,
    pub venue_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Game joined with its game-type name, as read back for the per-call
/// matching lookup.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GameInfo {
    pub id: i64,
    pub game_type_id: i64,
    pub game_type_name: String,
    pub day: Option<i16>,
    pub time: Option<NaiveTime>,
    pub venue_id: i64,
}

impl GameInfo {
    pub fn is_official(&self) -> bool {
        self.day.is_some() && self.time.is_some()
    }
}
