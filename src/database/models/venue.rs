use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub last_scraped_at: Option<DateTime<Utc>>, // refreshed on every scrape
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
