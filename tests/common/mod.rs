use anyhow::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::PgPool;
use std::env;
use std::sync::Arc;

use quizhub_be::database::init_database;
use quizhub_be::scraper::{EventData, ExtractError, GameData, PageData, PageExtractor, TeamData, VenueData};
use quizhub_be::services::ScraperService;

pub const VENUE_URL: &str = "https://example.com/venues/the-crown";

// Test database wrapper. Tests exercising it are #[ignore]-gated and
// expect a live Postgres at DATABASE_URL; each test starts from a
// truncated schema.
pub struct TestDb {
    pub pool: PgPool,
}

impl TestDb {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://@localhost:5432/quizhub_test".to_string());
        let pool = init_database(&database_url).await?;

        let db = TestDb { pool };
        db.reset().await?;

        Ok(db)
    }

    pub async fn reset(&self) -> Result<()> {
        sqlx::query(
            r#"
            TRUNCATE
                venues, game_types, games, quizmasters, themes, events,
                teams, team_names, tables, team_event_participations,
                members, member_attendances, rounds, votes, glossary,
                crontab_schedules, periodic_tasks
            RESTART IDENTITY CASCADE
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// Extractor double returning one canned page.
pub struct MockExtractor {
    page: PageData,
}

#[async_trait]
impl PageExtractor for MockExtractor {
    async fn extract(
        &self,
        _venue_url: &str,
        _cutoff: Option<NaiveDate>,
    ) -> Result<PageData, ExtractError> {
        Ok(self.page.clone())
    }
}

pub fn scraper_service(pool: PgPool, page: PageData) -> ScraperService {
    ScraperService::new(pool, Arc::new(MockExtractor { page }), 2)
}

// Fixture builders

pub fn official_game(game_type: &str, day: i16, hour: u32, minute: u32) -> GameData {
    GameData::new(
        game_type,
        day,
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap(),
    )
    .unwrap()
}

pub fn team(team_id: Option<i64>, name: &str, score: i16) -> TeamData {
    TeamData::new(team_id, name, score).unwrap()
}

pub fn event(date: NaiveDate, game_type: &str, quizmaster: &str, teams: Vec<TeamData>) -> EventData {
    EventData::new(date, game_type, quizmaster, None, teams)
}

pub fn page(venue_name: &str, games: Vec<GameData>, events: Vec<EventData>) -> PageData {
    PageData::new(VenueData::new(venue_name, games), events)
}

/// A Monday 2026-08-24; weekday 0 in the Monday-based convention.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 8, 24).unwrap()
}

/// The first-scrape scenario: one official Monday game, one event with
/// an official team and a guest team.
pub fn monday_quiz_page() -> PageData {
    page(
        "The Crown",
        vec![official_game("PUB QUIZ", 0, 19, 0)],
        vec![event(
            monday(),
            "PUB QUIZ",
            "Alex",
            vec![
                team(Some(42), "Regulars", 80),
                team(None, "Walkers", 65),
            ],
        )],
    )
}

pub async fn count(pool: &PgPool, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(pool)
        .await
        .unwrap()
}
