mod common;

use chrono::{Datelike, Duration, Local, NaiveDate, NaiveTime};
use pretty_assertions::assert_eq;
use serial_test::serial;
use sqlx::PgPool;

use common::*;
use quizhub_be::database::repositories::{EventRepository, TaskRepository};
use quizhub_be::scraper::PageData;
use quizhub_be::services::scraper::ReconcileError;
use quizhub_be::services::schedule::{autoscrape_task_name, game_slug};
use quizhub_be::services::{ScrapeMode, autoscrape};

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn today_weekday() -> i16 {
    today().weekday().num_days_from_monday() as i16
}

/// An official "PUB QUIZ" game recurring on today's weekday, no events.
fn setup_page() -> PageData {
    page(
        "The Crown",
        vec![official_game("PUB QUIZ", today_weekday(), 19, 0)],
        vec![],
    )
}

/// Today's recap for that game: one official team, one guest.
fn recap_page() -> PageData {
    page(
        "The Crown",
        vec![official_game("PUB QUIZ", today_weekday(), 19, 0)],
        vec![event(
            today(),
            "PUB QUIZ",
            "Alex",
            vec![team(Some(42), "Regulars", 80), team(None, "Walkers", 65)],
        )],
    )
}

/// Manual-reconcile the venue and its game, then create the
/// placeholder. Returns the (game id, placeholder event id) pair.
async fn seed_placeholder(pool: &PgPool) -> (i64, i64) {
    let service = scraper_service(pool.clone(), setup_page());
    service
        .reconcile(&setup_page(), VENUE_URL, ScrapeMode::Manual)
        .await
        .expect("setup reconcile");

    let game_id: i64 = sqlx::query_scalar("SELECT id FROM games")
        .fetch_one(pool)
        .await
        .unwrap();

    let events = EventRepository::new(pool.clone());
    autoscrape::generate_placeholder(&events, game_id)
        .await
        .expect("placeholder");

    let event_id: i64 = sqlx::query_scalar("SELECT id FROM events")
        .fetch_one(pool)
        .await
        .unwrap();

    (game_id, event_id)
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres DATABASE_URL"]
async fn placeholder_generation_is_idempotent() {
    let db = TestDb::new().await.expect("test db");
    let (game_id, _) = seed_placeholder(&db.pool).await;

    let events = EventRepository::new(db.pool.clone());
    autoscrape::generate_placeholder(&events, game_id)
        .await
        .expect("second placeholder tick");

    assert_eq!(count(&db.pool, "events").await, 1);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres DATABASE_URL"]
async fn unattended_reconcile_resolves_the_placeholder_in_place() {
    let db = TestDb::new().await.expect("test db");
    let (game_id, placeholder_id) = seed_placeholder(&db.pool).await;

    let service = scraper_service(db.pool.clone(), recap_page());
    let wrote = service
        .reconcile(&recap_page(), VENUE_URL, ScrapeMode::Auto { game_id })
        .await
        .expect("auto reconcile");
    assert!(wrote);

    // Same row before and after, not a second event for the pair.
    assert_eq!(count(&db.pool, "events").await, 1);

    let (id, end_datetime, quizmaster_id): (
        i64,
        Option<chrono::DateTime<chrono::Utc>>,
        Option<i64>,
    ) = sqlx::query_as("SELECT id, end_datetime, quizmaster_id FROM events")
        .fetch_one(&db.pool)
        .await
        .unwrap();

    assert_eq!(id, placeholder_id);
    assert!(end_datetime.is_some());
    assert!(quizmaster_id.is_some());

    assert_eq!(count(&db.pool, "team_event_participations").await, 2);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres DATABASE_URL"]
async fn multiple_recaps_for_the_target_game_are_rejected() {
    let db = TestDb::new().await.expect("test db");
    let (game_id, placeholder_id) = seed_placeholder(&db.pool).await;

    // This week's and last week's recap land on the same weekday, so
    // both resolve to the target game.
    let two_weeks = page(
        "The Crown",
        vec![official_game("PUB QUIZ", today_weekday(), 19, 0)],
        vec![
            event(
                today(),
                "PUB QUIZ",
                "Alex",
                vec![team(Some(42), "Regulars", 80)],
            ),
            event(
                today() - Duration::days(7),
                "PUB QUIZ",
                "Alex",
                vec![team(None, "Walkers", 65)],
            ),
        ],
    );

    let service = scraper_service(db.pool.clone(), two_weeks.clone());
    let result = service
        .reconcile(&two_weeks, VENUE_URL, ScrapeMode::Auto { game_id })
        .await;

    assert!(matches!(
        result,
        Err(ReconcileError::AmbiguousAutoscrapeTarget)
    ));

    // Rolled back in full: the placeholder is still the only event and
    // still open, and no team data was written.
    assert_eq!(count(&db.pool, "events").await, 1);
    let end_datetime: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar("SELECT end_datetime FROM events WHERE id = $1")
            .bind(placeholder_id)
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert!(end_datetime.is_none());
    assert_eq!(count(&db.pool, "teams").await, 0);
    assert_eq!(count(&db.pool, "team_event_participations").await, 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres DATABASE_URL"]
async fn auto_reconcile_without_an_open_placeholder_fails() {
    let db = TestDb::new().await.expect("test db");

    // The game exists but no placeholder tick ever fired for it.
    let service = scraper_service(db.pool.clone(), setup_page());
    service
        .reconcile(&setup_page(), VENUE_URL, ScrapeMode::Manual)
        .await
        .expect("setup reconcile");

    let game_id: i64 = sqlx::query_scalar("SELECT id FROM games")
        .fetch_one(&db.pool)
        .await
        .unwrap();

    let service = scraper_service(db.pool.clone(), recap_page());
    let result = service
        .reconcile(&recap_page(), VENUE_URL, ScrapeMode::Auto { game_id })
        .await;

    assert!(matches!(
        result,
        Err(ReconcileError::PlaceholderNotFound { .. })
    ));

    // Nothing from the failed call survived, the quizmaster included.
    assert_eq!(count(&db.pool, "events").await, 0);
    assert_eq!(count(&db.pool, "quizmasters").await, 0);
    assert_eq!(count(&db.pool, "teams").await, 0);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres DATABASE_URL"]
async fn score_backfill_updates_seeded_participations() {
    let db = TestDb::new().await.expect("test db");
    let (game_id, placeholder_id) = seed_placeholder(&db.pool).await;

    // Attendance seeded manually ahead of the game, score pending.
    let (team_pk,): (i64,) =
        sqlx::query_as("INSERT INTO teams (team_id) VALUES (42) RETURNING id")
            .fetch_one(&db.pool)
            .await
            .unwrap();
    let (name_id,): (i64,) = sqlx::query_as(
        "INSERT INTO team_names (name, team_id, guest) VALUES ('Regulars', $1, FALSE) RETURNING id",
    )
    .bind(team_pk)
    .fetch_one(&db.pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO team_event_participations (team_id, team_name_id, event_id, score) VALUES ($1, $2, $3, NULL)",
    )
    .bind(team_pk)
    .bind(name_id)
    .bind(placeholder_id)
    .execute(&db.pool)
    .await
    .unwrap();

    let service = scraper_service(db.pool.clone(), recap_page());
    service
        .reconcile(&recap_page(), VENUE_URL, ScrapeMode::Auto { game_id })
        .await
        .expect("auto reconcile");

    let score: Option<i16> =
        sqlx::query_scalar("SELECT score FROM team_event_participations WHERE team_id = $1")
            .bind(team_pk)
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert_eq!(score, Some(80));
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres DATABASE_URL"]
async fn unmatched_seeded_participation_fails_and_rolls_back() {
    let db = TestDb::new().await.expect("test db");
    let (game_id, placeholder_id) = seed_placeholder(&db.pool).await;

    // Seeded under a name the scrape does not contain.
    let (team_pk,): (i64,) =
        sqlx::query_as("INSERT INTO teams (team_id) VALUES (42) RETURNING id")
            .fetch_one(&db.pool)
            .await
            .unwrap();
    let (name_id,): (i64,) = sqlx::query_as(
        "INSERT INTO team_names (name, team_id, guest) VALUES ('Old Name', $1, FALSE) RETURNING id",
    )
    .bind(team_pk)
    .fetch_one(&db.pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO team_event_participations (team_id, team_name_id, event_id, score) VALUES ($1, $2, $3, NULL)",
    )
    .bind(team_pk)
    .bind(name_id)
    .bind(placeholder_id)
    .execute(&db.pool)
    .await
    .unwrap();

    let service = scraper_service(db.pool.clone(), recap_page());
    let result = service
        .reconcile(&recap_page(), VENUE_URL, ScrapeMode::Auto { game_id })
        .await;

    assert!(matches!(result, Err(ReconcileError::ScoreMismatch { .. })));

    // The whole call rolled back: the placeholder is still open.
    let end_datetime: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar("SELECT end_datetime FROM events WHERE id = $1")
            .bind(placeholder_id)
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert!(end_datetime.is_none());

    let score: Option<i16> =
        sqlx::query_scalar("SELECT score FROM team_event_participations WHERE team_id = $1")
            .bind(team_pk)
            .fetch_one(&db.pool)
            .await
            .unwrap();
    assert!(score.is_none());
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres DATABASE_URL"]
async fn auto_scrape_disables_its_task_once_resolved() {
    let db = TestDb::new().await.expect("test db");
    let (game_id, _) = seed_placeholder(&db.pool).await;

    let slug = game_slug(
        "The Crown",
        "PUB QUIZ",
        today_weekday(),
        NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
    );
    let task_name = autoscrape_task_name(&slug);

    let events = EventRepository::new(db.pool.clone());
    let tasks = TaskRepository::new(db.pool.clone());
    let service = scraper_service(db.pool.clone(), recap_page());

    let resolved =
        autoscrape::auto_scrape(&service, &events, &tasks, game_id, VENUE_URL, &task_name)
            .await
            .expect("auto scrape");
    assert!(resolved);

    let task = tasks.find_by_name(&task_name).await.unwrap().expect("task");
    assert!(!task.enabled);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres DATABASE_URL"]
async fn auto_scrape_keeps_polling_while_results_are_missing() {
    let db = TestDb::new().await.expect("test db");
    let (game_id, _) = seed_placeholder(&db.pool).await;

    let slug = game_slug(
        "The Crown",
        "PUB QUIZ",
        today_weekday(),
        NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
    );
    let task_name = autoscrape_task_name(&slug);

    let events = EventRepository::new(db.pool.clone());
    let tasks = TaskRepository::new(db.pool.clone());
    // Venue has not posted results: the extractor returns no events.
    let service = scraper_service(db.pool.clone(), setup_page());

    let resolved =
        autoscrape::auto_scrape(&service, &events, &tasks, game_id, VENUE_URL, &task_name)
            .await
            .expect("auto scrape");
    assert!(!resolved);

    let task = tasks.find_by_name(&task_name).await.unwrap().expect("task");
    assert!(task.enabled);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres DATABASE_URL"]
async fn reenable_pass_deletes_a_dangling_placeholder() {
    let db = TestDb::new().await.expect("test db");

    let service = scraper_service(db.pool.clone(), setup_page());
    service
        .reconcile(&setup_page(), VENUE_URL, ScrapeMode::Manual)
        .await
        .expect("setup reconcile");

    let game_id: i64 = sqlx::query_scalar("SELECT id FROM games")
        .fetch_one(&db.pool)
        .await
        .unwrap();

    let slug = game_slug(
        "The Crown",
        "PUB QUIZ",
        today_weekday(),
        NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
    );
    let task_name = autoscrape_task_name(&slug);

    let events = EventRepository::new(db.pool.clone());
    let tasks = TaskRepository::new(db.pool.clone());
    tasks.set_enabled(&task_name, false).await.unwrap();

    // Yesterday's placeholder was never resolved.
    let yesterday = today() - Duration::days(1);
    events.insert_placeholder(game_id, yesterday).await.unwrap();

    autoscrape::reenable_scraping(&events, &tasks, game_id, &task_name)
        .await
        .expect("reenable pass");

    assert_eq!(count(&db.pool, "events").await, 0);

    // Cleanup surfaced the orphan; the task stays parked.
    let task = tasks.find_by_name(&task_name).await.unwrap().expect("task");
    assert!(!task.enabled);
}

#[tokio::test]
#[serial]
#[ignore = "requires a live Postgres DATABASE_URL"]
async fn reenable_pass_re_enables_after_a_clean_week() {
    let db = TestDb::new().await.expect("test db");

    let service = scraper_service(db.pool.clone(), setup_page());
    service
        .reconcile(&setup_page(), VENUE_URL, ScrapeMode::Manual)
        .await
        .expect("setup reconcile");

    let game_id: i64 = sqlx::query_scalar("SELECT id FROM games")
        .fetch_one(&db.pool)
        .await
        .unwrap();

    let slug = game_slug(
        "The Crown",
        "PUB QUIZ",
        today_weekday(),
        NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
    );
    let task_name = autoscrape_task_name(&slug);

    let events = EventRepository::new(db.pool.clone());
    let tasks = TaskRepository::new(db.pool.clone());
    tasks.set_enabled(&task_name, false).await.unwrap();

    autoscrape::reenable_scraping(&events, &tasks, game_id, &task_name)
        .await
        .expect("reenable pass");

    let task = tasks.find_by_name(&task_name).await.unwrap().expect("task");
    assert!(task.enabled);
}
