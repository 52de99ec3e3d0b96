//! Autoscrape lifecycle coordinator: the three units of work the beat
//! scheduler fires per recurring game slot. A slot cycles through
//! placeholder-created, scraping-active (self-terminating once the
//! engine resolves the placeholder), then either resolved or
//! orphaned-cleanup the morning after.

use anyhow::Result;
use chrono::{Duration, Local};

use crate::database::repositories::{EventRepository, TaskRepository};
use crate::services::scraper::{ReconcileError, ScrapeMode, ScraperService};

/// Fires once, an hour before a recurring game's scheduled start:
/// creates the bare event the autoscrape pass will later fill in.
/// Conflict-ignoring, so overlapping ticks cannot abort.
pub async fn generate_placeholder(events: &EventRepository, game_id: i64) -> Result<()> {
    let today = Local::now().date_naive();
    events.insert_placeholder(game_id, today).await?;

    log::info!("Created placeholder event for game {} on {}", game_id, today);

    Ok(())
}

/// Fires repeatedly inside the game's scrape window. Scrapes the venue
/// back to the most recent fully-recorded event (or yesterday, for a
/// venue with none), reconciles unattended, and disables its own
/// recurring task once the engine reports writes happened. A failed
/// attempt propagates without touching the task's enabled state.
pub async fn auto_scrape(
    service: &ScraperService,
    events: &EventRepository,
    tasks: &TaskRepository,
    game_id: i64,
    url: &str,
    task_name: &str,
) -> Result<bool, ReconcileError> {
    let today = Local::now().date_naive();

    let most_recent = events.latest_quizmastered_date(url).await?;
    log::info!("Most recent recorded event for {}: {:?}", url, most_recent);

    let end_date = most_recent.unwrap_or_else(|| today - Duration::days(1));

    let page = service.scrape_page(url, Some(end_date)).await?;

    if !service
        .reconcile(&page, url, ScrapeMode::Auto { game_id })
        .await?
    {
        // Venue has not posted results yet; keep polling.
        return Ok(false);
    }

    tasks.set_enabled(task_name, false).await?;
    log::info!(
        "Autoscrape for game {} completed; disabled task '{}'",
        game_id,
        task_name
    );

    Ok(true)
}

/// Fires once, at midnight the day after the game. A placeholder that
/// was created but never resolved (end_datetime still null) is deleted
/// as orphaned; otherwise the scrape task is re-enabled for next week.
pub async fn reenable_scraping(
    events: &EventRepository,
    tasks: &TaskRepository,
    game_id: i64,
    task_name: &str,
) -> Result<()> {
    let yesterday = Local::now().date_naive() - Duration::days(1);

    if let Some(orphan) = events.find_dangling_placeholder(game_id, yesterday).await? {
        events.delete(orphan.id).await?;
        log::warn!(
            "Deleted orphaned placeholder event {} for game {}",
            orphan.id,
            game_id
        );
    } else {
        tasks.set_enabled(task_name, true).await?;
        log::info!("Re-enabled scraping task '{}'", task_name);
    }

    Ok(())
}
