//! Scheduling window calculation and periodic-task sync for official
//! games. The tasks live in the database; the external beat process
//! reads them and fires the /api/v1/tasks endpoints.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;

use crate::database::models::{GameInfo, TaskKind, Venue};
use crate::database::repositories::TaskRepository;
use crate::services::scraper::ReconcileError;

pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Task kwargs, stored as JSON on the periodic task and mirrored by the
/// trigger endpoints' request bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderArgs {
    pub game_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoScrapeArgs {
    pub game_id: i64,
    pub url: String,
    pub task_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReenableArgs {
    pub game_id: i64,
    pub task_name: String,
}

/// The cron hour range for a game's scrape window.
///
/// Scraping runs for two hours starting an hour after the game starts,
/// rounded to the nearest hour (30 minutes rounds up). Games that get
/// rounded up keep an extra hour of window, since their effective start
/// is itself delayed.
///
/// A game at 19:00-19:29 scrapes over "20-21"; one at 19:30-19:59 over
/// "20-22". Start times of 21:30 or later are not supported.
pub fn crontab_hours(game_time: NaiveTime) -> Result<String, ReconcileError> {
    let (hour, minute) = (game_time.hour(), game_time.minute());

    if (hour, minute) >= (21, 30) {
        return Err(ReconcileError::UnsupportedGameTime(game_time));
    }

    if minute < 30 {
        Ok(format!("{}-{}", hour + 1, hour + 2))
    } else {
        Ok(format!("{}-{}", hour + 1, hour + 3))
    }
}

/// Convert our 0=Monday day plus an offset in days to cron's 0=Sunday
/// convention.
pub fn cron_day_of_week(day: i16, days_later: i16) -> String {
    ((day + 1 + days_later) % 7).to_string()
}

/// Human-readable slug identifying one official game slot; the task
/// names derive from it and double as the enable/disable lookup keys.
pub fn game_slug(venue_name: &str, game_type: &str, day: i16, time: NaiveTime) -> String {
    format!(
        "{} | {}, {}s at {}",
        venue_name,
        game_type,
        DAY_NAMES[day as usize],
        time.format("%H:%M")
    )
}

pub fn placeholder_task_name(slug: &str) -> String {
    format!("{} - Generate placeholder event", slug)
}

pub fn autoscrape_task_name(slug: &str) -> String {
    format!("{} - Auto scrape", slug)
}

pub fn reenable_task_name(slug: &str) -> String {
    format!("{} - Re-enable scraping", slug)
}

/// Ensure the three recurring tasks exist for each official game:
/// placeholder generation an hour before start, the auto-scrape window
/// per `crontab_hours`, and the midnight-after re-enable pass. Runs
/// inside the reconcile transaction; existing tasks are left untouched.
pub async fn sync_game_tasks(
    conn: &mut PgConnection,
    tasks: &TaskRepository,
    venue: &Venue,
    games: &[&GameInfo],
    scrape_interval: u32,
) -> Result<(), ReconcileError> {
    let mut synced = 0;

    for game in games {
        let (Some(day), Some(time)) = (game.day, game.time) else {
            return Err(ReconcileError::Storage(anyhow::anyhow!(
                "game {} must have both day and time set to sync",
                game.id
            )));
        };

        // Placeholder generation fires at hour-1; a pre-1:00 start has
        // no slot for it.
        if time.hour() == 0 {
            return Err(ReconcileError::NoPlaceholderSlot(time));
        }

        let slug = game_slug(&venue.name, &game.game_type_name, day, time);
        let scrape_name = autoscrape_task_name(&slug);

        let placeholder_cron = tasks
            .get_or_create_crontab(
                &mut *conn,
                &time.minute().to_string(),
                &(time.hour() - 1).to_string(),
                &cron_day_of_week(day, 0),
            )
            .await?;

        let scrape_cron = tasks
            .get_or_create_crontab(
                &mut *conn,
                &format!("*/{}", scrape_interval),
                &crontab_hours(time)?,
                &cron_day_of_week(day, 0),
            )
            .await?;

        let reenable_cron = tasks
            .get_or_create_crontab(&mut *conn, "0", "0", &cron_day_of_week(day, 1))
            .await?;

        let placeholder_kwargs =
            serde_json::to_string(&PlaceholderArgs { game_id: game.id })
                .map_err(anyhow::Error::from)?;
        tasks
            .get_or_create_task(
                &mut *conn,
                &placeholder_task_name(&slug),
                TaskKind::GeneratePlaceholderEvent,
                placeholder_cron,
                &placeholder_kwargs,
            )
            .await?;

        let scrape_kwargs = serde_json::to_string(&AutoScrapeArgs {
            game_id: game.id,
            url: venue.url.clone(),
            task_name: scrape_name.clone(),
        })
        .map_err(anyhow::Error::from)?;
        tasks
            .get_or_create_task(
                &mut *conn,
                &scrape_name,
                TaskKind::AutoScrape,
                scrape_cron,
                &scrape_kwargs,
            )
            .await?;

        let reenable_kwargs = serde_json::to_string(&ReenableArgs {
            game_id: game.id,
            task_name: scrape_name,
        })
        .map_err(anyhow::Error::from)?;
        tasks
            .get_or_create_task(
                &mut *conn,
                &reenable_task_name(&slug),
                TaskKind::ReenableScraping,
                reenable_cron,
                &reenable_kwargs,
            )
            .await?;

        synced += 1;
    }

    log::info!("Synced {} games with periodic tasks", synced);

    Ok(())
}
