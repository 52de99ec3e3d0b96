//! Trigger endpoints for the three recurring-job kinds. The external
//! beat process reads the persisted tasks and posts their kwargs here.

use actix_web::{HttpResponse, web};

use crate::database::repositories::{EventRepository, TaskRepository};
use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::ScraperService;
use crate::services::autoscrape;
use crate::services::schedule::{AutoScrapeArgs, PlaceholderArgs, ReenableArgs};

pub async fn trigger_placeholder(
    input: web::Json<PlaceholderArgs>,
    events: web::Data<EventRepository>,
) -> Result<HttpResponse, AppError> {
    autoscrape::generate_placeholder(&events, input.game_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        None::<()>,
        "Placeholder event created",
    )))
}

pub async fn trigger_autoscrape(
    input: web::Json<AutoScrapeArgs>,
    service: web::Data<ScraperService>,
    events: web::Data<EventRepository>,
    tasks: web::Data<TaskRepository>,
) -> Result<HttpResponse, AppError> {
    let args = input.into_inner();

    let resolved = autoscrape::auto_scrape(
        &service,
        &events,
        &tasks,
        args.game_id,
        &args.url,
        &args.task_name,
    )
    .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(serde_json::json!({
        "resolved": resolved
    }))))
}

pub async fn trigger_reenable(
    input: web::Json<ReenableArgs>,
    events: web::Data<EventRepository>,
    tasks: web::Data<TaskRepository>,
) -> Result<HttpResponse, AppError> {
    let args = input.into_inner();

    autoscrape::reenable_scraping(&events, &tasks, args.game_id, &args.task_name).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        None::<()>,
        "Re-enable pass completed",
    )))
}
