use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppError;
use crate::handlers::shared::ApiResponse;
use crate::services::{ScrapeMode, ScraperService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    pub venue_url: String,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullRescrapeRequest {
    pub venue_url: String,
}

/// Manual "scrape new data": cutoff defaults to the venue's latest
/// known event date.
pub async fn scrape_new_data(
    input: web::Json<ScrapeRequest>,
    service: web::Data<ScraperService>,
) -> Result<HttpResponse, AppError> {
    let request = input.into_inner();

    let page = service
        .scrape_page(&request.venue_url, request.end_date)
        .await?;
    service
        .reconcile(&page, &request.venue_url, ScrapeMode::Manual)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        None::<()>,
        "Scrape completed",
    )))
}

/// Manual "force full re-scrape": cutoff pinned to the epoch so the
/// extractor paginates the venue's entire history.
pub async fn force_full_rescrape(
    input: web::Json<FullRescrapeRequest>,
    service: web::Data<ScraperService>,
) -> Result<HttpResponse, AppError> {
    let request = input.into_inner();

    let page = service
        .scrape_page(&request.venue_url, Some(NaiveDate::default()))
        .await?;
    service
        .reconcile(&page, &request.venue_url, ScrapeMode::Manual)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        None::<()>,
        "Full re-scrape completed",
    )))
}
