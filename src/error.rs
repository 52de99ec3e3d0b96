use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::handlers::shared::ApiResponse;
use crate::scraper::extract::ExtractError;
use crate::services::scraper::ReconcileError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unprocessable: {0}")]
    Unprocessable(String),

    #[error("Upstream extractor error: {0}")]
    ExtractorError(String),

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::ExtractorError(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        log::error!(
            "Request failed with status {}: {}",
            status_code,
            error_message
        );

        let response_body = ApiResponse::<()>::error(&error_message);

        HttpResponse::build(status_code).json(response_body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        log::error!("Database error: {}", error);
        AppError::DatabaseError(error)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        log::error!("Anyhow error: {}", error);

        // Check if this is a sqlx::Error and handle it appropriately
        if error.is::<sqlx::Error>() {
            // Downcast the error to sqlx::Error by consuming the anyhow::Error
            match error.downcast::<sqlx::Error>() {
                Ok(sqlx_err) => return AppError::DatabaseError(sqlx_err),
                Err(original_error) => {
                    // If downcast fails somehow, fall back to the original error
                    return AppError::InternalServerError(Some(original_error.to_string()));
                }
            }
        }

        AppError::InternalServerError(Some(error.to_string()))
    }
}

impl From<ExtractError> for AppError {
    fn from(error: ExtractError) -> Self {
        log::error!("Extractor error: {}", error);
        AppError::ExtractorError(error.to_string())
    }
}

impl From<ReconcileError> for AppError {
    fn from(error: ReconcileError) -> Self {
        match error {
            ReconcileError::AmbiguousGame { .. } | ReconcileError::AmbiguousAutoscrapeTarget => {
                AppError::Conflict(error.to_string())
            }
            ReconcileError::UnmatchedGame { .. } | ReconcileError::PlaceholderNotFound { .. } => {
                AppError::NotFound(error.to_string())
            }
            ReconcileError::ScoreMismatch { .. } => AppError::Unprocessable(error.to_string()),
            ReconcileError::UnsupportedGameTime(_) | ReconcileError::NoPlaceholderSlot(_) => {
                AppError::BadRequest(error.to_string())
            }
            ReconcileError::Extract(e) => AppError::from(e),
            ReconcileError::Database(e) => AppError::from(e),
            ReconcileError::Storage(e) => AppError::from(e),
        }
    }
}
