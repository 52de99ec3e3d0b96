use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use crate::scraper::records::PageData;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("extractor request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("extractor returned an error: {0}")]
    Upstream(String),
}

/// The extraction boundary. Implementations fetch and parse one venue's
/// recap listing, paginating backwards until the cutoff date; the DOM
/// and anti-bot details live entirely behind this trait.
#[async_trait]
pub trait PageExtractor: Send + Sync {
    async fn extract(
        &self,
        venue_url: &str,
        cutoff: Option<NaiveDate>,
    ) -> Result<PageData, ExtractError>;
}

/// Client for the extractor sidecar service, which returns the page as
/// JSON in the records.rs wire shape.
pub struct RemoteExtractor {
    client: reqwest::Client,
    base_url: String,
}

impl RemoteExtractor {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl PageExtractor for RemoteExtractor {
    async fn extract(
        &self,
        venue_url: &str,
        cutoff: Option<NaiveDate>,
    ) -> Result<PageData, ExtractError> {
        let response = self
            .client
            .post(format!("{}/extract", self.base_url))
            .json(&serde_json::json!({
                "url": venue_url,
                "cutoff": cutoff,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ExtractError::Upstream(format!(
                "extractor responded with {}: {}",
                status, body
            )));
        }

        let page = response.json::<PageData>().await?;

        log::debug!(
            "Extracted {} events for {}",
            page.event_data().len(),
            venue_url
        );

        Ok(page)
    }
}
