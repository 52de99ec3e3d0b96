use anyhow::Result;
use sqlx::{PgConnection, PgPool};

use crate::database::models::Venue;

#[derive(Clone)]
pub struct VenueRepository {
    pool: PgPool,
}

impl VenueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_url(&self, url: &str) -> Result<Option<Venue>> {
        let venue = sqlx::query_as::<_, Venue>("SELECT * FROM venues WHERE url = $1")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(venue)
    }

    /// Find-or-create by URL, syncing the scraped name on change and
    /// refreshing last_scraped_at. Creating here is what lets the admin
    /// omit the name field when adding a venue for the first time.
    pub async fn upsert_scraped(
        &self,
        conn: &mut PgConnection,
        url: &str,
        name: &str,
    ) -> Result<Venue> {
        let existing = sqlx::query_as::<_, Venue>("SELECT * FROM venues WHERE url = $1")
            .bind(url)
            .fetch_optional(&mut *conn)
            .await?;

        let venue = match existing {
            None => {
                let venue = sqlx::query_as::<_, Venue>(
                    r#"
                    INSERT INTO
                        venues (name, url, last_scraped_at)
                    VALUES
                        ($1, $2, NOW())
                    RETURNING
                        *
                    "#,
                )
                .bind(name)
                .bind(url)
                .fetch_one(&mut *conn)
                .await?;

                log::info!("Created new venue '{}' with URL: {}", name, url);
                venue
            }
            Some(existing) => {
                if existing.name != name {
                    log::info!(
                        "Updated venue name from '{}' to '{}' for URL: {}",
                        existing.name,
                        name,
                        url
                    );
                } else {
                    log::debug!("Venue '{}' with URL: {} already exists", name, url);
                }

                sqlx::query_as::<_, Venue>(
                    r#"
                    UPDATE venues
                    SET
                        name = $1,
                        last_scraped_at = NOW(),
                        updated_at = NOW()
                    WHERE
                        id = $2
                    RETURNING
                        *
                    "#,
                )
                .bind(name)
                .bind(existing.id)
                .fetch_one(&mut *conn)
                .await?
            }
        };

        Ok(venue)
    }
}
