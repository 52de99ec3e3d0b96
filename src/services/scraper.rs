//! The scrape-to-database reconciliation engine.
//!
//! `reconcile` takes one extracted `PageData` for a venue and merges it
//! into the relational schema inside a single transaction. Every insert
//! is conflict-ignoring against the schema's uniqueness constraints, so
//! re-scraping already-persisted events is a safe no-op. Intermediate
//! lookups are plain values threaded between the steps; nothing is
//! cached across calls.

use chrono::{Local, NaiveDate, NaiveTime};
use sqlx::PgPool;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;

use crate::database::models::{GameInfo, NewEvent, NewParticipation, Venue};
use crate::database::repositories::{
    EventRepository, GameRepository, ParticipationRepository, QuizmasterRepository,
    TaskRepository, TeamRepository, VenueRepository,
};
use crate::scraper::extract::{ExtractError, PageExtractor};
use crate::scraper::records::PageData;
use crate::services::schedule;

#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error(
        "multiple games found for '{game_type}' on day {day:?}; time-based disambiguation not implemented"
    )]
    AmbiguousGame {
        game_type: String,
        day: Option<i16>,
    },

    #[error("no matching game found for type '{game_type}' on day {day}")]
    UnmatchedGame { game_type: String, day: i16 },

    #[error("found multiple events in page data that match the autoscraping game")]
    AmbiguousAutoscrapeTarget,

    #[error("no open placeholder event for game {game_id} on {date}")]
    PlaceholderNotFound { game_id: i64, date: NaiveDate },

    #[error(
        "unable to match existing participation (team_id {team_id:?}, name '{team_name}') to scraped data for score update"
    )]
    ScoreMismatch {
        team_id: Option<i64>,
        team_name: String,
    },

    #[error("games must start before 21:30, got {0}")]
    UnsupportedGameTime(NaiveTime),

    #[error("games starting before 01:00 leave no placeholder-generation slot, got {0}")]
    NoPlaceholderSlot(NaiveTime),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Whether a reconcile call was operator-triggered or fired by the
/// recurring autoscrape task. The unattended variant always targets one
/// specific game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeMode {
    Manual,
    Auto { game_id: i64 },
}

impl ScrapeMode {
    pub fn is_manual(&self) -> bool {
        matches!(self, ScrapeMode::Manual)
    }
}

/// Per-call game matching lookup, keyed by (game-type name, day).
/// Built fresh at the start of each reconcile call from the venue's
/// persisted games; duplicate keys fail fast at construction.
pub struct GameLookup {
    games: HashMap<(String, Option<i16>), GameInfo>,
}

impl GameLookup {
    pub fn from_rows(rows: Vec<GameInfo>) -> Result<Self, ReconcileError> {
        let mut games = HashMap::new();

        for game in rows {
            let key = (game.game_type_name.clone(), game.day);
            if let Some(existing) = games.insert(key, game) {
                return Err(ReconcileError::AmbiguousGame {
                    game_type: existing.game_type_name,
                    day: existing.day,
                });
            }
        }

        Ok(Self { games })
    }

    /// Match a scraped event to a game at the venue. An exact
    /// (type, day) match wins; otherwise fall back to the venue's
    /// custom game of the same type.
    pub fn match_game(&self, game_type: &str, day: i16) -> Result<&GameInfo, ReconcileError> {
        if let Some(game) = self.games.get(&(game_type.to_owned(), Some(day))) {
            log::debug!(
                "Found exact match for official game type '{}' on day {}",
                game_type,
                day
            );
            return Ok(game);
        }

        if let Some(game) = self.games.get(&(game_type.to_owned(), None)) {
            log::debug!("Falling back to custom game match for game type '{}'", game_type);
            return Ok(game);
        }

        Err(ReconcileError::UnmatchedGame {
            game_type: game_type.to_owned(),
            day,
        })
    }

    pub fn official_games(&self) -> Vec<&GameInfo> {
        let mut games: Vec<&GameInfo> =
            self.games.values().filter(|g| g.is_official()).collect();
        games.sort_by_key(|g| g.id);
        games
    }
}

/// Keep only the highest score among duplicate (team, event) pairs;
/// ties resolve to the last entry seen.
pub(crate) fn dedup_participations(raw: Vec<NewParticipation>) -> Vec<NewParticipation> {
    let mut unique: HashMap<(i64, i64), NewParticipation> = HashMap::new();

    for participation in raw {
        let key = (participation.team_id, participation.event_id);
        match unique.get(&key) {
            Some(existing) if existing.score > participation.score => {}
            _ => {
                unique.insert(key, participation);
            }
        }
    }

    let mut deduped: Vec<NewParticipation> = unique.into_values().collect();
    deduped.sort_by_key(|p| (p.event_id, p.team_id));
    deduped
}

fn lookup_id(map: &HashMap<String, i64>, name: &str) -> Result<i64, ReconcileError> {
    map.get(name).copied().ok_or_else(|| {
        ReconcileError::Storage(anyhow::anyhow!("'{}' missing from lookup after upsert", name))
    })
}

/// The placeholder event matched and filled in by step 6, remembered
/// for the score-backfill step.
struct ResolvedPlaceholder {
    event_id: i64,
    event_index: usize,
}

pub struct ScraperService {
    pool: PgPool,
    extractor: Arc<dyn PageExtractor>,
    scrape_interval: u32,
    venues: VenueRepository,
    games: GameRepository,
    quizmasters: QuizmasterRepository,
    events: EventRepository,
    teams: TeamRepository,
    participations: ParticipationRepository,
    tasks: TaskRepository,
}

impl ScraperService {
    pub fn new(pool: PgPool, extractor: Arc<dyn PageExtractor>, scrape_interval: u32) -> Self {
        Self {
            venues: VenueRepository::new(pool.clone()),
            games: GameRepository::new(pool.clone()),
            quizmasters: QuizmasterRepository::new(pool.clone()),
            events: EventRepository::new(pool.clone()),
            teams: TeamRepository::new(pool.clone()),
            participations: ParticipationRepository::new(pool.clone()),
            tasks: TaskRepository::new(pool.clone()),
            pool,
            extractor,
            scrape_interval,
        }
    }

    /// Fetch one venue's page through the extractor. When no explicit
    /// end date is given the cutoff falls back to the venue's latest
    /// known event date, so only new recaps are paginated.
    pub async fn scrape_page(
        &self,
        venue_url: &str,
        end_date: Option<NaiveDate>,
    ) -> Result<PageData, ReconcileError> {
        let cutoff = match end_date {
            Some(date) => Some(date),
            None => self.events.latest_event_date(venue_url).await?,
        };

        log::debug!("Scraping {} with cutoff {:?}", venue_url, cutoff);

        Ok(self.extractor.extract(venue_url, cutoff).await?)
    }

    /// Merge one page into the database. Returns whether any writes
    /// were attempted: `false` only for an unattended call whose page
    /// held zero new events, which is a signal to keep polling, not an
    /// error. Any error rolls back every write of the call.
    pub async fn reconcile(
        &self,
        page: &PageData,
        venue_url: &str,
        mode: ScrapeMode,
    ) -> Result<bool, ReconcileError> {
        if page.event_data().is_empty() && !mode.is_manual() {
            log::info!("No new events scraped for {}; nothing to reconcile", venue_url);
            return Ok(false);
        }

        let mut tx = self.pool.begin().await?;

        // 1. Venue find-or-create by URL, name synced from the scrape.
        let venue = self
            .venues
            .upsert_scraped(&mut tx, venue_url, page.venue_data().name())
            .await?;

        // 2. Game types named anywhere on the page.
        let game_types = self.upsert_game_types(&mut tx, page).await?;

        // 3. Games, official and custom, plus the per-call lookup.
        let games = self.upsert_games(&mut tx, &venue, page, &game_types).await?;

        // 4. Official games drive the recurring autoscrape tasks; keep
        // the task table in step inside the same transaction.
        schedule::sync_game_tasks(
            &mut tx,
            &self.tasks,
            &venue,
            &games.official_games(),
            self.scrape_interval,
        )
        .await?;

        // 5. Quizmasters named across the scraped events.
        let quizmasters = self.upsert_quizmasters(&mut tx, page).await?;

        // 6. Autoscrape placeholder resolution.
        let resolved = match mode {
            ScrapeMode::Manual => None,
            ScrapeMode::Auto { game_id } => {
                self.resolve_placeholder(&mut tx, page, game_id, &games, &quizmasters)
                    .await?
            }
        };

        // 7. Remaining events.
        let events = self
            .upsert_events(&mut tx, page, resolved.as_ref(), &games, &quizmasters)
            .await?;

        // 8. Official teams and their (possibly new) display names.
        let teams = self.upsert_official_teams(&mut tx, page).await?;

        // 9. Guest teams, paired 1:1 with their single name.
        let guest_teams = self.upsert_guest_teams(&mut tx, page).await?;

        // 10. Score backfill for the resolved placeholder's seeded
        // participations.
        if let Some(resolved) = &resolved {
            self.backfill_scores(&mut tx, page, resolved).await?;
        }

        // 11. Participations, deduplicated max-score-wins.
        self.upsert_participations(&mut tx, page, &games, &events, &teams, &guest_teams)
            .await?;

        tx.commit().await?;

        Ok(true)
    }

    async fn upsert_game_types(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        page: &PageData,
    ) -> Result<HashMap<String, i64>, ReconcileError> {
        let official: BTreeSet<&str> = page
            .venue_data()
            .games()
            .iter()
            .map(|g| g.game_type())
            .collect();
        let custom: BTreeSet<&str> = page.event_data().iter().map(|e| e.game_type()).collect();

        log::debug!(
            "Found {} official game types and {} event game types",
            official.len(),
            custom.len()
        );

        let names: Vec<String> = official
            .union(&custom)
            .map(|name| (*name).to_owned())
            .collect();

        Ok(self.games.upsert_game_types(tx, &names).await?)
    }

    async fn upsert_games(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        venue: &Venue,
        page: &PageData,
        game_types: &HashMap<String, i64>,
    ) -> Result<GameLookup, ReconcileError> {
        // Officially-listed (type, day, time) slots.
        let mut slots: Vec<(i64, i16, NaiveTime)> = Vec::new();
        for game in page.venue_data().games() {
            slots.push((lookup_id(game_types, game.game_type())?, game.day(), game.time()));
        }
        self.games.insert_official_games(tx, venue.id, &slots).await?;

        // Event game types with no official slot become custom games.
        let official_keys: BTreeSet<(i64, i16)> =
            slots.iter().map(|(type_id, day, _)| (*type_id, *day)).collect();

        let mut custom_type_ids: BTreeSet<i64> = BTreeSet::new();
        for event in page.event_data() {
            let key = (lookup_id(game_types, event.game_type())?, event.weekday());
            if !official_keys.contains(&key) {
                custom_type_ids.insert(key.0);
            }
        }
        let custom_type_ids: Vec<i64> = custom_type_ids.into_iter().collect();
        self.games
            .insert_custom_games(tx, venue.id, &custom_type_ids)
            .await?;

        // Read everything back for the per-call matching lookup.
        let involved_type_ids: Vec<i64> = game_types.values().copied().collect();
        let rows = self
            .games
            .list_for_lookup(tx, venue.id, &involved_type_ids)
            .await?;

        GameLookup::from_rows(rows)
    }

    async fn upsert_quizmasters(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        page: &PageData,
    ) -> Result<HashMap<String, i64>, ReconcileError> {
        let names: Vec<String> = page
            .event_data()
            .iter()
            .map(|e| e.quizmaster().to_owned())
            .collect::<BTreeSet<String>>()
            .into_iter()
            .collect();

        Ok(self.quizmasters.upsert_names(tx, &names).await?)
    }

    /// Among the scraped events, find the one resolving to the
    /// autoscrape target game and fill in its still-open placeholder
    /// row. Zero matches means the venue has not posted that game's
    /// recap yet; more than one is ambiguous and fatal.
    async fn resolve_placeholder(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        page: &PageData,
        game_id: i64,
        games: &GameLookup,
        quizmasters: &HashMap<String, i64>,
    ) -> Result<Option<ResolvedPlaceholder>, ReconcileError> {
        let mut matches: Vec<usize> = Vec::new();
        for (index, event) in page.event_data().iter().enumerate() {
            let game = games.match_game(event.game_type(), event.weekday())?;
            if game.id == game_id {
                matches.push(index);
            }
        }

        let index = match matches.as_slice() {
            [] => return Ok(None),
            [index] => *index,
            _ => return Err(ReconcileError::AmbiguousAutoscrapeTarget),
        };

        let event = &page.event_data()[index];
        let today = Local::now().date_naive();

        let placeholder = self
            .events
            .lock_open_placeholder(tx, game_id, today)
            .await?
            .ok_or(ReconcileError::PlaceholderNotFound {
                game_id,
                date: today,
            })?;

        let quizmaster_id = lookup_id(quizmasters, event.quizmaster())?;
        self.events
            .resolve_placeholder(tx, placeholder.id, event.description(), quizmaster_id)
            .await?;

        log::info!(
            "Resolved placeholder event {} for game {}",
            placeholder.id,
            game_id
        );

        Ok(Some(ResolvedPlaceholder {
            event_id: placeholder.id,
            event_index: index,
        }))
    }

    async fn upsert_events(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        page: &PageData,
        resolved: Option<&ResolvedPlaceholder>,
        games: &GameLookup,
        quizmasters: &HashMap<String, i64>,
    ) -> Result<HashMap<(i64, NaiveDate), i64>, ReconcileError> {
        let resolved_index = resolved.map(|r| r.event_index);

        let mut new_events: Vec<NewEvent> = Vec::new();
        for (index, event) in page.event_data().iter().enumerate() {
            if Some(index) == resolved_index {
                continue;
            }

            let game = games.match_game(event.game_type(), event.weekday())?;
            new_events.push(NewEvent {
                game_id: game.id,
                date: event.date(),
                description: event.description().map(str::to_owned),
                quizmaster_id: lookup_id(quizmasters, event.quizmaster())?,
            });
        }
        self.events.bulk_insert(tx, &new_events).await?;

        // Read the full scraped set back, resolved placeholder included.
        let mut keys: Vec<(i64, NaiveDate)> = Vec::new();
        for event in page.event_data() {
            let game = games.match_game(event.game_type(), event.weekday())?;
            keys.push((game.id, event.date()));
        }

        Ok(self.events.map_by_game_and_date(tx, &keys).await?)
    }

    async fn upsert_official_teams(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        page: &PageData,
    ) -> Result<HashMap<i64, i64>, ReconcileError> {
        let team_ids: Vec<i64> = page
            .event_data()
            .iter()
            .flat_map(|e| e.teams())
            .filter_map(|t| t.team_id())
            .collect::<BTreeSet<i64>>()
            .into_iter()
            .collect();

        let teams = self.teams.upsert_official(tx, &team_ids).await?;

        // Every (team, name) pair seen; official teams rename over time.
        let mut name_pairs: BTreeSet<(i64, String)> = BTreeSet::new();
        for team in page.event_data().iter().flat_map(|e| e.teams()) {
            if let Some(team_id) = team.team_id() {
                let team_pk = teams.get(&team_id).copied().ok_or_else(|| {
                    ReconcileError::Storage(anyhow::anyhow!(
                        "team {} missing from lookup after upsert",
                        team_id
                    ))
                })?;
                name_pairs.insert((team_pk, team.name().to_owned()));
            }
        }
        let name_pairs: Vec<(i64, String)> = name_pairs.into_iter().collect();
        self.teams.insert_official_names(tx, &name_pairs).await?;

        Ok(teams)
    }

    async fn upsert_guest_teams(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        page: &PageData,
    ) -> Result<HashMap<String, i64>, ReconcileError> {
        let unique_names: BTreeSet<String> = page
            .event_data()
            .iter()
            .flat_map(|e| e.teams())
            .filter(|t| t.is_guest())
            .map(|t| t.name().to_owned())
            .collect();

        let names: Vec<String> = unique_names.iter().cloned().collect();
        let mut guest_teams = self.teams.find_guest_teams_by_names(tx, &names).await?;

        // Create genuinely new guest teams one at a time, in sorted-name
        // order, each explicitly paired with its single name record.
        for name in &unique_names {
            if !guest_teams.contains_key(name) {
                let team_pk = self.teams.create_guest_team(tx, name).await?;
                guest_teams.insert(name.clone(), team_pk);
            }
        }

        Ok(guest_teams)
    }

    /// Apply scraped scores to the resolved placeholder's seeded
    /// participations. A participation that cannot be matched to any
    /// scraped team key is a data-entry mismatch and fails the whole
    /// call rather than silently leaving a null score.
    async fn backfill_scores(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        page: &PageData,
        resolved: &ResolvedPlaceholder,
    ) -> Result<(), ReconcileError> {
        let unscored = self.participations.lock_unscored(tx, resolved.event_id).await?;
        if unscored.is_empty() {
            return Ok(());
        }

        let event = &page.event_data()[resolved.event_index];
        let scores: HashMap<(Option<i64>, &str), i16> = event
            .teams()
            .iter()
            .map(|t| ((t.team_id(), t.name()), t.score()))
            .collect();

        for participation in unscored {
            let key = (
                participation.external_team_id,
                participation.team_name.as_str(),
            );
            let Some(score) = scores.get(&key).copied() else {
                return Err(ReconcileError::ScoreMismatch {
                    team_id: participation.external_team_id,
                    team_name: participation.team_name,
                });
            };

            self.participations
                .set_score(tx, participation.id, score)
                .await?;
        }

        Ok(())
    }

    async fn upsert_participations(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        page: &PageData,
        games: &GameLookup,
        events: &HashMap<(i64, NaiveDate), i64>,
        teams: &HashMap<i64, i64>,
        guest_teams: &HashMap<String, i64>,
    ) -> Result<(), ReconcileError> {
        // (team pk, display name) -> TeamName pk across both kinds.
        let team_pks: Vec<i64> = teams
            .values()
            .chain(guest_teams.values())
            .copied()
            .collect();
        let team_names = self.teams.team_name_map(tx, &team_pks).await?;

        let mut raw: Vec<NewParticipation> = Vec::new();
        for event in page.event_data() {
            let game = games.match_game(event.game_type(), event.weekday())?;
            let event_id = events.get(&(game.id, event.date())).copied().ok_or_else(|| {
                ReconcileError::Storage(anyhow::anyhow!(
                    "event for game {} on {} missing from lookup after upsert",
                    game.id,
                    event.date()
                ))
            })?;

            for team in event.teams() {
                let team_pk = match team.team_id() {
                    Some(team_id) => teams.get(&team_id).copied(),
                    None => guest_teams.get(team.name()).copied(),
                }
                .ok_or_else(|| {
                    ReconcileError::Storage(anyhow::anyhow!(
                        "team '{}' missing from lookup after upsert",
                        team.name()
                    ))
                })?;

                let team_name_id = team_names
                    .get(&(team_pk, team.name().to_owned()))
                    .copied()
                    .ok_or_else(|| {
                        ReconcileError::Storage(anyhow::anyhow!(
                            "name '{}' for team {} missing from lookup after upsert",
                            team.name(),
                            team_pk
                        ))
                    })?;

                raw.push(NewParticipation {
                    team_id: team_pk,
                    team_name_id,
                    event_id,
                    score: team.score(),
                });
            }
        }

        let deduped = dedup_participations(raw);
        self.participations.bulk_insert(tx, &deduped).await?;

        Ok(())
    }
}
