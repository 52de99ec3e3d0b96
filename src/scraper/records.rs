//! Immutable value types describing one scraped page: the venue's
//! official recurring-game list plus the extracted event recaps.
//!
//! Bounds are checked at construction, so the reconciliation engine can
//! treat every record it receives as already valid.

use chrono::{Datelike, NaiveDate, NaiveTime};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error("day must be an integer between 0 (Monday) and 6 (Sunday), got {0}")]
    DayOutOfRange(i16),

    #[error("team_id must be a non-negative integer or null, got {0}")]
    NegativeTeamId(i64),

    #[error("score must be between -1 and 112 inclusive, got {0}")]
    ScoreOutOfRange(i16),
}

/// One officially-listed recurring game slot at the venue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawGameData")]
pub struct GameData {
    game_type: String,
    day: i16,
    time: NaiveTime,
}

#[derive(Deserialize)]
struct RawGameData {
    #[serde(rename = "type")]
    game_type: String,
    day: i16,
    time: NaiveTime,
}

impl GameData {
    pub fn new(
        game_type: impl Into<String>,
        day: i16,
        time: NaiveTime,
    ) -> Result<Self, RecordError> {
        if !(0..=6).contains(&day) {
            return Err(RecordError::DayOutOfRange(day));
        }

        Ok(Self {
            game_type: game_type.into(),
            day,
            time,
        })
    }

    pub fn game_type(&self) -> &str {
        &self.game_type
    }

    pub fn day(&self) -> i16 {
        self.day
    }

    pub fn time(&self) -> NaiveTime {
        self.time
    }
}

impl TryFrom<RawGameData> for GameData {
    type Error = RecordError;

    fn try_from(raw: RawGameData) -> Result<Self, Self::Error> {
        Self::new(raw.game_type, raw.day, raw.time)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VenueData {
    name: String,
    games: Vec<GameData>,
}

impl VenueData {
    pub fn new(name: impl Into<String>, games: Vec<GameData>) -> Self {
        Self {
            name: name.into(),
            games,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn games(&self) -> &[GameData] {
        &self.games
    }
}

/// One team's scored appearance as scraped. team_id None marks a guest
/// team; score -1 is the venue system's "pending" marker.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTeamData")]
pub struct TeamData {
    team_id: Option<i64>,
    name: String,
    score: i16,
}

#[derive(Deserialize)]
struct RawTeamData {
    team_id: Option<i64>,
    name: String,
    score: i16,
}

impl TeamData {
    pub fn new(
        team_id: Option<i64>,
        name: impl Into<String>,
        score: i16,
    ) -> Result<Self, RecordError> {
        if let Some(id) = team_id {
            if id < 0 {
                return Err(RecordError::NegativeTeamId(id));
            }
        }
        if !(-1..=112).contains(&score) {
            return Err(RecordError::ScoreOutOfRange(score));
        }

        Ok(Self {
            team_id,
            name: name.into(),
            score,
        })
    }

    pub fn team_id(&self) -> Option<i64> {
        self.team_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> i16 {
        self.score
    }

    pub fn is_guest(&self) -> bool {
        self.team_id.is_none()
    }
}

impl TryFrom<RawTeamData> for TeamData {
    type Error = RecordError;

    fn try_from(raw: RawTeamData) -> Result<Self, Self::Error> {
        Self::new(raw.team_id, raw.name, raw.score)
    }
}

/// One extracted event recap.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventData {
    date: NaiveDate,
    game_type: String,
    quizmaster: String,
    description: Option<String>,
    teams: Vec<TeamData>,
}

impl EventData {
    pub fn new(
        date: NaiveDate,
        game_type: impl Into<String>,
        quizmaster: impl Into<String>,
        description: Option<String>,
        teams: Vec<TeamData>,
    ) -> Self {
        Self {
            date,
            game_type: game_type.into(),
            quizmaster: quizmaster.into(),
            description,
            teams,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Weekday of the event's date, 0=Monday through 6=Sunday.
    pub fn weekday(&self) -> i16 {
        self.date.weekday().num_days_from_monday() as i16
    }

    pub fn game_type(&self) -> &str {
        &self.game_type
    }

    pub fn quizmaster(&self) -> &str {
        &self.quizmaster
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn teams(&self) -> &[TeamData] {
        &self.teams
    }
}

/// Everything extracted from one venue's recap listing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PageData {
    venue_data: VenueData,
    event_data: Vec<EventData>,
}

impl PageData {
    pub fn new(venue_data: VenueData, event_data: Vec<EventData>) -> Self {
        Self {
            venue_data,
            event_data,
        }
    }

    pub fn venue_data(&self) -> &VenueData {
        &self.venue_data
    }

    pub fn event_data(&self) -> &[EventData] {
        &self.event_data
    }
}
