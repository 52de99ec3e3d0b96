use chrono::{NaiveDate, NaiveTime};
use pretty_assertions::assert_eq;

use super::records::*;

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

#[test]
fn game_data_accepts_the_full_day_range() {
    for day in 0..=6 {
        assert!(GameData::new("PUB QUIZ", day, time(19, 0)).is_ok());
    }
}

#[test]
fn game_data_rejects_out_of_range_days() {
    assert_eq!(
        GameData::new("PUB QUIZ", 7, time(19, 0)),
        Err(RecordError::DayOutOfRange(7))
    );
    assert_eq!(
        GameData::new("PUB QUIZ", -1, time(19, 0)),
        Err(RecordError::DayOutOfRange(-1))
    );
}

#[test]
fn team_data_rejects_negative_team_ids() {
    assert_eq!(
        TeamData::new(Some(-5), "Team A", 50),
        Err(RecordError::NegativeTeamId(-5))
    );
    assert!(TeamData::new(Some(0), "Team A", 50).is_ok());
    assert!(TeamData::new(None, "Team A", 50).is_ok());
}

#[test]
fn team_data_enforces_score_bounds() {
    assert!(TeamData::new(None, "Team A", -1).is_ok());
    assert!(TeamData::new(None, "Team A", 112).is_ok());
    assert_eq!(
        TeamData::new(None, "Team A", -2),
        Err(RecordError::ScoreOutOfRange(-2))
    );
    assert_eq!(
        TeamData::new(None, "Team A", 113),
        Err(RecordError::ScoreOutOfRange(113))
    );
}

#[test]
fn guest_flag_derives_from_missing_team_id() {
    assert!(TeamData::new(None, "Walkers", 65).unwrap().is_guest());
    assert!(!TeamData::new(Some(42), "Regulars", 80).unwrap().is_guest());
}

#[test]
fn event_weekday_is_monday_based() {
    // 2026-08-24 is a Monday, 2026-08-30 a Sunday.
    let monday = EventData::new(
        NaiveDate::from_ymd_opt(2026, 8, 24).unwrap(),
        "PUB QUIZ",
        "Alex",
        None,
        vec![],
    );
    let sunday = EventData::new(
        NaiveDate::from_ymd_opt(2026, 8, 30).unwrap(),
        "PUB QUIZ",
        "Alex",
        None,
        vec![],
    );

    assert_eq!(monday.weekday(), 0);
    assert_eq!(sunday.weekday(), 6);
}

#[test]
fn page_data_deserializes_from_the_extractor_wire_shape() {
    let json = r#"{
        "venue_data": {
            "name": "The Crown",
            "games": [{"type": "PUB QUIZ", "day": 0, "time": "19:00:00"}]
        },
        "event_data": [{
            "date": "2026-08-24",
            "game_type": "PUB QUIZ",
            "quizmaster": "Alex",
            "description": "Season opener",
            "teams": [
                {"team_id": 42, "name": "Regulars", "score": 80},
                {"team_id": null, "name": "Walkers", "score": 65}
            ]
        }]
    }"#;

    let page: PageData = serde_json::from_str(json).unwrap();

    assert_eq!(page.venue_data().name(), "The Crown");
    assert_eq!(page.venue_data().games().len(), 1);
    assert_eq!(page.venue_data().games()[0].day(), 0);
    assert_eq!(page.event_data().len(), 1);

    let event = &page.event_data()[0];
    assert_eq!(event.game_type(), "PUB QUIZ");
    assert_eq!(event.description(), Some("Season opener"));
    assert_eq!(event.teams()[0].team_id(), Some(42));
    assert_eq!(event.teams()[1].team_id(), None);
}

#[test]
fn deserialization_rejects_invalid_records() {
    let bad_score = r#"{"team_id": null, "name": "Team A", "score": 200}"#;
    assert!(serde_json::from_str::<TeamData>(bad_score).is_err());

    let bad_day = r#"{"type": "PUB QUIZ", "day": 9, "time": "19:00:00"}"#;
    assert!(serde_json::from_str::<GameData>(bad_day).is_err());
}
