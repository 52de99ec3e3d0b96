pub mod extract;
pub mod records;

pub use extract::{ExtractError, PageExtractor, RemoteExtractor};
pub use records::{EventData, GameData, PageData, RecordError, TeamData, VenueData};

#[cfg(test)]
mod records_tests;
