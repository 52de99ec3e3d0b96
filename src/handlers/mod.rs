pub mod scrape;
pub mod shared;
pub mod tasks;
