pub mod autoscrape;
pub mod schedule;
pub mod scraper;

pub use scraper::{ScrapeMode, ScraperService};
