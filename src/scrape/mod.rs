pub mod error;
pub mod report;
pub mod scraper;

pub use error::ScrapeError;
pub use report::{ScrapeOutcome, ScrapeReport};
pub use scraper::Scraper;
