use crate::parsing::ParseError;
use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a single scrape cycle. None of these stop the scraper, except
/// `StorageClosed` which means there is nobody left to write to.
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("unexpected status, expected 200 got {0}")]
    UnexpectedStatus(StatusCode),

    #[error("failed to parse response: {0}")]
    Parse(#[from] ParseError),

    #[error("storage is not accepting samples")]
    StorageClosed,
}
