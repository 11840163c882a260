#![forbid(unsafe_code)]

pub mod agent;
pub mod config;
pub mod console;
pub mod datamodel;
pub mod parsing;
pub mod query;
pub mod scrape;
pub mod storage;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
