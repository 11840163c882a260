use crate::parsing::parse_duration;
use anyhow::{Context, Error, bail};
use confique::Config;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

#[derive(Debug, Config)]
pub struct AgentConfig {
    /// Comma separated list of targets.
    #[config(env = "SCRAPEAGENT_SCRAPE_URLS", default = "")]
    pub scrape_urls: String,

    #[config(env = "SCRAPEAGENT_SCRAPE_INTERVAL", default = "10s")]
    pub scrape_interval: String,

    #[config(env = "SCRAPEAGENT_SQLITE_FILE", default = "metrics.db")]
    pub sqlite_file: String,

    #[config(env = "SCRAPEAGENT_SAMPLE_CHANNEL_CAPACITY", default = 512)]
    pub sample_channel_capacity: usize,

    #[config(env = "SCRAPEAGENT_QUERY_CHANNEL_CAPACITY", default = 16)]
    pub query_channel_capacity: usize,

    #[config(env = "SCRAPEAGENT_STATUS_CHANNEL_CAPACITY", default = 64)]
    pub status_channel_capacity: usize,

    #[config(env = "SCRAPEAGENT_SQLITE_BUSY_TIMEOUT_SECONDS", default = 5)]
    pub sqlite_busy_timeout_seconds: u64,

    #[config(env = "SCRAPEAGENT_ID_CACHE_SIZE", default = 4096)]
    pub id_cache_size: usize,
}

/// Validated configuration, ready to start an agent from.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    pub scrape_urls: Vec<Url>,
    pub scrape_interval: Duration,
    pub sqlite_file: PathBuf,
    pub sample_channel_capacity: usize,
    pub query_channel_capacity: usize,
    pub status_channel_capacity: usize,
    pub sqlite_busy_timeout: Duration,
    pub id_cache_size: NonZeroUsize,
}

impl AgentConfig {
    pub fn load() -> Result<AgentConfig, Error> {
        let c = AgentConfig::builder()
            .env()
            .file("settings.toml")
            .load()?;

        Ok(c)
    }

    pub fn settings(&self) -> Result<AgentSettings, Error> {
        let scrape_urls = parse_urls(&self.scrape_urls)?;

        let scrape_interval = parse_duration(&self.scrape_interval)
            .with_context(|| format!("Invalid scrape interval: {:?}", self.scrape_interval))?;
        if scrape_interval.is_zero() {
            bail!("Scrape interval must be greater than zero");
        }

        if self.sqlite_file.trim().is_empty() {
            bail!("SQLite file path is empty");
        }

        let id_cache_size =
            NonZeroUsize::new(self.id_cache_size).context("Id cache size must be greater than zero")?;

        for (name, capacity) in [
            ("sample", self.sample_channel_capacity),
            ("query", self.query_channel_capacity),
            ("status", self.status_channel_capacity),
        ] {
            if capacity == 0 {
                bail!("The {name} channel capacity must be greater than zero");
            }
        }

        Ok(AgentSettings {
            scrape_urls,
            scrape_interval,
            sqlite_file: PathBuf::from(&self.sqlite_file),
            sample_channel_capacity: self.sample_channel_capacity,
            query_channel_capacity: self.query_channel_capacity,
            status_channel_capacity: self.status_channel_capacity,
            sqlite_busy_timeout: Duration::from_secs(self.sqlite_busy_timeout_seconds),
            id_cache_size,
        })
    }
}

fn parse_urls(list: &str) -> Result<Vec<Url>, Error> {
    list.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(|url| {
            let parsed = Url::parse(url).with_context(|| format!("Invalid scrape URL: {url}"))?;
            match parsed.scheme() {
                "http" | "https" => Ok(parsed),
                scheme => bail!("Unsupported scheme {scheme:?} in scrape URL: {url}"),
            }
        })
        .collect()
}
