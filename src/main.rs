#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use clap::Parser;
use scrapeagent::agent::Agent;
use scrapeagent::config::AgentConfig;
use scrapeagent::console::{PROMPT, evaluate_line};
use scrapeagent::storage::StorageHandle;
use std::io::{BufRead, Write};
use tokio::runtime::Handle;
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(version, about = "Scrapes metrics endpoints into a local SQLite database")]
struct Cli {
    /// Comma separated list of URLs to scrape
    #[arg(long = "scrape.urls")]
    scrape_urls: Option<String>,

    /// Scrape interval, e.g. 10s or 1m30s
    #[arg(long = "scrape.interval")]
    scrape_interval: Option<String>,

    /// SQLite database file
    #[arg(long = "sqlite.file")]
    sqlite_file: Option<String>,

    /// Read queries from stdin
    #[arg(long)]
    interactive: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let mut config = AgentConfig::load().context("Failed to load configuration")?;
    if let Some(scrape_urls) = cli.scrape_urls {
        config.scrape_urls = scrape_urls;
    }
    if let Some(scrape_interval) = cli.scrape_interval {
        config.scrape_interval = scrape_interval;
    }
    if let Some(sqlite_file) = cli.sqlite_file {
        config.sqlite_file = sqlite_file;
    }
    let settings = config.settings().context("Invalid configuration")?;

    if settings.scrape_urls.is_empty() {
        warn!("No scrape targets configured");
    }

    let agent = Agent::start(&settings).await?;

    if cli.interactive {
        let storage = agent.storage();
        let runtime = Handle::current();
        // Stdin reads block, the thread is left behind on exit
        std::thread::spawn(move || run_console(storage, runtime));
    }

    wait_for_signal().await?;
    agent.shutdown().await;
    Ok(())
}

fn run_console(storage: StorageHandle, runtime: Handle) {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    let mut line = String::new();

    loop {
        print!("{PROMPT}");
        let _ = stdout.flush();

        line.clear();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => {
                info!("Console input closed");
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "Failed to read console input");
                return;
            }
        }

        if let Some(output) = runtime.block_on(evaluate_line(&line, &storage)) {
            println!("{output}");
        }
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut terminate =
        signal(SignalKind::terminate()).context("Failed to listen for SIGTERM")?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.context("Failed to listen for SIGINT")?,
        _ = terminate.recv() => {}
    }
    info!("Received shutdown signal");
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signal() -> Result<()> {
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    info!("Received shutdown signal");
    Ok(())
}
