use catalog_scraper_lib::{config, input_loader, logger};
use catalog_scraper_lib::{ChromeLauncher, Scraper, ScraperConfig};

use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;
use log::info;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Sitemap to take product URLs from: an http(s) URL or a local file
    #[arg(long, default_value = config::DEFAULT_SITEMAP)]
    sitemap: String,

    /// Checkpoint CSV, created on first run and resumed from afterwards
    #[arg(long, default_value = config::DEFAULT_CHECKPOINT)]
    checkpoint: PathBuf,

    /// Only sitemap URLs containing this text are scraped
    #[arg(long, default_value = config::DEFAULT_URL_MARKER)]
    url_marker: String,

    /// Pause after a failed page, in seconds
    #[arg(long, default_value_t = config::DEFAULT_COOLDOWN_SECS)]
    cooldown_secs: u64,

    /// Random extra pause added to the cooldown, up to this many seconds
    #[arg(long, default_value_t = 0)]
    cooldown_jitter_secs: u64,

    /// Wait after switching a product option, in milliseconds
    #[arg(long, default_value_t = config::DEFAULT_SETTLE_MS)]
    settle_ms: u64,

    /// HTTP request timeout, in seconds
    #[arg(long, default_value_t = config::DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    #[arg(long, default_value = config::DEFAULT_USER_AGENT)]
    user_agent: String,

    /// Chrome/Chromium executable for multi-variant pages (else CHROMIUM_PATH or auto-detect)
    #[arg(long)]
    chrome: Option<PathBuf>,

    /// Process only the first N product URLs
    #[arg(long)]
    limit: Option<usize>,

    /// Debug logging
    #[arg(short, long, default_value_t = false)]
    verbose: bool,
}

impl Cli {
    fn scraper_config(&self) -> ScraperConfig {
        ScraperConfig {
            checkpoint_path: self.checkpoint.clone(),
            url_marker: self.url_marker.clone(),
            cooldown: Duration::from_secs(self.cooldown_secs),
            cooldown_jitter: Duration::from_secs(self.cooldown_jitter_secs),
            settle: Duration::from_millis(self.settle_ms),
            request_timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
            chrome_executable: self.chrome.clone(),
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logger::init(cli.verbose);
    info!("Starting Catalog Scraper...");

    let config = cli.scraper_config();
    let launcher = ChromeLauncher::new(config.chrome_executable.clone(), &config.user_agent);
    let scraper = Scraper::new(config.clone(), Box::new(launcher))?;

    // 1. Resolve the work list; a bad sitemap ends the run here
    let sitemap = input_loader::load_sitemap(scraper.client(), &cli.sitemap)?;
    let mut urls = input_loader::parse_sitemap(&sitemap, &config.url_marker)?;
    if let Some(limit) = cli.limit {
        urls.truncate(limit);
    }

    // 2. Scrape, resuming from the checkpoint
    let report = scraper.run(&urls)?;

    println!("{}", serde_json::to_string(&report)?);
    Ok(())
}
