use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_SITEMAP: &str = "https://ingplast.ru/sitemap.xml";
pub const DEFAULT_CHECKPOINT: &str = "reports/products-ingplast-ru.csv";
pub const DEFAULT_URL_MARKER: &str = "https://ingplast.ru/element";
pub const DEFAULT_COOLDOWN_SECS: u64 = 10;
pub const DEFAULT_SETTLE_MS: u64 = 200;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Runtime knobs for a scraping run.
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Checkpoint CSV, rewritten after every successful URL and read back on startup.
    pub checkpoint_path: PathBuf,
    /// Substring a sitemap `<loc>` must contain to count as a product page.
    pub url_marker: String,
    /// Sleep applied after a failed URL.
    pub cooldown: Duration,
    /// Upper bound of random time added on top of `cooldown`.
    pub cooldown_jitter: Duration,
    /// Wait after switching a variant option before re-reading the page.
    pub settle: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Browser binary for variant enumeration. `None` lets the driver pick one.
    pub chrome_executable: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        ScraperConfig {
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT),
            url_marker: DEFAULT_URL_MARKER.to_string(),
            cooldown: Duration::from_secs(DEFAULT_COOLDOWN_SECS),
            cooldown_jitter: Duration::ZERO,
            settle: Duration::from_millis(DEFAULT_SETTLE_MS),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            chrome_executable: None,
        }
    }
}
