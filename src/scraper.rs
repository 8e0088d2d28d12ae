use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use serde::Serialize;
use log::{debug, error, info, warn};

use crate::browser::BrowserLauncher;
use crate::config::ScraperConfig;
use crate::delay_manager;
use crate::error::ScrapeError;
use crate::extractor::{Extractor, PageLayout};
use crate::record::{CharacteristicRecord, Product, RecordSet};
use crate::resume_manager::{self, ResumeState};
use crate::variants::{self, VariantOption};

/// Terminal tallies of a run. `success + failure + skipped` equals the URL count.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub success: usize,
    pub failure: usize,
    pub skipped: usize,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.success + self.failure + self.skipped
    }
}

/// Drives a run: one URL at a time, checkpointing after every success.
pub struct Scraper {
    client: Client,
    extractor: Extractor,
    launcher: Box<dyn BrowserLauncher>,
    config: ScraperConfig,
}

impl Scraper {
    pub fn new(config: ScraperConfig, launcher: Box<dyn BrowserLauncher>) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("ru-RU,ru;q=0.9,en;q=0.8"));

        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .cookie_store(true)
            .build()?;

        Ok(Scraper {
            client,
            extractor: Extractor::new(),
            launcher,
            config,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Processes `urls` in order, resuming from the checkpoint if one exists.
    ///
    /// Per-URL failures are counted and logged, never returned; only an
    /// unreadable checkpoint aborts the run.
    pub fn run(&self, urls: &[String]) -> Result<RunReport, ScrapeError> {
        let ResumeState {
            first_run,
            mut exists_urls,
            mut records,
        } = ResumeState::load(&self.config.checkpoint_path)?;
        if first_run {
            info!("First run, checkpoint will be created at {:?}.", self.config.checkpoint_path);
        }

        let mut report = RunReport::default();
        let total = urls.len();

        for (i, url) in urls.iter().enumerate() {
            info!("Processing {} / {} : {}", i + 1, total, url);

            if exists_urls.contains(url) {
                report.skipped += 1;
                info!("Link has been checked before, skip ({})", url);
                continue;
            }

            match self.process_url(url, &mut records) {
                Ok(added) => {
                    report.success += 1;
                    exists_urls.insert(url.clone());
                    debug!("{} produced {} rows, checkpoint now holds {}.", url, added, records.len());
                }
                Err(e) => {
                    report.failure += 1;
                    log_failure(url, &e);
                    if e.needs_cooldown() {
                        delay_manager::failure_cooldown(self.config.cooldown, self.config.cooldown_jitter);
                    }
                }
            }
        }

        info!(
            "Run finished: {} succeeded, {} failed, {} skipped. Checkpoint holds {} rows.",
            report.success,
            report.failure,
            report.skipped,
            records.len()
        );
        Ok(report)
    }

    /// Fetches, classifies, and extracts one URL, then rewrites the checkpoint.
    /// On error `records` is left exactly as it was.
    fn process_url(&self, url: &str, records: &mut RecordSet) -> Result<usize, ScrapeError> {
        let html = self.visit_page(url)?;

        let produced = match self.extractor.classify(url, &html)? {
            PageLayout::SingleVariant(record) => vec![record],
            PageLayout::MultiVariant { product, options } => {
                info!("{} has {} variants, enumerating in browser.", url, options.len());
                self.enumerate_in_browser(url, &product, &options)?
            }
        };

        let added = produced.len();
        let restore_len = records.len();
        records.extend(produced);
        if let Err(e) = resume_manager::write_checkpoint(&self.config.checkpoint_path, records) {
            records.truncate(restore_len);
            return Err(e);
        }
        Ok(added)
    }

    fn visit_page(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self.client.get(url).send()?.error_for_status()?;
        Ok(resp.text()?)
    }

    /// One session for the whole page, closed whether or not enumeration succeeded.
    fn enumerate_in_browser(
        &self,
        url: &str,
        product: &Product,
        options: &[VariantOption],
    ) -> Result<Vec<CharacteristicRecord>, ScrapeError> {
        let mut session = self.launcher.launch()?;
        let result = variants::enumerate_variants(session.as_mut(), url, product, options, self.config.settle);
        if let Err(e) = session.close() {
            warn!("Browser session for {} did not shut down cleanly: {}", url, e);
        }
        result
    }
}

fn log_failure(url: &str, e: &ScrapeError) {
    match e {
        ScrapeError::Fetch(_) => error!("Error loading page ({}): {}", url, e),
        ScrapeError::MissingContainers => {
            error!("Error loading html page, key elements not found ({}).", url)
        }
        ScrapeError::MissingTitle => error!("Error find H1, key elements not found ({}).", url),
        _ => error!("Unhandled exception ({}): {}", url, e),
    }
}
