use chromiumoxide::error::CdpError;
use thiserror::Error;

/// Everything that can go wrong while turning a sitemap into checkpointed records.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Transport failure or non-2xx status while fetching a page or sitemap.
    #[error("request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// Breadcrumbs or the product card are missing; not a usable product page.
    #[error("key elements not found (breadcrumbs or product card)")]
    MissingContainers,

    /// Neither title location is present on an otherwise valid product page.
    #[error("product title not found")]
    MissingTitle,

    #[error("required element `{0}` not found")]
    MissingElement(String),

    #[error("browser error: {0}")]
    Browser(#[from] CdpError),

    #[error("browser setup failed: {0}")]
    BrowserSetup(String),

    #[error("unexpected script result: {0}")]
    Script(#[from] serde_json::Error),

    #[error("checkpoint error: {0}")]
    Checkpoint(#[from] csv::Error),

    #[error("sitemap could not be parsed: {0}")]
    Sitemap(#[from] quick_xml::Error),

    #[error("sitemap has no root element")]
    EmptySitemap,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScrapeError {
    /// A missing title stops the URL immediately; every other failure is
    /// followed by the configured cooldown.
    pub fn needs_cooldown(&self) -> bool {
        !matches!(self, ScrapeError::MissingTitle)
    }
}
