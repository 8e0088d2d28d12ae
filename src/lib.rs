pub mod browser;
pub mod config;
pub mod delay_manager;
pub mod error;
pub mod extractor;
pub mod input_loader;
pub mod logger;
pub mod record;
pub mod resume_manager;
pub mod scraper;
pub mod variants;

// Exporting types for convenience
pub use browser::{BrowserLauncher, BrowserSession, ChromeLauncher};
pub use config::ScraperConfig;
pub use error::ScrapeError;
pub use extractor::{Extractor, PageLayout};
pub use record::{CharacteristicRecord, Product, RecordSet};
pub use resume_manager::ResumeState;
pub use scraper::{RunReport, Scraper};
pub use variants::{VariantOption, VariantSnapshot};
