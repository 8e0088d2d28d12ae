//! Headless browser sessions for pages whose content changes client-side.
//!
//! The rest of the crate only sees [`BrowserSession`] and [`BrowserLauncher`];
//! [`ChromeLauncher`] drives Chrome over CDP with chromiumoxide, wrapping its
//! async API in a private single-threaded runtime so callers stay blocking.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig, HeadlessMode};
use chromiumoxide::page::Page;
use futures::StreamExt;
use log::{debug, info, warn};
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use crate::error::ScrapeError;

/// One live browser tab. Text accessors return trimmed strings.
pub trait BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), ScrapeError>;

    /// Runs `script` in the page; its result is discarded.
    fn execute(&mut self, script: &str) -> Result<(), ScrapeError>;

    /// Text of every element matching `selector`, in document order.
    fn texts(&mut self, selector: &str) -> Result<Vec<String>, ScrapeError>;

    /// Text of every `selector` match inside the first element matching `scope`.
    /// Empty when `scope` matches nothing.
    fn texts_within(&mut self, scope: &str, selector: &str) -> Result<Vec<String>, ScrapeError>;

    /// Like [`texts`](Self::texts) but skips elements that are not rendered.
    fn visible_texts(&mut self, selector: &str) -> Result<Vec<String>, ScrapeError>;

    /// Gives client-side handlers time to update the DOM.
    fn settle(&mut self, delay: Duration);

    /// Shuts the browser down. Safe to call more than once.
    fn close(&mut self) -> Result<(), ScrapeError>;
}

pub trait BrowserLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError>;
}

/// Launches headless Chrome with images and extensions disabled.
pub struct ChromeLauncher {
    executable: Option<PathBuf>,
    user_agent: String,
}

impl ChromeLauncher {
    /// `executable` falls back to `CHROMIUM_PATH`, then to chromiumoxide's own lookup.
    pub fn new(executable: Option<PathBuf>, user_agent: &str) -> Self {
        let executable = executable.or_else(|| {
            std::env::var_os("CHROMIUM_PATH")
                .map(PathBuf::from)
                .filter(|path| path.exists())
        });
        ChromeLauncher {
            executable,
            user_agent: user_agent.to_string(),
        }
    }

    fn config(&self, user_data_dir: &TempDir) -> Result<BrowserConfig, ScrapeError> {
        let mut builder = BrowserConfig::builder()
            .headless_mode(HeadlessMode::default())
            .user_data_dir(user_data_dir.path())
            .request_timeout(Duration::from_secs(30))
            .arg(format!("--user-agent={}", self.user_agent))
            .arg("--disable-images")
            .arg("--disable-extensions")
            .arg("--blink-settings=imagesEnabled=false")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        builder.build().map_err(ScrapeError::BrowserSetup)
    }
}

impl BrowserLauncher for ChromeLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let user_data_dir = tempfile::Builder::new()
            .prefix("catalog_scraper_chrome_")
            .tempdir()?;
        let config = self.config(&user_data_dir)?;

        let (browser, mut handler) = runtime.block_on(Browser::launch(config))?;
        let handler = runtime.spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });
        info!("Browser session started.");

        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            page: None,
            handler,
            runtime,
            _user_data_dir: user_data_dir,
        }))
    }
}

/// Handle on a running Chrome. Dropping it without `close` still kills the process.
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: JoinHandle<()>,
    runtime: Runtime,
    _user_data_dir: TempDir,
}

// Kept free of arrow syntax so chromiumoxide evaluates it as an expression,
// not as a function declaration.
fn visible_texts_script(selector: &str) -> Result<String, ScrapeError> {
    Ok(format!(
        "Array.from(document.querySelectorAll({})) \
            .filter(function (el) {{ return el.getClientRects().length > 0; }}) \
            .map(function (el) {{ return el.innerText.trim(); }})",
        serde_json::to_string(selector)?
    ))
}

impl ChromeSession {
    fn page(&self) -> Result<&Page, ScrapeError> {
        self.page
            .as_ref()
            .ok_or_else(|| ScrapeError::BrowserSetup("no page is open".into()))
    }
}

impl BrowserSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        let browser = self
            .browser
            .as_ref()
            .ok_or_else(|| ScrapeError::BrowserSetup("browser already closed".into()))?;
        let page = self.runtime.block_on(async {
            let page = browser.new_page(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, ScrapeError>(page)
        })?;
        debug!("Browser navigated to {}", url);
        self.page = Some(page);
        Ok(())
    }

    fn execute(&mut self, script: &str) -> Result<(), ScrapeError> {
        let page = self.page()?;
        self.runtime.block_on(page.evaluate(script))?;
        Ok(())
    }

    fn texts(&mut self, selector: &str) -> Result<Vec<String>, ScrapeError> {
        let page = self.page()?;
        self.runtime.block_on(async {
            let mut texts = Vec::new();
            for element in page.find_elements(selector).await? {
                let text = element.inner_text().await?.unwrap_or_default();
                texts.push(text.trim().to_string());
            }
            Ok::<_, ScrapeError>(texts)
        })
    }

    fn texts_within(&mut self, scope: &str, selector: &str) -> Result<Vec<String>, ScrapeError> {
        let page = self.page()?;
        self.runtime.block_on(async {
            let Some(container) = page.find_elements(scope).await?.into_iter().next() else {
                return Ok(Vec::new());
            };
            let mut texts = Vec::new();
            for element in container.find_elements(selector).await? {
                let text = element.inner_text().await?.unwrap_or_default();
                texts.push(text.trim().to_string());
            }
            Ok::<_, ScrapeError>(texts)
        })
    }

    fn visible_texts(&mut self, selector: &str) -> Result<Vec<String>, ScrapeError> {
        let page = self.page()?;
        let script = visible_texts_script(selector)?;
        let result = self.runtime.block_on(page.evaluate(script))?;
        Ok(result.into_value::<Vec<String>>()?)
    }

    fn settle(&mut self, delay: Duration) {
        // sleep on the runtime so the CDP handler keeps draining events
        self.runtime.block_on(tokio::time::sleep(delay));
    }

    fn close(&mut self) -> Result<(), ScrapeError> {
        self.page = None;
        let Some(mut browser) = self.browser.take() else {
            return Ok(());
        };
        let result = self.runtime.block_on(async {
            browser.close().await?;
            browser.wait().await?;
            Ok::<_, ScrapeError>(())
        });
        self.handler.abort();
        info!("Browser session closed.");
        result
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if self.browser.is_some() {
            warn!("Browser session dropped without close, shutting it down.");
            if let Err(e) = self.close() {
                warn!("Browser shutdown failed: {}", e);
            }
        }
    }
}
