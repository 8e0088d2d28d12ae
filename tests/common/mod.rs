//! Shared fixtures: product page HTML and a scripted browser.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use catalog_scraper_lib::{BrowserLauncher, BrowserSession, ScrapeError, ScraperConfig};

pub fn test_config(checkpoint: &Path) -> ScraperConfig {
    ScraperConfig {
        checkpoint_path: checkpoint.to_path_buf(),
        url_marker: "/element/".to_string(),
        cooldown: Duration::ZERO,
        settle: Duration::ZERO,
        request_timeout: Duration::from_secs(5),
        ..Default::default()
    }
}

fn page(card: &str, extra: &str) -> String {
    format!(
        r#"<!DOCTYPE html><html><body>
<div class="bx_breadcrumbs"><div class="br_catalog bk">
  <div itemprop="itemListElement"><a href="/catalog/"><span>Catalog</span></a></div>
  <div itemprop="itemListElement"><a href="/catalog/pipes/"><span>Pipes</span></a></div>
</div></div>
<div class="bx_item_detail">{card}</div>
{extra}
</body></html>"#
    )
}

/// Product page with a static price and a characteristics block.
pub fn single_variant_page(name: &str, price: &str, characteristics: &[(&str, &str)]) -> String {
    let pairs: String = characteristics
        .iter()
        .map(|(k, v)| format!("<div>{k}</div><div>{v}</div>"))
        .collect();
    page(
        &format!(
            r#"<h1 class="h1_cart">{name}</h1>
<div class="goods_price_val"><div class="goods_price_val_inf">
  <meta itemprop="price" content="{price}"><span class="mash01">/ м</span>
</div></div>"#
        ),
        &format!(r#"<div class="har_mob">{pairs}</div>"#),
    )
}

/// Product page whose option selector lists `values`.
pub fn multi_variant_page(name: &str, values: &[&str]) -> String {
    let options: String = values
        .iter()
        .map(|v| format!(r#"<option value="{v}">{v}</option>"#))
        .collect();
    page(
        &format!(
            r#"<div class="h1_cart_2">{name}</div>
<div class="change_property">Size:<select class="select_property">{options}</select></div>"#
        ),
        "",
    )
}

pub fn sitemap(urls: &[String]) -> Vec<u8> {
    let body: String = urls
        .iter()
        .map(|u| format!("<url><loc>{u}</loc></url>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{body}</urlset>"#
    )
    .into_bytes()
}

/// Selector -> texts, for one applied option. Scoped lookups use `"{scope} {selector}"`.
pub type VariantState = HashMap<String, Vec<String>>;

pub fn variant_state(price: &str, size: &str) -> VariantState {
    let mut state = HashMap::new();
    state.insert(
        ".goods_price_val .goods_price_val_inf .in_price".to_string(),
        vec![price.to_string()],
    );
    state.insert(
        ".change_property".to_string(),
        vec![format!("Size:\n{size}")],
    );
    state
}

#[derive(Default)]
pub struct BrowserLog {
    pub launched: usize,
    pub closed: usize,
    pub navigated: Vec<String>,
}

/// Launcher whose sessions replay `states`, advancing on every `ChangeSelect` call.
pub struct FakeLauncher {
    pub states: Vec<VariantState>,
    pub fail_launch: bool,
    /// Runs on every launch, before the session is handed out.
    pub before_launch: Option<Box<dyn Fn()>>,
    pub log: Rc<RefCell<BrowserLog>>,
}

impl FakeLauncher {
    pub fn new(states: Vec<VariantState>) -> (Self, Rc<RefCell<BrowserLog>>) {
        let log = Rc::new(RefCell::new(BrowserLog::default()));
        let launcher = FakeLauncher {
            states,
            fail_launch: false,
            before_launch: None,
            log: Rc::clone(&log),
        };
        (launcher, log)
    }
}

impl BrowserLauncher for FakeLauncher {
    fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        if self.fail_launch {
            return Err(ScrapeError::BrowserSetup("no browser in tests".into()));
        }
        if let Some(hook) = &self.before_launch {
            hook();
        }
        self.log.borrow_mut().launched += 1;
        Ok(Box::new(FakeSession {
            states: self.states.clone(),
            current: None,
            log: Rc::clone(&self.log),
        }))
    }
}

struct FakeSession {
    states: Vec<VariantState>,
    current: Option<usize>,
    log: Rc<RefCell<BrowserLog>>,
}

impl BrowserSession for FakeSession {
    fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
        self.log.borrow_mut().navigated.push(url.to_string());
        Ok(())
    }

    fn execute(&mut self, script: &str) -> Result<(), ScrapeError> {
        if script.starts_with("ChangeSelect") {
            self.current = Some(self.current.map_or(0, |i| i + 1));
        }
        Ok(())
    }

    fn texts(&mut self, selector: &str) -> Result<Vec<String>, ScrapeError> {
        Ok(self
            .current
            .and_then(|i| self.states.get(i))
            .and_then(|state| state.get(selector).cloned())
            .unwrap_or_default())
    }

    fn texts_within(&mut self, scope: &str, selector: &str) -> Result<Vec<String>, ScrapeError> {
        self.texts(&format!("{scope} {selector}"))
    }

    fn visible_texts(&mut self, selector: &str) -> Result<Vec<String>, ScrapeError> {
        self.texts(selector)
    }

    fn settle(&mut self, _delay: Duration) {}

    fn close(&mut self) -> Result<(), ScrapeError> {
        self.log.borrow_mut().closed += 1;
        Ok(())
    }
}
