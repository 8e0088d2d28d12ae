//! Walks every option of a multi-variant product page in a browser session.

use std::time::Duration;
use log::debug;

use crate::browser::BrowserSession;
use crate::error::ScrapeError;
use crate::extractor::clean_unit;
use crate::record::{pair_characteristics, CharacteristicRecord, Product};

const PRICE_BLOCK_SELECTOR: &str = ".goods_price_val .goods_price_val_inf";
const PRICE_SELECTOR: &str = ".in_price";
const UNIT_SELECTOR: &str = ".mash01";
const CHARACTERISTICS_SELECTOR: &str = ".har_mob div";
const PROPERTY_SELECTOR: &str = ".change_property";
const CHANGE_HANDLER_SCRIPT: &str =
    "ChangeSelect(document.querySelectorAll('.select_property')[0]);";

/// One entry of the page's option selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantOption {
    pub position: usize,
    pub value: String,
}

/// Fields scraped after one option has been applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariantSnapshot {
    pub price: String,
    pub unit: Option<String>,
    pub characteristics: Vec<(String, String)>,
    /// Visible option controls, as `(label, selected value)`.
    pub properties: Vec<(String, String)>,
}

impl VariantSnapshot {
    pub fn into_fields(self) -> Vec<(String, String)> {
        let mut fields = vec![("price".to_string(), self.price)];
        if let Some(unit) = self.unit {
            fields.push(("unit".to_string(), unit));
        }
        fields.extend(self.characteristics);
        fields.extend(self.properties);
        fields
    }
}

/// Produces one record per option, in option order.
///
/// The page is loaded once; each option is applied through the page's own
/// change handler. Any error aborts the whole page. Closing `session` is left
/// to the caller.
pub fn enumerate_variants(
    session: &mut dyn BrowserSession,
    url: &str,
    product: &Product,
    options: &[VariantOption],
    settle: Duration,
) -> Result<Vec<CharacteristicRecord>, ScrapeError> {
    session.navigate(url)?;
    let base = product.fields();

    let mut records = Vec::with_capacity(options.len());
    for option in options {
        debug!("Selecting option #{} ({}) on {}", option.position, option.value, url);
        select_option(session, option)?;
        session.settle(settle);
        let snapshot = read_snapshot(session)?;
        records.push(base.clone().overlay(snapshot.into_fields()));
    }
    Ok(records)
}

fn select_option(session: &mut dyn BrowserSession, option: &VariantOption) -> Result<(), ScrapeError> {
    let value = serde_json::to_string(&option.value)?;
    session.execute(&format!(
        "document.getElementsByTagName('select')[0].value = {};",
        value
    ))?;
    session.execute(CHANGE_HANDLER_SCRIPT)
}

/// Price and unit both come from the first price block on the page.
pub fn read_snapshot(session: &mut dyn BrowserSession) -> Result<VariantSnapshot, ScrapeError> {
    let price = session
        .texts_within(PRICE_BLOCK_SELECTOR, PRICE_SELECTOR)?
        .into_iter()
        .next()
        .ok_or_else(|| ScrapeError::MissingElement(PRICE_SELECTOR.into()))?;
    let unit = session
        .texts_within(PRICE_BLOCK_SELECTOR, UNIT_SELECTOR)?
        .into_iter()
        .next()
        .map(|unit| clean_unit(&unit));
    let characteristics = pair_characteristics(session.texts(CHARACTERISTICS_SELECTOR)?);
    let properties = session
        .visible_texts(PROPERTY_SELECTOR)?
        .iter()
        .filter_map(|text| parse_property(text))
        .collect();

    Ok(VariantSnapshot {
        price,
        unit,
        characteristics,
        properties,
    })
}

/// `"Diameter:\n32 mm"` -> `("Diameter", "32 mm")`. Controls without a value line are skipped.
pub fn parse_property(text: &str) -> Option<(String, String)> {
    let mut lines = text.trim().lines();
    let name = lines.next()?.trim_end().trim_end_matches(':').trim();
    let value = lines.next()?.trim();
    Some((name.to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Selector -> texts. Keys of the form `"{scope} {selector}"` hold matches
    /// inside the first `scope` element only.
    type PageState = HashMap<String, Vec<String>>;

    fn within(scope: &str, selector: &str) -> String {
        format!("{} {}", scope, selector)
    }

    /// Scripted page: each `ChangeSelect` call advances to the next state.
    #[derive(Default)]
    struct FakeSession {
        states: Vec<PageState>,
        current: Option<usize>,
        navigated: Vec<String>,
        scripts: Vec<String>,
        settles: usize,
        fail_on_state: Option<usize>,
    }

    impl FakeSession {
        fn state(&self) -> Option<&PageState> {
            self.current.and_then(|i| self.states.get(i))
        }
    }

    impl BrowserSession for FakeSession {
        fn navigate(&mut self, url: &str) -> Result<(), ScrapeError> {
            self.navigated.push(url.to_string());
            Ok(())
        }

        fn execute(&mut self, script: &str) -> Result<(), ScrapeError> {
            self.scripts.push(script.to_string());
            if script.starts_with("ChangeSelect") {
                self.current = Some(self.current.map_or(0, |i| i + 1));
            }
            Ok(())
        }

        fn texts(&mut self, selector: &str) -> Result<Vec<String>, ScrapeError> {
            if self.current.is_some() && self.current == self.fail_on_state {
                return Err(ScrapeError::MissingElement(selector.to_string()));
            }
            Ok(self
                .state()
                .and_then(|s| s.get(selector).cloned())
                .unwrap_or_default())
        }

        fn texts_within(&mut self, scope: &str, selector: &str) -> Result<Vec<String>, ScrapeError> {
            self.texts(&within(scope, selector))
        }

        fn visible_texts(&mut self, selector: &str) -> Result<Vec<String>, ScrapeError> {
            self.texts(selector)
        }

        fn settle(&mut self, _delay: Duration) {
            self.settles += 1;
        }

        fn close(&mut self) -> Result<(), ScrapeError> {
            Ok(())
        }
    }

    fn state(price: &str, unit: Option<&str>, chars: &[&str], props: &[&str]) -> PageState {
        let mut s = HashMap::new();
        s.insert(within(PRICE_BLOCK_SELECTOR, PRICE_SELECTOR), vec![price.to_string()]);
        if let Some(unit) = unit {
            s.insert(within(PRICE_BLOCK_SELECTOR, UNIT_SELECTOR), vec![unit.to_string()]);
        }
        s.insert(CHARACTERISTICS_SELECTOR.to_string(), chars.iter().map(|c| c.to_string()).collect());
        s.insert(PROPERTY_SELECTOR.to_string(), props.iter().map(|p| p.to_string()).collect());
        s
    }

    fn product() -> Product {
        Product {
            url: "https://shop.test/element/valve/".into(),
            name: "Valve".into(),
            categories: "Catalog, Valves".into(),
            ..Default::default()
        }
    }

    fn options(values: &[&str]) -> Vec<VariantOption> {
        values
            .iter()
            .enumerate()
            .map(|(position, v)| VariantOption { position, value: v.to_string() })
            .collect()
    }

    #[test]
    fn one_record_per_option_in_order() {
        let mut session = FakeSession {
            states: vec![
                state("100", Some("/ шт"), &["Weight", "1 kg"], &["Diameter:\n20 mm"]),
                state("150", None, &["Weight", "2 kg"], &["Diameter:\n25 mm"]),
            ],
            ..Default::default()
        };
        let product = product();

        let records = enumerate_variants(
            &mut session,
            &product.url,
            &product,
            &options(&["20", "25"]),
            Duration::from_millis(200),
        )
        .unwrap();

        assert_eq!(session.navigated, [product.url.clone()]);
        assert_eq!(session.settles, 2);
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.url(), Some(product.url.as_str()));
            assert_eq!(record.get("name"), Some("Valve"));
            assert_eq!(record.get("categories"), Some("Catalog, Valves"));
        }
        assert_eq!(records[0].get("price"), Some("100"));
        assert_eq!(records[0].get("unit"), Some("шт"));
        assert_eq!(records[0].get("Diameter"), Some("20 mm"));
        assert_eq!(records[1].get("price"), Some("150"));
        assert_eq!(records[1].get("unit"), Some(""));
        assert_eq!(records[1].get("Weight"), Some("2 kg"));
        assert_eq!(records[1].get("Diameter"), Some("25 mm"));
    }

    #[test]
    fn option_value_is_injected_as_js_string() {
        let mut session = FakeSession {
            states: vec![state("1", None, &[], &[])],
            ..Default::default()
        };
        let product = product();
        enumerate_variants(&mut session, &product.url, &product, &options(&["it's"]), Duration::ZERO)
            .unwrap();

        assert_eq!(
            session.scripts,
            [
                "document.getElementsByTagName('select')[0].value = \"it's\";".to_string(),
                CHANGE_HANDLER_SCRIPT.to_string(),
            ]
        );
    }

    #[test]
    fn failure_mid_enumeration_propagates() {
        let mut session = FakeSession {
            states: vec![state("1", None, &[], &[]), state("2", None, &[], &[])],
            fail_on_state: Some(1),
            ..Default::default()
        };
        let product = product();
        let result =
            enumerate_variants(&mut session, &product.url, &product, &options(&["a", "b"]), Duration::ZERO);
        assert!(matches!(result, Err(ScrapeError::MissingElement(_))));
    }

    #[test]
    fn missing_price_is_an_error() {
        let mut session = FakeSession {
            states: vec![HashMap::new()],
            ..Default::default()
        };
        let product = product();
        let result =
            enumerate_variants(&mut session, &product.url, &product, &options(&["a"]), Duration::ZERO);
        assert!(matches!(result, Err(ScrapeError::MissingElement(s)) if s == PRICE_SELECTOR));
    }

    #[test]
    fn unit_outside_first_price_block_is_ignored() {
        let mut page = state("100", None, &[], &[]);
        // a later price block carries a unit, the first one does not
        page.insert(UNIT_SELECTOR.to_string(), vec!["/ кг".to_string()]);
        let mut session = FakeSession {
            states: vec![page],
            current: Some(0),
            ..Default::default()
        };

        let snapshot = read_snapshot(&mut session).unwrap();

        assert_eq!(snapshot.price, "100");
        assert_eq!(snapshot.unit, None);
    }

    #[test]
    fn property_text_parsing() {
        assert_eq!(
            parse_property("  Color:\nRed \n"),
            Some(("Color".to_string(), "Red".to_string()))
        );
        assert_eq!(parse_property("Color:"), None);
    }
}
