use scraper::{ElementRef, Html, Selector};

use crate::error::ScrapeError;
use crate::record::{pair_characteristics, CharacteristicRecord, Product};
use crate::variants::VariantOption;

/// How a product page has to be turned into records.
#[derive(Debug, Clone, PartialEq)]
pub enum PageLayout {
    /// Everything is in the static HTML; one record.
    SingleVariant(CharacteristicRecord),
    /// An option selector with several entries; each needs a browser round trip.
    MultiVariant {
        product: Product,
        options: Vec<VariantOption>,
    },
}

/// Static-HTML side of product extraction. Selectors are compiled once.
pub struct Extractor {
    breadcrumbs: Selector,
    item_detail: Selector,
    title_div: Selector,
    title_h1: Selector,
    catalog: Selector,
    catalog_item: Selector,
    catalog_label: Selector,
    change_property: Selector,
    option: Selector,
    price_block: Selector,
    price_info: Selector,
    price_meta: Selector,
    unit: Selector,
    characteristics: Selector,
    div: Selector,
}

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector must parse")
}

fn element_text(element: ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Price unit label as shown next to the price, e.g. `"/ м"` -> `"м"`.
pub fn clean_unit(text: &str) -> String {
    text.trim().replace("/ ", "")
}

impl Extractor {
    pub fn new() -> Self {
        Extractor {
            breadcrumbs: selector("div.bx_breadcrumbs"),
            item_detail: selector("div.bx_item_detail"),
            title_div: selector("div.h1_cart_2"),
            title_h1: selector("h1.h1_cart"),
            catalog: selector("div.br_catalog.bk"),
            catalog_item: selector(r#"div[itemprop="itemListElement"]"#),
            catalog_label: selector("a span"),
            change_property: selector("div.change_property"),
            option: selector("option"),
            price_block: selector("div.goods_price_val"),
            price_info: selector("div.goods_price_val_inf"),
            price_meta: selector(r#"meta[itemprop="price"]"#),
            unit: selector("span.mash01"),
            characteristics: selector("div.har_mob"),
            div: selector("div"),
        }
    }

    /// Validates a fetched page and decides whether it is single- or multi-variant.
    pub fn classify(&self, url: &str, html: &str) -> Result<PageLayout, ScrapeError> {
        let document = Html::parse_document(html);

        if document.select(&self.breadcrumbs).next().is_none() {
            return Err(ScrapeError::MissingContainers);
        }
        let card = document
            .select(&self.item_detail)
            .next()
            .ok_or(ScrapeError::MissingContainers)?;

        let mut product = Product::new(url);
        product.name = self.title(card).ok_or(ScrapeError::MissingTitle)?;
        product.categories = self.categories(&document)?;

        let options = self.options(card);
        if options.len() > 1 {
            return Ok(PageLayout::MultiVariant { product, options });
        }

        if let Some(block) = card.select(&self.price_block).next() {
            let info = block
                .select(&self.price_info)
                .next()
                .ok_or_else(|| ScrapeError::MissingElement("div.goods_price_val_inf".into()))?;
            product.price = info
                .select(&self.price_meta)
                .next()
                .and_then(|meta| meta.value().attr("content"))
                .ok_or_else(|| ScrapeError::MissingElement(r#"meta[itemprop="price"]"#.into()))?
                .trim()
                .to_string();
            product.unit = info
                .select(&self.unit)
                .next()
                .map(|unit| clean_unit(&element_text(unit)));
        }

        let record = product.fields().overlay(self.characteristic_pairs(&document));
        Ok(PageLayout::SingleVariant(record))
    }

    fn title(&self, card: ElementRef) -> Option<String> {
        card.select(&self.title_div)
            .next()
            .or_else(|| card.select(&self.title_h1).next())
            .map(element_text)
    }

    fn categories(&self, document: &Html) -> Result<String, ScrapeError> {
        let catalog = document
            .select(&self.catalog)
            .next()
            .ok_or_else(|| ScrapeError::MissingElement("div.br_catalog.bk".into()))?;

        let labels = catalog
            .select(&self.catalog_item)
            .map(|item| {
                item.select(&self.catalog_label)
                    .next()
                    .map(element_text)
                    .ok_or_else(|| ScrapeError::MissingElement("a span".into()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(labels.join(", "))
    }

    fn options(&self, card: ElementRef) -> Vec<VariantOption> {
        let Some(control) = card.select(&self.change_property).next() else {
            return Vec::new();
        };
        control
            .select(&self.option)
            .enumerate()
            .map(|(position, option)| VariantOption {
                position,
                value: option
                    .value()
                    .attr("value")
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(option)),
            })
            .collect()
    }

    fn characteristic_pairs(&self, document: &Html) -> Vec<(String, String)> {
        match document.select(&self.characteristics).next() {
            Some(block) => pair_characteristics(block.select(&self.div).map(element_text)),
            None => Vec::new(),
        }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}
