use std::fs;
use std::path::Path;
use log::info;
use quick_xml::events::Event;
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use reqwest::blocking::Client;

use crate::error::ScrapeError;

pub const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Reads the raw sitemap from an `http(s)://` URL or a local file.
pub fn load_sitemap(client: &Client, source: &str) -> Result<Vec<u8>, ScrapeError> {
    if source.starts_with("http://") || source.starts_with("https://") {
        info!("Fetching sitemap {}", source);
        let body = client.get(source).send()?.error_for_status()?.bytes()?;
        Ok(body.to_vec())
    } else {
        info!("Reading sitemap {:?}", Path::new(source));
        Ok(fs::read(source)?)
    }
}

/// Collects `urlset/url/loc` texts, in document order, that contain `marker`.
///
/// Only elements bound to the sitemap namespace count. Malformed XML is an
/// error: the sitemap defines the whole work list, so there is nothing to
/// salvage from a partial parse.
pub fn parse_sitemap(xml: &[u8], marker: &str) -> Result<Vec<String>, ScrapeError> {
    let mut reader = NsReader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut links = Vec::new();
    let mut depth = 0usize;
    let mut saw_root = false;
    let mut in_url = false;
    let mut loc: Option<String> = None;

    loop {
        match reader.read_resolved_event_into(&mut buf)? {
            (ns, Event::Start(e)) => {
                depth += 1;
                saw_root = true;
                let in_sitemap_ns =
                    matches!(ns, ResolveResult::Bound(Namespace(n)) if n == SITEMAP_NS.as_bytes());
                match e.local_name().as_ref() {
                    b"url" if in_sitemap_ns && depth == 2 => in_url = true,
                    b"loc" if in_sitemap_ns && in_url && depth == 3 => loc = Some(String::new()),
                    _ => {}
                }
            }
            (_, Event::Empty(_)) => saw_root = true,
            (_, Event::Text(t)) => {
                if let Some(text) = loc.as_mut() {
                    text.push_str(&t.unescape()?);
                }
            }
            (_, Event::CData(c)) => {
                if let Some(text) = loc.as_mut() {
                    text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            (_, Event::End(_)) => {
                if depth == 3 {
                    if let Some(text) = loc.take() {
                        let link = text.trim();
                        if link.contains(marker) {
                            links.push(link.to_string());
                        }
                    }
                } else if depth == 2 {
                    in_url = false;
                }
                depth = depth.saturating_sub(1);
            }
            (_, Event::Eof) => break,
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ScrapeError::EmptySitemap);
    }
    info!("Sitemap lists {} product pages.", links.len());
    Ok(links)
}
