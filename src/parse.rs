use std::collections::HashSet;

use scraper::{Html, Selector};
use tokio::task::spawn_blocking;

use crate::constants::CATEGORY_APPLICATION;
use crate::macros::define_regex;
use crate::{Error, Result};

const CATEGORY_PREFIX: &str = "/store/apps/category/";
/// Below this many anchors the raw-text scan kicks in as well.
const MIN_CATEGORY_ANCHORS: usize = 5;

define_regex!(CATEGORY_LINK, r"/store/apps/category/([A-Z0-9_]+)");

/// Strips the markup from an HTML snippet. `<br>` becomes a line break.
pub(crate) fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(&html.replace("<br>", "\n"));
    fragment.root_element().text().collect()
}

/// Parses the store front page off the async runtime and returns its category ids.
pub(crate) async fn parse_category_page(html: String) -> Result<Vec<String>> {
    spawn_blocking(move || category_ids(&html)).await?
}

/// Category ids linked from a page, in document order and without duplicates.
///
/// Age-filtered links are ignored. `APPLICATION` is always part of the result.
fn category_ids(html: &str) -> Result<Vec<String>> {
    let doc = Html::parse_document(html);
    let anchor_selector = create_selector("a[href]")?;

    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for anchor in doc.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(rest) = href.strip_prefix(CATEGORY_PREFIX) else {
            continue;
        };
        if href.contains("?age=") {
            continue;
        }
        let id = rest.split('?').next().unwrap_or_default();
        if !id.is_empty() && seen.insert(id.to_string()) {
            ids.push(id.to_string());
        }
    }

    if ids.len() < MIN_CATEGORY_ANCHORS {
        for caps in CATEGORY_LINK.captures_iter(html) {
            let id = &caps[1];
            if seen.insert(id.to_string()) {
                ids.push(id.to_string());
            }
        }
    }

    if !seen.contains(CATEGORY_APPLICATION) {
        ids.push(CATEGORY_APPLICATION.to_string());
    }
    Ok(ids)
}

#[inline]
fn create_selector(sel_str: &str) -> Result<Selector> {
    Selector::parse(sel_str).map_err(|_| Error::ParseSelector(sel_str.into()))
}
