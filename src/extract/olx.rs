//! OLX offer extraction.
//!
//! Search results are paginated HTML; the offer page itself embeds its
//! payload as an escaped JSON island under `__PRERENDERED_STATE__`.
//! Out-of-range page numbers redirect back to the first page instead of
//! returning an empty result, so the existence check compares the
//! resolved URL with the requested one.

use async_trait::async_trait;
use chrono::NaiveDate;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::EtlError;
use crate::extract::fetcher::{self, Page};
use crate::extract::{scalar_string, SiteExtractor};
use crate::model::dims::{City, Source};
use crate::model::RawListing;

/// Shown instead of results when a city has no more offers.
const NO_RESULTS_MARKER: &str = "Sprawdź ogłoszenia w większej odległości:";

const STATE_START: &str = "__PRERENDERED_STATE__= \"";
const STATE_END: &str = "\";";

pub struct OlxExtractor {
    base_url: String,
}

impl OlxExtractor {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl SiteExtractor for OlxExtractor {
    fn source(&self) -> Source {
        Source::Olx
    }

    fn page_url(&self, city: City, page: u32) -> String {
        format!(
            "{}/{}/?page={}&view=grid",
            self.base_url,
            city.olx_slug(),
            page
        )
    }

    fn page_exists(&self, page: &Page) -> bool {
        if !page.status.is_success() {
            return false;
        }
        if has_no_results_marker(&page.body) {
            return false;
        }
        // Out-of-range pages redirect back to page 1; only the first
        // page is allowed to resolve to a different URL.
        page.final_url == page.requested_url || requested_page(&page.requested_url) == Some(1)
    }

    fn listing_urls(&self, page: &Page) -> Vec<String> {
        let document = Html::parse_document(&page.body);
        let selector = Selector::parse("a.css-z3gu2d").unwrap();

        let mut urls = Vec::new();
        for el in document.select(&selector) {
            let Some(href) = el.value().attr("href") else {
                continue;
            };
            // Promoted cards cross-link to otodom; those belong to the
            // other extractor.
            if href.contains("otodom") {
                continue;
            }
            if href.starts_with('/') {
                urls.push(format!("https://www.olx.pl{href}"));
            } else {
                urls.push(href.to_string());
            }
        }
        urls
    }

    async fn fetch_listing(
        &self,
        client: &Client,
        url: &str,
        city: City,
        snapshot_date: NaiveDate,
    ) -> Result<RawListing, EtlError> {
        let html = fetcher::fetch_body(client, url).await?;
        let state = extract_prerendered_state(url, &html)?;
        project_listing(url, city, snapshot_date, &state)
    }
}

/// Page number carried in the `page` query parameter.
fn requested_page(url: &str) -> Option<u32> {
    let re = Regex::new(r"page=(\d+)").unwrap();
    re.captures(url)?.get(1)?.as_str().parse().ok()
}

fn has_no_results_marker(body: &str) -> bool {
    let document = Html::parse_document(body);
    let selector = Selector::parse("p").unwrap();
    document
        .select(&selector)
        .any(|p| p.text().collect::<String>().trim() == NO_RESULTS_MARKER)
}

/// Locates and deserializes the escaped JSON island embedded in the
/// offer page script block.
pub(crate) fn extract_prerendered_state(url: &str, html: &str) -> Result<Value, EtlError> {
    let start = html
        .find(STATE_START)
        .ok_or_else(|| EtlError::parse(url, "__PRERENDERED_STATE__ island not found"))?
        + STATE_START.len();
    let rest = &html[start..];
    let end = rest.find(STATE_END).unwrap_or(rest.len());

    let unescaped = rest[..end].replace("\\\"", "\"").replace("\\\\\"", "\\\"");
    serde_json::from_str(&unescaped).map_err(|e| EtlError::parse(url, e.to_string()))
}

fn project_listing(
    url: &str,
    city: City,
    snapshot_date: NaiveDate,
    state: &Value,
) -> Result<RawListing, EtlError> {
    let ad = state
        .pointer("/ad/ad")
        .ok_or_else(|| EtlError::parse(url, "ad payload missing from prerendered state"))?;

    let id = ad
        .get("id")
        .and_then(Value::as_i64)
        .ok_or_else(|| EtlError::schema(url, "id"))?;
    let title = ad
        .get("title")
        .and_then(Value::as_str)
        .ok_or_else(|| EtlError::schema(url, "title"))?
        .to_string();
    let offer_url = ad
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| EtlError::schema(url, "url"))?
        .to_string();
    let price = ad
        .pointer("/price/regularPrice/value")
        .and_then(scalar_string)
        .ok_or_else(|| EtlError::schema(url, "price"))?;

    let mut listing = RawListing {
        id,
        source: Source::Olx,
        snapshot_date,
        city,
        market_type: None,
        create_date: ad
            .get("createdTime")
            .and_then(Value::as_str)
            .map(str::to_string),
        modify_date: ad
            .get("lastRefreshTime")
            .and_then(Value::as_str)
            .map(str::to_string),
        title,
        url: offer_url,
        price,
        price_per_m: None,
        area: None,
        rooms_num: None,
        floor: None,
        furniture: None,
        building_year: None,
        car: None,
        rent: None,
        heating: None,
        lift: None,
    };

    // Attribute list of (key, normalizedValue) pairs; only keys the
    // shared schema recognizes are kept, the rest are ignored.
    if let Some(params) = ad.get("params").and_then(Value::as_array) {
        for entry in params {
            let Some(key) = entry.get("key").and_then(Value::as_str) else {
                continue;
            };
            let Some(value) = entry.get("normalizedValue").and_then(scalar_string) else {
                continue;
            };
            match key {
                "price_per_m" => listing.price_per_m = Some(value),
                "floor_select" => listing.floor = Some(value),
                "furniture" => listing.furniture = Some(value),
                "market" => listing.market_type = Some(value),
                "m" => listing.area = Some(value),
                "rooms" => listing.rooms_num = Some(value),
                _ => {}
            }
        }
    }

    Ok(listing)
}
