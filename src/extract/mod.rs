//! Offer discovery and extraction.
//!
//! Each source implements the [`SiteExtractor`] strategy; the drivers in
//! this module walk result pages sequentially and fetch every discovered
//! listing. Discovery stops at the first page the source reports as
//! non-existent - a transient failure is indistinguishable from "no more
//! pages" and ends discovery for that city.

pub mod fetcher;
pub mod olx;
pub mod otodom;

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::error::EtlError;
use crate::model::dims::{City, Source};
use crate::model::RawListing;
use fetcher::Page;

#[async_trait]
pub trait SiteExtractor {
    fn source(&self) -> Source;

    /// Search-result URL for a city page, following the source's
    /// pagination query convention.
    fn page_url(&self, city: City, page: u32) -> String;

    /// Whether a fetched result page holds offers. Pure so the stopping
    /// predicate can be tested against synthetic pages.
    fn page_exists(&self, page: &Page) -> bool;

    /// Listing URLs present on a result page.
    fn listing_urls(&self, page: &Page) -> Vec<String>;

    /// Fetch one listing and project its payload into a raw record.
    async fn fetch_listing(
        &self,
        client: &Client,
        url: &str,
        city: City,
        snapshot_date: NaiveDate,
    ) -> Result<RawListing, EtlError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractReport {
    pub discovered: usize,
    pub extracted: usize,
    pub skipped: usize,
}

/// Walks result pages per city, starting at page 1, until the extractor
/// reports a non-existent page.
pub async fn discover_urls<E: SiteExtractor + ?Sized>(
    extractor: &E,
    client: &Client,
    cities: &[City],
    delay: Duration,
) -> BTreeMap<City, Vec<String>> {
    let mut all: BTreeMap<City, Vec<String>> = BTreeMap::new();

    for &city in cities {
        let mut seen: HashSet<String> = HashSet::new();
        let mut urls: Vec<String> = Vec::new();
        let mut page = 1u32;

        loop {
            let page_url = extractor.page_url(city, page);
            let fetched = match fetcher::fetch_page(client, &page_url).await {
                Ok(p) => p,
                Err(e) => {
                    warn!(city = %city, page, error = %e, "page fetch failed, ending discovery for city");
                    break;
                }
            };

            if !extractor.page_exists(&fetched) {
                debug!(city = %city, page, "no more result pages");
                break;
            }

            let links = extractor.listing_urls(&fetched);
            debug!(city = %city, page, count = links.len(), "collected listing urls");
            for link in links {
                if seen.insert(link.clone()) {
                    urls.push(link);
                }
            }

            page += 1;
            sleep(delay).await;
        }

        info!(source = %extractor.source(), city = %city, count = urls.len(), "discovery finished");
        all.insert(city, urls);
    }

    all
}

/// Fetches every discovered listing. A single listing's failure is
/// logged and skipped; the batch is best-effort complete.
pub async fn extract_listings<E: SiteExtractor + ?Sized>(
    extractor: &E,
    client: &Client,
    urls: &BTreeMap<City, Vec<String>>,
    snapshot_date: NaiveDate,
    delay: Duration,
) -> (Vec<RawListing>, ExtractReport) {
    let mut report = ExtractReport::default();
    let mut listings = Vec::new();

    for (&city, city_urls) in urls {
        report.discovered += city_urls.len();

        for url in city_urls {
            match extractor
                .fetch_listing(client, url, city, snapshot_date)
                .await
            {
                Ok(listing) => {
                    listings.push(listing);
                    report.extracted += 1;
                }
                Err(e) => {
                    warn!(source = %extractor.source(), url, error = %e, "listing skipped");
                    report.skipped += 1;
                }
            }

            // polite delay
            sleep(delay).await;
        }

        info!(
            source = %extractor.source(),
            city = %city,
            extracted = report.extracted,
            skipped = report.skipped,
            "city batch extracted"
        );
    }

    (listings, report)
}

/// Pulls the first scalar out of a JSON value: plain strings and numbers
/// directly, lists by their head element. Sources are inconsistent about
/// wrapping attribute values in one-element arrays.
pub(crate) fn scalar_string(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Array(items) => items.first().and_then(scalar_string),
        _ => None,
    }
}
