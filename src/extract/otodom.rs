//! OtoDom offer extraction.
//!
//! Search results are HTML, but individual offers are served as JSON
//! documents by the Next.js `_next/data` endpoint. The endpoint needs
//! the current build id (`OTODOM_KEY`), which rotates with site deploys.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use scraper::{Html, Selector};
use serde_json::Value;

use crate::error::EtlError;
use crate::extract::fetcher::{self, Page};
use crate::extract::{scalar_string, SiteExtractor};
use crate::model::dims::{City, Source};
use crate::model::RawListing;

/// Heading shown when a city search yields nothing.
const NO_RESULTS_MARKER: &str = "Nie znaleźliśmy żadnych ogłoszeń";

pub struct OtodomExtractor {
    base_url: String,
    key: String,
}

impl OtodomExtractor {
    pub fn new(base_url: &str, key: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
        }
    }
}

#[async_trait]
impl SiteExtractor for OtodomExtractor {
    fn source(&self) -> Source {
        Source::Otodom
    }

    fn page_url(&self, city: City, page: u32) -> String {
        format!(
            "{}/pl/wyniki/sprzedaz/mieszkanie{}?limit=72&viewType=listing&page={}",
            self.base_url,
            city.otodom_path(),
            page
        )
    }

    fn page_exists(&self, page: &Page) -> bool {
        if !page.status.is_success() {
            return false;
        }
        !has_no_results_marker(&page.body)
    }

    fn listing_urls(&self, page: &Page) -> Vec<String> {
        let document = Html::parse_document(&page.body);
        // Organic result cards live in sections of the eeungyz family;
        // other sections carry ads and promoted units.
        let selector = Selector::parse(r#"section[class*="eeungyz"] a.css-16vl3c1"#).unwrap();

        document
            .select(&selector)
            .filter_map(|a| a.value().attr("href"))
            .map(|href| format!("{}/_next/data/{}{}.json", self.base_url, self.key, href))
            .collect()
    }

    async fn fetch_listing(
        &self,
        client: &Client,
        url: &str,
        city: City,
        snapshot_date: NaiveDate,
    ) -> Result<RawListing, EtlError> {
        let body = fetcher::fetch_body(client, url).await?;
        let ad = parse_listing_document(url, &body)?;
        project_listing(url, city, snapshot_date, &ad)
    }
}

fn has_no_results_marker(body: &str) -> bool {
    let document = Html::parse_document(body);
    let selector = Selector::parse("h3").unwrap();
    document
        .select(&selector)
        .any(|h| h.text().collect::<String>().trim() == NO_RESULTS_MARKER)
}

/// Deserializes a `_next/data` document and digs out the ad payload.
pub(crate) fn parse_listing_document(url: &str, body: &str) -> Result<Value, EtlError> {
    let document: Value =
        serde_json::from_str(body).map_err(|e| EtlError::parse(url, e.to_string()))?;
    document
        .pointer("/pageProps/ad")
        .cloned()
        .ok_or_else(|| EtlError::parse(url, "pageProps.ad missing from data document"))
}

fn project_listing(
    url: &str,
    city: City,
    snapshot_date: NaiveDate,
    ad: &Value,
) -> Result<RawListing, EtlError> {
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
        .pointer("/target/Price")
        .and_then(scalar_string)
        .ok_or_else(|| EtlError::schema(url, "price"))?;

    let mut listing = RawListing {
        id,
        source: Source::Otodom,
        snapshot_date,
        city,
        market_type: ad.get("market").and_then(scalar_string),
        create_date: ad
            .get("createdAt")
            .and_then(Value::as_str)
            .map(str::to_string),
        modify_date: ad
            .get("modifiedAt")
            .and_then(Value::as_str)
            .map(str::to_string),
        title,
        url: offer_url,
        price,
        price_per_m: ad.pointer("/target/Price_per_m").and_then(scalar_string),
        area: ad.pointer("/target/Area").and_then(scalar_string),
        rooms_num: None,
        floor: None,
        furniture: None,
        building_year: ad.pointer("/target/Build_year").and_then(scalar_string),
        car: None,
        rent: None,
        heating: None,
        lift: None,
    };

    // Label/values attribute lists; only labels the shared schema
    // recognizes are kept.
    for (label, value) in labelled_values(ad, "topInformation") {
        match label.as_str() {
            "rooms_num" => listing.rooms_num = Some(value),
            "car" => listing.car = Some(value),
            "rent" => listing.rent = Some(value),
            "floor" => listing.floor = Some(value),
            "heating" => listing.heating = Some(value),
            _ => {}
        }
    }
    for (label, value) in labelled_values(ad, "additionalInformation") {
        if label == "lift" {
            listing.lift = Some(value);
        }
    }

    Ok(listing)
}

fn labelled_values(ad: &Value, section: &str) -> Vec<(String, String)> {
    let Some(entries) = ad.get(section).and_then(Value::as_array) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let label = entry.get("label").and_then(Value::as_str)?;
            let value = entry.get("values").and_then(scalar_string)?;
            Some((label.to_string(), value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use serde_json::json;

    fn page(status: StatusCode, body: &str) -> Page {
        Page {
            status,
            requested_url: "https://www.otodom.pl/test?page=1".to_string(),
            final_url: "https://www.otodom.pl/test?page=1".to_string(),
            body: body.to_string(),
        }
    }

    fn extractor() -> OtodomExtractor {
        OtodomExtractor::new("https://www.otodom.pl", "4JKqPCoRE7cVNqIQeP-Pf")
    }

    #[test]
    fn page_url_follows_the_otodom_pagination_convention() {
        assert_eq!(
            extractor().page_url(City::Warszawa, 2),
            "https://www.otodom.pl/pl/wyniki/sprzedaz/mieszkanie/mazowieckie/warszawa/warszawa/warszawa?limit=72&viewType=listing&page=2"
        );
    }

    #[test]
    fn page_exists_unless_the_empty_results_heading_is_shown() {
        assert!(extractor().page_exists(&page(StatusCode::OK, "<html><body>offers</body></html>")));

        let body = format!("<html><body><h3>{NO_RESULTS_MARKER}</h3></body></html>");
        assert!(!extractor().page_exists(&page(StatusCode::OK, &body)));

        assert!(!extractor().page_exists(&page(StatusCode::FORBIDDEN, "x")));
    }

    #[test]
    fn listing_urls_rewrite_hrefs_to_the_data_endpoint() {
        let body = r#"<html><body>
            <section class="eeungyz1 listing">
                <a class="css-16vl3c1 e17g0c820" href="/pl/oferta/mieszkanie-ID4abc">x</a>
            </section>
            <section class="promoted">
                <a class="css-16vl3c1 e17g0c820" href="/pl/oferta/mieszkanie-ID4promo">y</a>
            </section>
        </body></html>"#;

        let urls = extractor().listing_urls(&page(StatusCode::OK, body));
        assert_eq!(
            urls,
            vec![
                "https://www.otodom.pl/_next/data/4JKqPCoRE7cVNqIQeP-Pf/pl/oferta/mieszkanie-ID4abc.json"
            ]
        );
    }

    #[test]
    fn malformed_data_document_is_a_parse_error() {
        assert!(matches!(
            parse_listing_document("u", "not json"),
            Err(EtlError::Parse { .. })
        ));
        assert!(matches!(
            parse_listing_document("u", r#"{"pageProps":{}}"#),
            Err(EtlError::Parse { .. })
        ));
    }

    fn sample_ad() -> Value {
        json!({
            "id": 64921337,
            "market": "primary",
            "createdAt": "2024-07-28T11:00:00+02:00",
            "modifiedAt": "2024-08-12T08:30:00+02:00",
            "title": "Nowe mieszkanie, Mokotów",
            "url": "https://www.otodom.pl/pl/oferta/nowe-mieszkanie-ID4abc",
            "target": {
                "Price": 820000,
                "Price_per_m": 16400,
                "Area": "50",
                "Build_year": "2021",
                "Construction_status": ["ready_to_use"]
            },
            "topInformation": [
                { "label": "rooms_num", "values": ["2"] },
                { "label": "car", "values": ["extras_types-85::garage"] },
                { "label": "rent", "values": ["650 zł"] },
                { "label": "floor", "values": ["floor_4"] },
                { "label": "outdoor", "values": ["balcony"] },
                { "label": "heating", "values": ["heating::urban"] }
            ],
            "additionalInformation": [
                { "label": "building_material", "values": ["brick"] },
                { "label": "lift", "values": ["::y"] }
            ]
        })
    }

    #[test]
    fn projection_keeps_recognized_labels_and_ignores_the_rest() {
        let date = NaiveDate::from_ymd_opt(2024, 8, 14).unwrap();
        let listing = project_listing("u", City::Warszawa, date, &sample_ad()).unwrap();

        assert_eq!(listing.id, 64921337);
        assert_eq!(listing.source, Source::Otodom);
        assert_eq!(listing.price, "820000");
        assert_eq!(listing.price_per_m.as_deref(), Some("16400"));
        assert_eq!(listing.area.as_deref(), Some("50"));
        assert_eq!(listing.building_year.as_deref(), Some("2021"));
        assert_eq!(listing.market_type.as_deref(), Some("primary"));
        assert_eq!(listing.rooms_num.as_deref(), Some("2"));
        assert_eq!(listing.car.as_deref(), Some("extras_types-85::garage"));
        assert_eq!(listing.rent.as_deref(), Some("650 zł"));
        assert_eq!(listing.floor.as_deref(), Some("floor_4"));
        assert_eq!(listing.heating.as_deref(), Some("heating::urban"));
        assert_eq!(listing.lift.as_deref(), Some("::y"));
        // outdoor and building_material are not part of the shared schema
        assert_eq!(listing.furniture, None);
    }

    #[test]
    fn projection_without_id_is_a_schema_error() {
        let mut ad = sample_ad();
        ad.as_object_mut().unwrap().remove("id");

        let date = NaiveDate::from_ymd_opt(2024, 8, 14).unwrap();
        let err = project_listing("u", City::Warszawa, date, &ad).unwrap_err();
        assert!(matches!(err, EtlError::Schema { field: "id", .. }));
    }
}
