//! Record schemas flowing through the pipeline.
//!
//! `RawListing` is ephemeral, produced by an extractor and consumed by a
//! normalizer within the same run. `NormalizedListing` is the shared
//! cross-source schema persisted as an interim batch. `FactListing` is
//! the final shape appended to the warehouse.

pub mod dims;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use dims::{CarGarage, City, Furniture, Heating, Lift, MarketType, Source};

/// Named sentinel for "year not reported"; survives until reconciliation
/// where anything below 1900 collapses to null.
pub const UNSET_BUILDING_YEAR: i32 = -1;

/// One offer as obtained from a source's embedded payload. Every field
/// the shared schema recognizes is present here; attributes the source
/// never reports stay `None` rather than being conditionally absent.
#[derive(Debug, Clone)]
pub struct RawListing {
    pub id: i64,
    pub source: Source,
    pub snapshot_date: NaiveDate,
    pub city: City,
    pub market_type: Option<String>,
    pub create_date: Option<String>,
    pub modify_date: Option<String>,
    pub title: String,
    pub url: String,
    pub price: String,
    pub price_per_m: Option<String>,
    pub area: Option<String>,
    pub rooms_num: Option<String>,
    pub floor: Option<String>,
    pub furniture: Option<String>,
    pub building_year: Option<String>,
    pub car: Option<String>,
    pub rent: Option<String>,
    pub heating: Option<String>,
    pub lift: Option<String>,
}

/// Shared schema both sources align to columnarly. Dates are integer
/// `YYYYMMDD` keys; money and area stay as canonical strings until the
/// reconciler coerces them. Derives `Eq + Hash` so the reconciler can
/// deduplicate on full-row equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NormalizedListing {
    pub id: i64,
    pub source: Source,
    pub snapshot_date: i32,
    pub city: City,
    pub market_type: MarketType,
    pub create_date: Option<i32>,
    pub modify_date: Option<i32>,
    pub title: String,
    pub url: String,
    pub price: String,
    pub price_per_square_m: Option<String>,
    pub area: Option<String>,
    pub rooms_number: Option<i32>,
    pub floor: Option<i32>,
    pub building_year: i32,
    pub furniture: Furniture,
    pub car_garage: CarGarage,
    pub heating: Heating,
    pub lift: Lift,
    pub rent: Option<String>,
}

/// Final row shape of `fac_estate_offers_snpt`. Categorical attributes
/// are replaced by surrogate keys; `-1` is the explicit unknown key.
/// Identity is `(dd_offer_id, source_id, snpt_date_id)` but the table is
/// append-only and never enforces it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactListing {
    pub dd_offer_id: i64,
    pub source_id: i32,
    pub snpt_date_id: i32,
    pub city_id: i32,
    pub market_type_id: i32,
    pub create_date_id: Option<i32>,
    pub modify_date_id: Option<i32>,
    pub title: String,
    pub url: String,
    pub price: f64,
    pub price_per_square_m: Option<f64>,
    pub area: Option<f64>,
    pub rooms_number: Option<i32>,
    pub floor: Option<i32>,
    pub building_year: Option<i32>,
    pub offer_characteristics_id: Option<i32>,
    pub rent: Option<f64>,
}

/// Calendar date as the warehouse integer key, e.g. 2024-08-14 -> 20240814.
pub fn date_key(date: NaiveDate) -> i32 {
    date.year() * 10000 + date.month() as i32 * 100 + date.day() as i32
}
