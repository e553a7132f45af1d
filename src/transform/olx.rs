//! OLX field mappings.
//!
//! OLX reports room counts as English word forms and floors as
//! `floor_<n>` codes. It never reports garage, heating, lift or rent,
//! so those attributes stay at their sentinels for every OLX row.

use super::{iso_date_key, market_type, GapCounter, Normalizer};
use crate::model::dims::{CarGarage, Furniture, Heating, Lift, Source};
use crate::model::{date_key, NormalizedListing, RawListing, UNSET_BUILDING_YEAR};

pub struct OlxNormalizer;

impl Normalizer for OlxNormalizer {
    fn source(&self) -> Source {
        Source::Olx
    }

    fn normalize_one(&self, raw: &RawListing, gaps: &mut GapCounter) -> NormalizedListing {
        NormalizedListing {
            id: raw.id,
            source: Source::Olx,
            snapshot_date: date_key(raw.snapshot_date),
            city: raw.city,
            market_type: market_type(raw.market_type.as_deref(), gaps),
            create_date: iso_date_key(raw.create_date.as_deref(), "create_date", gaps),
            modify_date: iso_date_key(raw.modify_date.as_deref(), "modify_date", gaps),
            title: raw.title.clone(),
            url: raw.url.clone(),
            price: raw.price.clone(),
            price_per_square_m: raw.price_per_m.clone(),
            area: raw.area.clone(),
            rooms_number: rooms_from_words(raw.rooms_num.as_deref(), gaps),
            floor: floor_number(raw.floor.as_deref(), gaps),
            building_year: UNSET_BUILDING_YEAR,
            furniture: furniture_flag(raw.furniture.as_deref(), gaps),
            car_garage: CarGarage::Unknown,
            heating: Heating::Unknown,
            lift: Lift::Unknown,
            rent: None,
        }
    }
}

/// Word-form room counts, `"one"`..`"ten"`.
fn rooms_from_words(value: Option<&str>, gaps: &mut GapCounter) -> Option<i32> {
    let v = value?;
    let n = match v {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        _ => {
            gaps.record("rooms_number", v);
            return None;
        }
    };
    Some(n)
}

/// `floor_<n>` codes.
fn floor_number(value: Option<&str>, gaps: &mut GapCounter) -> Option<i32> {
    let v = value?;
    if let Some(n) = v.strip_prefix("floor_").and_then(|s| s.parse().ok()) {
        return Some(n);
    }
    gaps.record("floor", v);
    None
}

fn furniture_flag(value: Option<&str>, gaps: &mut GapCounter) -> Furniture {
    match value {
        None => Furniture::Unknown,
        Some("yes") => Furniture::Present,
        Some("no") => Furniture::Absent,
        Some(v) => {
            gaps.record("furniture", v);
            Furniture::Unknown
        }
    }
}
