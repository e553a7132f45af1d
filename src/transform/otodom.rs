//! OtoDom field mappings.
//!
//! OtoDom uses compound codes: `rooms_num::more` for large flats,
//! `floor_<n>` with named ground-level variants, `::y`/`::n` boolean
//! suffixes and a `heating::<code>` vocabulary. Rent arrives as a
//! currency string. Furniture is never reported.

use super::{iso_date_key, market_type, GapCounter, Normalizer};
use crate::model::dims::{CarGarage, Furniture, Heating, Lift, Source};
use crate::model::{date_key, NormalizedListing, RawListing, UNSET_BUILDING_YEAR};

/// Stands in for "more than ten rooms" in the warehouse.
const MORE_ROOMS: i32 = 11;

pub struct OtodomNormalizer;

impl Normalizer for OtodomNormalizer {
    fn source(&self) -> Source {
        Source::Otodom
    }

    fn normalize_one(&self, raw: &RawListing, gaps: &mut GapCounter) -> NormalizedListing {
        NormalizedListing {
            id: raw.id,
            source: Source::Otodom,
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
            rooms_number: rooms_number(raw.rooms_num.as_deref(), gaps),
            floor: floor_number(raw.floor.as_deref(), gaps),
            building_year: building_year(raw.building_year.as_deref(), gaps),
            furniture: Furniture::Unknown,
            car_garage: car_garage_flag(raw.car.as_deref(), gaps),
            heating: heating_kind(raw.heating.as_deref(), gaps),
            lift: lift_flag(raw.lift.as_deref(), gaps),
            rent: rent_amount(raw.rent.as_deref(), gaps),
        }
    }
}

/// Numeric room counts, with `rooms_num::more` standing for 11+.
fn rooms_number(value: Option<&str>, gaps: &mut GapCounter) -> Option<i32> {
    let v = value?;
    if v == "rooms_num::more" {
        return Some(MORE_ROOMS);
    }
    match v.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            gaps.record("rooms_number", v);
            None
        }
    }
}

/// Ground-level codes collapse to floor 0 before the generic
/// `floor_<n>` split.
fn floor_number(value: Option<&str>, gaps: &mut GapCounter) -> Option<i32> {
    let v = value?;
    if matches!(v, "ground_floor" | "no::cellar" | "no::garret") {
        return Some(0);
    }
    if let Some(n) = v.rsplit('_').next().and_then(|s| s.parse().ok()) {
        return Some(n);
    }
    gaps.record("floor", v);
    None
}

fn building_year(value: Option<&str>, gaps: &mut GapCounter) -> i32 {
    let Some(v) = value else {
        return UNSET_BUILDING_YEAR;
    };
    match v.trim().parse() {
        Ok(year) => year,
        Err(_) => {
            gaps.record("building_year", v);
            UNSET_BUILDING_YEAR
        }
    }
}

fn car_garage_flag(value: Option<&str>, gaps: &mut GapCounter) -> CarGarage {
    match value {
        None => CarGarage::Absent,
        Some(v) if v.contains("garage") => CarGarage::Present,
        Some(v) => {
            gaps.record("car_garage", v);
            CarGarage::Unknown
        }
    }
}

fn heating_kind(value: Option<&str>, gaps: &mut GapCounter) -> Heating {
    let Some(v) = value else {
        return Heating::Unknown;
    };
    let code = v.rsplit("::").next().unwrap_or(v);
    match code {
        "urban" => Heating::Urban,
        "gas" => Heating::Gas,
        "electrical" => Heating::Electrical,
        "boiler_room" => Heating::BoilerRoom,
        "tiled_stove" => Heating::TiledStove,
        "other" => Heating::Other,
        _ => {
            gaps.record("heating", v);
            Heating::Unknown
        }
    }
}

fn lift_flag(value: Option<&str>, gaps: &mut GapCounter) -> Lift {
    match value {
        None => Lift::Unknown,
        Some(v) if v.ends_with("::y") => Lift::Present,
        Some(v) if v.ends_with("::n") => Lift::Absent,
        Some(v) => {
            gaps.record("lift", v);
            Lift::Unknown
        }
    }
}

/// Strips currency suffixes and spaces, normalizes the decimal
/// separator. Non-numeric leftovers become null, not an error.
fn rent_amount(value: Option<&str>, gaps: &mut GapCounter) -> Option<String> {
    let v = value?;
    let cleaned: String = v
        .replace("zł", "")
        .replace("EUR", "")
        .replace(',', ".")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if cleaned.is_empty() {
        return None;
    }
    if cleaned.parse::<f64>().is_err() {
        gaps.record("rent", v);
        return None;
    }
    Some(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dims::{City, MarketType};
    use chrono::NaiveDate;

    fn raw() -> RawListing {
        RawListing {
            id: 64921337,
            source: Source::Otodom,
            snapshot_date: NaiveDate::from_ymd_opt(2024, 8, 14).unwrap(),
            city: City::Warszawa,
            market_type: Some("primary".into()),
            create_date: Some("2024-07-28T11:00:00+02:00".into()),
            modify_date: Some("2024-08-12T08:30:00+02:00".into()),
            title: "Nowe mieszkanie, Mokotów".into(),
            url: "https://www.otodom.pl/pl/oferta/nowe-mieszkanie-ID4abc".into(),
            price: "820000".into(),
            price_per_m: Some("16400".into()),
            area: Some("50".into()),
            rooms_num: Some("2".into()),
            floor: Some("floor_4".into()),
            furniture: None,
            building_year: Some("2021".into()),
            car: Some("extras_types-85::garage".into()),
            rent: Some("650 zł".into()),
            heating: Some("heating::urban".into()),
            lift: Some("::y".into()),
        }
    }

    #[test]
    fn recognized_values_map_onto_the_shared_schema() {
        let (rows, gaps) = crate::transform::normalize(&[raw()], Source::Otodom);
        let row = &rows[0];

        assert_eq!(row.id, 64921337);
        assert_eq!(row.source, Source::Otodom);
        assert_eq!(row.snapshot_date, 20240814);
        assert_eq!(row.market_type, MarketType::Primary);
        assert_eq!(row.create_date, Some(20240728));
        assert_eq!(row.modify_date, Some(20240812));
        assert_eq!(row.rooms_number, Some(2));
        assert_eq!(row.floor, Some(4));
        assert_eq!(row.building_year, 2021);
        assert_eq!(row.car_garage, CarGarage::Present);
        assert_eq!(row.heating, Heating::Urban);
        assert_eq!(row.lift, Lift::Present);
        assert_eq!(row.rent.as_deref(), Some("650"));
        // otodom never reports furniture
        assert_eq!(row.furniture, Furniture::Unknown);
        assert!(gaps.is_empty());
    }

    #[test]
    fn rooms_num_more_maps_to_the_eleven_sentinel() {
        let mut gaps = GapCounter::default();
        assert_eq!(rooms_number(Some("rooms_num::more"), &mut gaps), Some(11));
        assert_eq!(rooms_number(Some("4"), &mut gaps), Some(4));
        assert!(gaps.is_empty());
        assert_eq!(rooms_number(Some("studio"), &mut gaps), None);
        assert_eq!(gaps.count("rooms_number"), 1);
    }

    #[test]
    fn ground_level_codes_map_to_floor_zero_before_the_split() {
        let mut gaps = GapCounter::default();
        assert_eq!(floor_number(Some("ground_floor"), &mut gaps), Some(0));
        assert_eq!(floor_number(Some("no::cellar"), &mut gaps), Some(0));
        assert_eq!(floor_number(Some("no::garret"), &mut gaps), Some(0));
        assert_eq!(floor_number(Some("floor_4"), &mut gaps), Some(4));
        assert_eq!(floor_number(Some("floor_10"), &mut gaps), Some(10));
        assert!(gaps.is_empty());
        assert_eq!(floor_number(Some("mezzanine"), &mut gaps), None);
        assert_eq!(gaps.count("floor"), 1);
    }

    #[test]
    fn missing_or_junk_building_year_falls_back_to_the_sentinel() {
        let mut gaps = GapCounter::default();
        assert_eq!(building_year(Some("1987"), &mut gaps), 1987);
        assert_eq!(building_year(None, &mut gaps), UNSET_BUILDING_YEAR);
        assert_eq!(building_year(Some("przedwojenne"), &mut gaps), UNSET_BUILDING_YEAR);
        assert_eq!(gaps.count("building_year"), 1);
    }

    #[test]
    fn garage_is_detected_by_substring_and_absence_means_no_garage() {
        let mut gaps = GapCounter::default();
        assert_eq!(
            car_garage_flag(Some("extras_types-85::garage"), &mut gaps),
            CarGarage::Present
        );
        assert_eq!(car_garage_flag(None, &mut gaps), CarGarage::Absent);
        assert!(gaps.is_empty());
        assert_eq!(
            car_garage_flag(Some("extras_types-12::carport"), &mut gaps),
            CarGarage::Unknown
        );
        assert_eq!(gaps.count("car_garage"), 1);
    }

    #[test]
    fn heating_codes_split_on_the_namespace_separator() {
        let mut gaps = GapCounter::default();
        assert_eq!(heating_kind(Some("heating::gas"), &mut gaps), Heating::Gas);
        assert_eq!(heating_kind(Some("heating::boiler_room"), &mut gaps), Heating::BoilerRoom);
        assert_eq!(heating_kind(None, &mut gaps), Heating::Unknown);
        assert!(gaps.is_empty());
        assert_eq!(heating_kind(Some("heating::geothermal"), &mut gaps), Heating::Unknown);
        assert_eq!(gaps.count("heating"), 1);
    }

    #[test]
    fn lift_boolean_suffixes_map_to_the_tri_state_flag() {
        let mut gaps = GapCounter::default();
        assert_eq!(lift_flag(Some("::y"), &mut gaps), Lift::Present);
        assert_eq!(lift_flag(Some("::n"), &mut gaps), Lift::Absent);
        assert_eq!(lift_flag(None, &mut gaps), Lift::Unknown);
        assert!(gaps.is_empty());
        assert_eq!(lift_flag(Some("maybe"), &mut gaps), Lift::Unknown);
        assert_eq!(gaps.count("lift"), 1);
    }

    #[test]
    fn rent_strings_lose_currency_suffixes_and_decimal_commas() {
        let mut gaps = GapCounter::default();
        assert_eq!(rent_amount(Some("650 zł"), &mut gaps), Some("650".to_string()));
        assert_eq!(rent_amount(Some("1 200,50 zł"), &mut gaps), Some("1200.50".to_string()));
        assert_eq!(rent_amount(Some("150 EUR"), &mut gaps), Some("150".to_string()));
        assert_eq!(rent_amount(None, &mut gaps), None);
        assert!(gaps.is_empty());
        assert_eq!(rent_amount(Some("do uzgodnienia"), &mut gaps), None);
        assert_eq!(gaps.count("rent"), 1);
    }
}
