//! Interim batch files between the pipeline stages.
//!
//! Normalized batches are written one file per source and overwritten
//! each run; the reconciled fact batch is the hand-off to the load
//! stage. The offer-characteristics dimension is a read-only input
//! maintained outside the pipeline.

use std::fs;
use std::path::Path;

use tracing::warn;

use crate::error::EtlError;
use crate::model::dims::{OfferCharacteristics, OfferCharacteristicsRow};
use crate::model::{FactListing, NormalizedListing};

pub fn write_normalized(path: &Path, rows: &[NormalizedListing]) -> Result<(), EtlError> {
    write_batch(path, rows)
}

pub fn read_normalized(path: &Path) -> Result<Vec<NormalizedListing>, EtlError> {
    read_batch(path)
}

pub fn write_facts(path: &Path, rows: &[FactListing]) -> Result<(), EtlError> {
    write_batch(path, rows)
}

pub fn read_facts(path: &Path) -> Result<Vec<FactListing>, EtlError> {
    read_batch(path)
}

/// Loads the static dimension. Rows that do not deserialize against the
/// known vocabulary are skipped with a warning instead of failing the
/// run; the dimension file is maintained by hand.
pub fn read_offer_characteristics(path: &Path) -> Result<OfferCharacteristics, EtlError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<OfferCharacteristicsRow>() {
        match record {
            Ok(row) => rows.push(row),
            Err(e) => warn!(error = %e, "dimension row skipped"),
        }
    }
    Ok(OfferCharacteristics::from_rows(rows))
}

fn write_batch<T: serde::Serialize>(path: &Path, rows: &[T]) -> Result<(), EtlError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn read_batch<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Vec<T>, EtlError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut rows = Vec::new();
    for record in reader.deserialize::<T>() {
        rows.push(record?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::dims::*;
    use crate::model::UNSET_BUILDING_YEAR;

    fn listing() -> NormalizedListing {
        NormalizedListing {
            id: 901234,
            source: Source::Olx,
            snapshot_date: 20240814,
            city: City::Wroclaw,
            market_type: MarketType::Unknown,
            create_date: Some(20240801),
            modify_date: None,
            title: "Kawalerka przy rynku".into(),
            url: "https://www.olx.pl/d/oferta/kawalerka-ID901234.html".into(),
            price: "385000".into(),
            price_per_square_m: None,
            area: Some("28.5".into()),
            rooms_number: Some(1),
            floor: None,
            building_year: UNSET_BUILDING_YEAR,
            furniture: Furniture::Unknown,
            car_garage: CarGarage::Unknown,
            heating: Heating::Unknown,
            lift: Lift::Unknown,
            rent: None,
        }
    }

    #[test]
    fn normalized_batches_survive_the_interim_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("olx_normalized.csv");

        let rows = vec![listing()];
        write_normalized(&path, &rows).unwrap();
        let back = read_normalized(&path).unwrap();
        assert_eq!(back, rows);

        // a later run overwrites, never appends
        write_normalized(&path, &[]).unwrap();
        assert!(read_normalized(&path).unwrap().is_empty());
    }

    #[test]
    fn dimension_file_is_read_with_lenient_row_handling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dim_offer_characteristics.csv");
        fs::write(
            &path,
            "id,car_garage,heating,lift,furniture\n\
             1,garage,urban,lift,furniture\n\
             2,not_a_known_value,urban,lift,furniture\n\
             3,no_garage,Unknown,Unknown,Unknown\n",
        )
        .unwrap();

        let dim = read_offer_characteristics(&path).unwrap();
        assert_eq!(dim.len(), 2);
        assert_eq!(
            dim.resolve(
                CarGarage::Present,
                Heating::Urban,
                Lift::Present,
                Furniture::Present
            ),
            Some(1)
        );
        assert_eq!(
            dim.resolve(
                CarGarage::Absent,
                Heating::Unknown,
                Lift::Unknown,
                Furniture::Unknown
            ),
            Some(3)
        );
    }
}
