//! Reconciliation of the two normalized batches into fact rows.
//!
//! Concatenates both sources, removes exact-duplicate rows (full-row
//! equality, deliberately coarser than identity), collapses the unset
//! building-year sentinel to null, resolves surrogate keys and coerces
//! the numeric columns. Coercion is the one stage that drops rows: a
//! fact row cannot carry an unparseable price.

use std::collections::HashSet;

use tracing::warn;

use crate::error::EtlError;
use crate::model::dims::OfferCharacteristics;
use crate::model::{FactListing, NormalizedListing};

#[derive(Debug, Default, Clone, Copy)]
pub struct ReconcileReport {
    pub input: usize,
    pub duplicates_removed: usize,
    pub coercion_dropped: usize,
    pub dim_misses: usize,
    pub output: usize,
}

pub fn reconcile(
    a: Vec<NormalizedListing>,
    b: Vec<NormalizedListing>,
    dim: &OfferCharacteristics,
) -> (Vec<FactListing>, ReconcileReport) {
    let mut report = ReconcileReport {
        input: a.len() + b.len(),
        ..Default::default()
    };

    let mut seen: HashSet<NormalizedListing> = HashSet::new();
    let mut facts = Vec::new();

    for row in a.into_iter().chain(b) {
        if !seen.insert(row.clone()) {
            report.duplicates_removed += 1;
            continue;
        }

        match to_fact(&row, dim, &mut report) {
            Ok(fact) => facts.push(fact),
            Err(e) => {
                warn!(id = row.id, source = %row.source, error = %e, "row dropped during reconciliation");
                report.coercion_dropped += 1;
            }
        }
    }

    report.output = facts.len();
    (facts, report)
}

fn to_fact(
    row: &NormalizedListing,
    dim: &OfferCharacteristics,
    report: &mut ReconcileReport,
) -> Result<FactListing, EtlError> {
    // Anything below 1900, the unset sentinel included, is noise.
    let building_year = Some(row.building_year).filter(|&y| y >= 1900);

    let offer_characteristics_id = dim.resolve(row.car_garage, row.heating, row.lift, row.furniture);
    if offer_characteristics_id.is_none() {
        report.dim_misses += 1;
        warn!(
            id = row.id,
            source = %row.source,
            "characteristics tuple missing from the dimension, null foreign key"
        );
    }

    Ok(FactListing {
        dd_offer_id: row.id,
        source_id: row.source.surrogate_key(),
        snpt_date_id: row.snapshot_date,
        city_id: row.city.surrogate_key(),
        market_type_id: row.market_type.surrogate_key(),
        create_date_id: row.create_date,
        modify_date_id: row.modify_date,
        title: row.title.clone(),
        url: row.url.clone(),
        price: required_f64("price", &row.price)?,
        price_per_square_m: optional_f64("price_per_square_m", row.price_per_square_m.as_deref())?,
        area: optional_f64("area", row.area.as_deref())?,
        rooms_number: row.rooms_number,
        floor: row.floor,
        building_year,
        offer_characteristics_id,
        rent: optional_f64("rent", row.rent.as_deref())?,
    })
}

fn required_f64(field: &'static str, value: &str) -> Result<f64, EtlError> {
    value.trim().parse().map_err(|_| EtlError::Coercion {
        field,
        value: value.to_string(),
    })
}

fn optional_f64(field: &'static str, value: Option<&str>) -> Result<Option<f64>, EtlError> {
    match value {
        None => Ok(None),
        Some(v) if v.trim().is_empty() => Ok(None),
        Some(v) => required_f64(field, v).map(Some),
    }
}
