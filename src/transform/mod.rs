//! Field normalization.
//!
//! Pure, per-source mapping of raw attribute vocabularies onto the
//! shared schema. A mapping miss never raises; the target attribute
//! falls back to its `Unknown` sentinel (or `None`) and the miss is
//! counted for observability.

pub mod olx;
pub mod otodom;

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use tracing::debug;

use crate::model::dims::{MarketType, Source};
use crate::model::{date_key, NormalizedListing, RawListing};

pub trait Normalizer {
    fn source(&self) -> Source;

    fn normalize_one(&self, raw: &RawListing, gaps: &mut GapCounter) -> NormalizedListing;
}

/// Maps a raw batch onto the shared schema using the source's strategy.
pub fn normalize(batch: &[RawListing], source: Source) -> (Vec<NormalizedListing>, GapCounter) {
    let normalizer: &dyn Normalizer = match source {
        Source::Olx => &olx::OlxNormalizer,
        Source::Otodom => &otodom::OtodomNormalizer,
    };

    let mut gaps = GapCounter::default();
    let rows = batch
        .iter()
        .map(|raw| normalizer.normalize_one(raw, &mut gaps))
        .collect();
    (rows, gaps)
}

/// Per-field counts of values the mapping tables did not recognize.
#[derive(Debug, Default)]
pub struct GapCounter {
    counts: BTreeMap<&'static str, usize>,
}

impl GapCounter {
    pub fn record(&mut self, field: &'static str, value: &str) {
        debug!(field, value, "unmapped source value");
        *self.counts.entry(field).or_default() += 1;
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count(&self, field: &str) -> usize {
        self.counts.get(field).copied().unwrap_or(0)
    }
}

impl fmt::Display for GapCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.counts.is_empty() {
            return f.write_str("none");
        }
        let mut first = true;
        for (field, count) in &self.counts {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{field}={count}")?;
            first = false;
        }
        Ok(())
    }
}

/// `2024-08-01T09:15:00+02:00` -> `20240801`. The time part is dropped
/// before parsing; both sources emit ISO timestamps.
pub(crate) fn iso_date_key(
    value: Option<&str>,
    field: &'static str,
    gaps: &mut GapCounter,
) -> Option<i32> {
    let raw = value?;
    let day = raw.split('T').next().unwrap_or(raw);
    match NaiveDate::parse_from_str(day, "%Y-%m-%d") {
        Ok(d) => Some(date_key(d)),
        Err(_) => {
            gaps.record(field, raw);
            None
        }
    }
}

pub(crate) fn market_type(value: Option<&str>, gaps: &mut GapCounter) -> MarketType {
    match value {
        None => MarketType::Unknown,
        Some(v) if v.eq_ignore_ascii_case("primary") => MarketType::Primary,
        Some(v) if v.eq_ignore_ascii_case("secondary") => MarketType::Secondary,
        Some(v) => {
            gaps.record("market_type", v);
            MarketType::Unknown
        }
    }
}
