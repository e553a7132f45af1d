//! Static dimension vocabulary shared by both sources.
//!
//! Every categorical attribute of an offer is one of the enums below.
//! Surrogate keys mirror the warehouse dimension tables; `-1` is the
//! explicit "unknown" key, never a silent drop.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Source {
    #[serde(rename = "OLX")]
    Olx,
    #[serde(rename = "OtoDom")]
    Otodom,
}

impl Source {
    pub fn surrogate_key(self) -> i32 {
        match self {
            Source::Olx => 1,
            Source::Otodom => 2,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Olx => write!(f, "OLX"),
            Source::Otodom => write!(f, "OtoDom"),
        }
    }
}

/// Cities covered by the scrape. The diacritics-correct spelling is
/// canonical; ASCII aliases appear in OLX URLs and user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum City {
    #[serde(rename = "Katowice")]
    Katowice,
    #[serde(rename = "Kraków")]
    Krakow,
    #[serde(rename = "Warszawa")]
    Warszawa,
    #[serde(rename = "Wrocław")]
    Wroclaw,
}

impl City {
    pub const ALL: [City; 4] = [City::Katowice, City::Krakow, City::Warszawa, City::Wroclaw];

    pub fn surrogate_key(self) -> i32 {
        match self {
            City::Katowice => 1,
            City::Krakow => 2,
            City::Warszawa => 3,
            City::Wroclaw => 4,
        }
    }

    /// Canonical spelling, as stored in the city dimension.
    pub fn name(self) -> &'static str {
        match self {
            City::Katowice => "Katowice",
            City::Krakow => "Kraków",
            City::Warszawa => "Warszawa",
            City::Wroclaw => "Wrocław",
        }
    }

    /// ASCII path segment used by the OLX search URL.
    pub fn olx_slug(self) -> &'static str {
        match self {
            City::Katowice => "Katowice",
            City::Krakow => "Krakow",
            City::Warszawa => "Warszawa",
            City::Wroclaw => "Wroclaw",
        }
    }

    /// Voivodeship path used by the OtoDom search URL.
    pub fn otodom_path(self) -> &'static str {
        match self {
            City::Katowice => "/slaskie/katowice/katowice/katowice",
            City::Krakow => "/malopolskie/krakow/krakow/krakow",
            City::Warszawa => "/mazowieckie/warszawa/warszawa/warszawa",
            City::Wroclaw => "/dolnoslaskie/wroclaw/wroclaw/wroclaw",
        }
    }
}

impl fmt::Display for City {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for City {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Katowice" => Ok(City::Katowice),
            "Kraków" | "Krakow" => Ok(City::Krakow),
            "Warszawa" => Ok(City::Warszawa),
            "Wrocław" | "Wroclaw" => Ok(City::Wroclaw),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarketType {
    #[serde(rename = "PRIMARY")]
    Primary,
    #[serde(rename = "SECONDARY")]
    Secondary,
    #[serde(rename = "Unknown")]
    Unknown,
}

impl MarketType {
    pub fn surrogate_key(self) -> i32 {
        match self {
            MarketType::Primary => 1,
            MarketType::Secondary => 2,
            MarketType::Unknown => -1,
        }
    }
}

/// Tri-state furniture flag, keyed into the offer-characteristics dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Furniture {
    #[serde(rename = "furniture")]
    Present,
    #[serde(rename = "no_furniture")]
    Absent,
    #[serde(rename = "Unknown")]
    Unknown,
}

/// Tri-state garage flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CarGarage {
    #[serde(rename = "garage")]
    Present,
    #[serde(rename = "no_garage")]
    Absent,
    #[serde(rename = "Unknown")]
    Unknown,
}

/// Tri-state lift flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lift {
    #[serde(rename = "lift")]
    Present,
    #[serde(rename = "no_lift")]
    Absent,
    #[serde(rename = "Unknown")]
    Unknown,
}

/// Heating system, from the OtoDom `heating::<code>` vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heating {
    #[serde(rename = "urban")]
    Urban,
    #[serde(rename = "gas")]
    Gas,
    #[serde(rename = "electrical")]
    Electrical,
    #[serde(rename = "boiler_room")]
    BoilerRoom,
    #[serde(rename = "tiled_stove")]
    TiledStove,
    #[serde(rename = "other")]
    Other,
    #[serde(rename = "Unknown")]
    Unknown,
}

/// One row of `dim_offer_characteristics.csv`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferCharacteristicsRow {
    pub id: i32,
    pub car_garage: CarGarage,
    pub heating: Heating,
    pub lift: Lift,
    pub furniture: Furniture,
}

/// Static dimension resolving a characteristics tuple to its surrogate id.
pub struct OfferCharacteristics {
    by_tuple: HashMap<(CarGarage, Heating, Lift, Furniture), i32>,
}

impl OfferCharacteristics {
    pub fn from_rows(rows: impl IntoIterator<Item = OfferCharacteristicsRow>) -> Self {
        let by_tuple = rows
            .into_iter()
            .map(|r| ((r.car_garage, r.heating, r.lift, r.furniture), r.id))
            .collect();
        Self { by_tuple }
    }

    /// Exact-tuple lookup; a miss is a reconciliation gap, not an error.
    pub fn resolve(
        &self,
        car_garage: CarGarage,
        heating: Heating,
        lift: Lift,
        furniture: Furniture,
    ) -> Option<i32> {
        self.by_tuple
            .get(&(car_garage, heating, lift, furniture))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.by_tuple.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tuple.is_empty()
    }
}
