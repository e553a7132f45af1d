use std::env;
use std::path::PathBuf;

use crate::model::dims::{City, Source};

const DEFAULT_OLX_BASE_URL: &str = "https://www.olx.pl/nieruchomosci/mieszkania/sprzedaz";
const DEFAULT_OTODOM_BASE_URL: &str = "https://www.otodom.pl";
const DEFAULT_DELAY_MS: u64 = 300;

pub struct Config {
    pub olx_base_url: String,
    pub otodom_base_url: String,
    /// Build id of the OtoDom `_next/data` endpoint; rotates with site deploys.
    pub otodom_key: String,
    pub cities: Vec<City>,
    pub delay_ms: u64,
    pub data_dir: PathBuf,
    pub database_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let cities = match env::var("CITIES") {
            Ok(list) => list
                .split(',')
                .map(|name| name.trim().parse::<City>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|name| anyhow::anyhow!("unknown city in CITIES: {name}"))?,
            Err(_) => City::ALL.to_vec(),
        };

        Ok(Self {
            olx_base_url: env::var("OLX_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OLX_BASE_URL.to_string()),
            otodom_base_url: env::var("OTODOM_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OTODOM_BASE_URL.to_string()),
            otodom_key: env::var("OTODOM_KEY")?,
            cities,
            delay_ms: env::var("DELAY_MS")
                .map(|v| v.parse())
                .unwrap_or(Ok(DEFAULT_DELAY_MS))?,
            data_dir: env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data")),
            database_url: env::var("DATABASE_URL")?,
        })
    }

    /// Interim file holding one source's normalized batch, overwritten each run.
    pub fn normalized_path(&self, source: Source) -> PathBuf {
        match source {
            Source::Olx => self.data_dir.join("olx_normalized.csv"),
            Source::Otodom => self.data_dir.join("otodom_normalized.csv"),
        }
    }

    /// Reconciled fact batch handed over to the load stage.
    pub fn fact_path(&self) -> PathBuf {
        self.data_dir.join("fact_offers.csv")
    }

    /// Static offer-characteristics dimension, read-only input.
    pub fn dim_path(&self) -> PathBuf {
        self.data_dir.join("dim_offer_characteristics.csv")
    }
}
