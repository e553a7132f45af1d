//! Error taxonomy for the pipeline.
//!
//! Per-listing errors (`Fetch`, `Parse`, `Schema`) are caught at the
//! extractor boundary and skip only the offending listing. `Coercion`
//! drops a single row during reconciliation. Sink errors (`Connection`,
//! `Write`) propagate to the caller and fail the run.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("http request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("payload not found or malformed at {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("expected field `{field}` missing at {url}")]
    Schema { url: String, field: &'static str },

    #[error("cannot coerce `{field}` value `{value}` to a number")]
    Coercion { field: &'static str, value: String },

    #[error("warehouse connection failed: {0}")]
    Connection(#[source] sqlx::Error),

    #[error("warehouse write failed: {0}")]
    Write(#[source] sqlx::Error),

    #[error("interim storage: {0}")]
    Io(#[from] std::io::Error),

    #[error("interim batch file: {0}")]
    Csv(#[from] csv::Error),
}

impl EtlError {
    pub fn parse(url: &str, reason: impl Into<String>) -> Self {
        Self::Parse {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    pub fn schema(url: &str, field: &'static str) -> Self {
        Self::Schema {
            url: url.to_string(),
            field,
        }
    }
}
