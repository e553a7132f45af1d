//! Stage orchestration.
//!
//! `EtlService` exposes the four scheduler-facing stages: extract (per
//! source), reconcile and load. The external scheduler owns retries and
//! alerting; stages here run once and report their counts so data loss
//! stays observable.

use chrono::Local;
use reqwest::Client;
use tokio::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::extract::{
    self, fetcher, olx::OlxExtractor, otodom::OtodomExtractor, SiteExtractor,
};
use crate::model::dims::Source;
use crate::reconcile;
use crate::storage::{interim, warehouse::Warehouse};
use crate::transform;

pub struct EtlService {
    cfg: Config,
    client: Client,
}

impl EtlService {
    pub fn new(cfg: Config) -> Self {
        let client = fetcher::build_client();
        Self { cfg, client }
    }

    /// Discovers, fetches and normalizes one source's batch, then
    /// overwrites that source's interim file.
    pub async fn extract(&self, source: Source) -> anyhow::Result<()> {
        match source {
            Source::Olx => {
                let extractor = OlxExtractor::new(&self.cfg.olx_base_url);
                self.extract_with(&extractor).await
            }
            Source::Otodom => {
                let extractor =
                    OtodomExtractor::new(&self.cfg.otodom_base_url, &self.cfg.otodom_key);
                self.extract_with(&extractor).await
            }
        }
    }

    async fn extract_with<E: SiteExtractor>(&self, extractor: &E) -> anyhow::Result<()> {
        let source = extractor.source();
        let snapshot_date = Local::now().date_naive();
        let delay = Duration::from_millis(self.cfg.delay_ms);

        let urls =
            extract::discover_urls(extractor, &self.client, &self.cfg.cities, delay).await;

        let (raw, report) =
            extract::extract_listings(extractor, &self.client, &urls, snapshot_date, delay)
                .await;

        let (normalized, gaps) = transform::normalize(&raw, source);

        let path = self.cfg.normalized_path(source);
        interim::write_normalized(&path, &normalized)?;

        info!(
            source = %source,
            discovered = report.discovered,
            extracted = report.extracted,
            skipped = report.skipped,
            mapping_gaps = %gaps,
            rows = normalized.len(),
            path = %path.display(),
            "extract stage finished"
        );
        Ok(())
    }

    /// Joins both interim batches against the static dimensions and
    /// writes the fact batch.
    pub async fn reconcile(&self) -> anyhow::Result<()> {
        let olx = interim::read_normalized(&self.cfg.normalized_path(Source::Olx))?;
        let otodom = interim::read_normalized(&self.cfg.normalized_path(Source::Otodom))?;
        let dim = interim::read_offer_characteristics(&self.cfg.dim_path())?;

        let (facts, report) = reconcile::reconcile(olx, otodom, &dim);
        interim::write_facts(&self.cfg.fact_path(), &facts)?;

        info!(
            input = report.input,
            duplicates_removed = report.duplicates_removed,
            rows_dropped = report.coercion_dropped,
            dim_misses = report.dim_misses,
            output = report.output,
            "reconcile stage finished"
        );
        Ok(())
    }

    /// Appends the fact batch to the warehouse. Sink failures propagate:
    /// the run fails visibly rather than silently losing a batch.
    pub async fn load(&self) -> anyhow::Result<usize> {
        let facts = interim::read_facts(&self.cfg.fact_path())?;

        let warehouse = Warehouse::connect(&self.cfg.database_url).await?;
        let loaded = warehouse.append_facts(&facts).await?;

        info!(loaded, "load stage finished");
        Ok(loaded)
    }

    /// All stages in sequence: both sources, join, load.
    pub async fn run(&self) -> anyhow::Result<()> {
        self.extract(Source::Olx).await?;
        self.extract(Source::Otodom).await?;
        self.reconcile().await?;
        let loaded = self.load().await?;

        info!(loaded, "pipeline run complete");
        Ok(())
    }
}
