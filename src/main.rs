use anyhow::Result;
use clap::{Parser, Subcommand};

use estate_etl::config::Config;
use estate_etl::model::dims::Source;
use estate_etl::pipeline::EtlService;

#[derive(Parser)]
#[command(name = "estate-etl", about = "Housing offer ETL for the Estate Market DWH")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// The stages are exposed individually so an external scheduler can
/// sequence them and own retry/backoff; `run` chains them for manual use.
#[derive(Subcommand)]
enum Commands {
    /// Scrape and normalize the OLX batch
    ExtractOlx,
    /// Scrape and normalize the OtoDom batch
    ExtractOtodom,
    /// Join both batches and resolve surrogate keys
    Reconcile,
    /// Append the reconciled batch to the fact table
    Load,
    /// All stages in sequence
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = Config::from_env()?;
    let service = EtlService::new(cfg);

    match cli.command {
        Commands::ExtractOlx => service.extract(Source::Olx).await?,
        Commands::ExtractOtodom => service.extract(Source::Otodom).await?,
        Commands::Reconcile => service.reconcile().await?,
        Commands::Load => {
            service.load().await?;
        }
        Commands::Run => service.run().await?,
    }

    Ok(())
}
