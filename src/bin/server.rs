use clap::Parser;
use ns4kafka::akhq::AkhqClaimProvider;
use ns4kafka::api::ClaimApi;
use ns4kafka::metrics::ClaimMetrics;
use ns4kafka::provider::{InMemoryResourceStore, ResourceCatalog};
use ns4kafka::{Config, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "ns4kafka-server")]
#[command(about = "Ns4Kafka AKHQ claim provider")]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(short, long, default_value = "config/ns4kafka.toml")]
    pub config: String,

    /// Port to listen on, overrides server.port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Namespace and ACE catalog, overrides seed_path
    #[arg(long)]
    pub seed: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    info!("Loading configuration from: {}", cli.config);

    let mut config = match Config::from_file(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(port) = cli.port {
        config.server.port = port;
    }
    if let Some(seed) = cli.seed {
        config.seed_path = Some(seed);
    }
    config.validate()?;

    info!("Managed clusters: {:?}", config.managed_cluster_names());

    let store = match &config.seed_path {
        Some(path) => {
            info!("Loading resource catalog from: {}", path.display());
            InMemoryResourceStore::from_catalog(ResourceCatalog::from_file(path)?)
        }
        None => {
            warn!("No seed_path configured, starting with an empty resource store");
            InMemoryResourceStore::new()
        }
    };
    let store = Arc::new(store);

    let metrics = ClaimMetrics::new()?;
    let claim_provider = AkhqClaimProvider::new(
        config.akhq.clone(),
        config.managed_cluster_names(),
        store.clone(),
        store,
    )
    .with_metrics(metrics.clone());

    let api = ClaimApi::new(Arc::new(claim_provider), metrics, config.server.clone());
    api.start().await?;

    Ok(())
}
