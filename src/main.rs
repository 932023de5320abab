//! celeba_prep - fetch and prepare every CelebA split
//!
//! Prepares train, valid, test and all under the working directory, in that
//! order, downloading whatever is missing. The first failure ends the run.
//!
//! Environment (all optional):
//!   CELEBA_ROOT, CELEBA_DRIVE_URL, CELEBA_MAX_RETRIES,
//!   CELEBA_CONNECT_TIMEOUT_SECS, CELEBA_CHUNK_TIMEOUT_SECS, CELEBA_PROGRESS
//!   RUST_LOG - Log level (default: info)

use celeba_prep::utils::constants::{APP_NAME, APP_VERSION};
use celeba_prep::{prepare_all, CelebaProvisioner, PrepReport, ProvisionConfig};

use eyre::Result;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("🧬 {} v{}", APP_NAME, APP_VERSION);

    let config = ProvisionConfig::from_env()?;
    let provisioner = CelebaProvisioner::new(&config)?;

    let datasets = prepare_all(&provisioner, &config.root, true).await?;

    let report = PrepReport::from_datasets(&config.root, &datasets);
    for line in report.summary().lines() {
        info!("📊 {}", line);
    }
    let path = report.export_json(&CelebaProvisioner::base_dir(&config.root))?;
    info!("✅ All splits prepared, report written to {}", path.display());

    Ok(())
}
