use anyhow::{Context, Result};
use apache_avro::Schema;
use gcs_harvester::config::HarvestConfig;
use gcs_harvester::harvest::{load_schema, AvroFileSink, HarvestPipeline};
use gcs_harvester::{GcsClient, SetupError};
use std::sync::OnceLock;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Output schema, shared with the sink task for the whole run.
static SCHEMA: OnceLock<Schema> = OnceLock::new();

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = HarvestConfig::from_env_and_args()?;

    // --- Logging setup ---
    let default_level = if cfg.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Google Cloud Storage object metadata to BigQuery, version {}",
        env!("CARGO_PKG_VERSION")
    );

    let token = cfg
        .access_token
        .clone()
        .ok_or(SetupError::MissingCredentials)?;
    let client = GcsClient::new(token)?;

    let schema = load_schema(cfg.schema_path.as_deref())?;
    let schema = SCHEMA.get_or_init(|| schema);
    let sink = AvroFileSink::create(&cfg.output_path, schema)?;

    let stats = HarvestPipeline::new(client.clone(), client)
        .with_versions(cfg.include_versions)
        .with_concurrency(cfg.concurrency)
        .with_channel_capacity(cfg.channel_capacity)
        .execute(sink)
        .await
        .with_context(|| format!("harvest into {} failed", cfg.output_path.display()))?;

    info!(
        records = stats.records_written,
        path = %cfg.output_path.display(),
        "Export written"
    );
    Ok(())
}
