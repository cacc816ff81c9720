use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::PathBuf;

/// Run configuration, built once and passed into the pipeline.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    pub output_path: PathBuf,
    pub include_versions: bool,
    pub concurrency: usize,
    pub channel_capacity: usize,
    pub schema_path: Option<PathBuf>,
    pub access_token: Option<String>,
    pub verbose: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Google Cloud Storage object metadata to BigQuery (Avro export)"
)]
pub struct Args {
    /// Output file name
    #[arg(long, default_value = "gcs.avro")]
    pub file: PathBuf,

    /// Include non-current GCS object versions
    #[arg(long)]
    pub versions: bool,

    /// Projects harvested in parallel (overrides GCS_HARVESTER_CONCURRENCY)
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Objects buffered between listing and the writer
    #[arg(long, default_value_t = 1)]
    pub channel_capacity: usize,

    /// Avro schema file; the bundled gcs2bq.avsc is used when omitted
    #[arg(long)]
    pub schema: Option<PathBuf>,

    /// OAuth 2.0 access token (overrides GOOGLE_OAUTH_ACCESS_TOKEN)
    #[arg(long)]
    pub access_token: Option<String>,

    /// Show debug output
    #[arg(short, long)]
    pub verbose: bool,
}

impl HarvestConfig {
    /// Parse CLI args with environment fallback.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    pub fn from_args(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_concurrency = match env::var("GCS_HARVESTER_CONCURRENCY") {
            Ok(value) => value
                .parse::<usize>()
                .with_context(|| format!("parsing GCS_HARVESTER_CONCURRENCY value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8,
            Err(err) => return Err(err).context("reading GCS_HARVESTER_CONCURRENCY"),
        };
        let env_token = env::var("GOOGLE_OAUTH_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());

        // --- Merge ---
        let cfg = Self {
            output_path: args.file,
            include_versions: args.versions,
            concurrency: args.concurrency.unwrap_or(env_concurrency),
            channel_capacity: args.channel_capacity,
            schema_path: args.schema,
            access_token: args.access_token.or(env_token),
            verbose: args.verbose,
        };

        if cfg.concurrency == 0 {
            anyhow::bail!("concurrency must be at least 1");
        }
        if cfg.channel_capacity == 0 {
            anyhow::bail!("channel capacity must be at least 1");
        }

        Ok(cfg)
    }
}
