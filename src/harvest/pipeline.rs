//! Top-level harvest run coordinator.
//!
//! This module provides the [`HarvestPipeline`] that wires the stages of a
//! run together:
//! - Project enumeration, fully materialized before any harvesting
//! - Fan-out of one harvest per project through [`HarvesterExecutor`]
//! - Fan-in through a bounded channel into a single [`SinkWriter`] task
//! - Structured logging via `tracing`
//!
//! Any error aborts the whole run.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};

use crate::executor::HarvesterExecutor;
use crate::harvest::enumerator::ProjectEnumerator;
use crate::harvest::harvester::ObjectHarvester;
use crate::harvest::sink::SinkWriter;
use crate::harvest::traits::RecordSink;
use crate::traits::{HarvestError, ObjectStore, ProjectDirectory};

// ============================================================================
// Pipeline Types
// ============================================================================

/// Statistics about a completed run.
#[derive(Debug, Default, Clone)]
pub struct HarvestStats {
    /// Number of projects enumerated
    pub projects: usize,

    /// Number of buckets listed across all projects
    pub buckets: usize,

    /// Number of objects sent to the sink
    pub objects: usize,

    /// Number of records the sink wrote
    pub records_written: usize,

    /// Time spent enumerating projects (milliseconds)
    pub enumeration_duration_ms: u64,

    /// Total time spent on the run (milliseconds)
    pub total_duration_ms: u64,
}

// ============================================================================
// Pipeline Executor
// ============================================================================

/// Harvest run over a project directory and an object store.
///
/// # Example
///
/// ```ignore
/// let pipeline = HarvestPipeline::new(client.clone(), client)
///     .with_versions(true)
///     .with_concurrency(16);
///
/// static SCHEMA: OnceLock<Schema> = OnceLock::new();
/// let schema = SCHEMA.get_or_init(|| load_schema(None).unwrap());
/// let sink = AvroFileSink::create(Path::new("gcs.avro"), schema)?;
/// let stats = pipeline.execute(sink).await?;
/// println!("Exported {} objects", stats.records_written);
/// ```
pub struct HarvestPipeline<D, S> {
    directory: D,
    store: Arc<S>,
    executor: HarvesterExecutor,

    /// Whether object listings include non-current versions
    include_versions: bool,

    /// Capacity of the harvester → sink channel (default: 1)
    channel_capacity: usize,
}

impl<D, S> HarvestPipeline<D, S>
where
    D: ProjectDirectory,
    S: ObjectStore + 'static,
{
    /// Creates a pipeline with default configuration:
    /// - Live objects only
    /// - 8 concurrent project harvests
    /// - Channel capacity 1
    pub fn new(directory: D, store: S) -> Self {
        Self {
            directory,
            store: Arc::new(store),
            executor: HarvesterExecutor::new(8),
            include_versions: false,
            channel_capacity: 1,
        }
    }

    pub fn with_versions(mut self, include_versions: bool) -> Self {
        self.include_versions = include_versions;
        self
    }

    /// Caps the number of projects harvested at the same time.
    pub fn with_concurrency(mut self, limit: usize) -> Self {
        self.executor = HarvesterExecutor::new(limit);
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Runs the whole harvest into `sink`.
    ///
    /// Ordering of a successful run: every harvester finishes sending, the
    /// channel closes, the sink drains what is left and finalizes.
    ///
    /// # Errors
    ///
    /// Returns the first [`HarvestError`] of any stage. Remaining tasks are
    /// aborted and the sink is not finalized.
    #[instrument(skip_all, fields(versions = self.include_versions))]
    pub async fn execute<W: RecordSink>(&self, sink: W) -> Result<HarvestStats, HarvestError> {
        let start = Instant::now();
        let mut stats = HarvestStats::default();

        // ====================================================================
        // Stage 1: Enumeration
        // ====================================================================

        let projects = ProjectEnumerator::new(&self.directory)
            .list_all_projects()
            .await?;
        stats.projects = projects.len();
        stats.enumeration_duration_ms = start.elapsed().as_millis() as u64;

        // ====================================================================
        // Stage 2: Fan-out / fan-in
        // ====================================================================

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let mut sink_task = tokio::spawn(SinkWriter::new(sink).run(rx));

        let executor = self.executor.clone();
        let harvester = Arc::new(ObjectHarvester::new(
            Arc::clone(&self.store),
            self.include_versions,
        ));
        let mut harvest_task =
            tokio::spawn(async move { executor.run_all(harvester, projects, tx).await });

        let outcome = tokio::try_join!(join_task(&mut harvest_task), join_task(&mut sink_task));
        let (tally, records_written) = match outcome {
            Ok(done) => done,
            Err(err) => {
                harvest_task.abort();
                let err = match err {
                    // The sink went away first; its own error is the cause.
                    HarvestError::ChannelClosed(_) => match join_task(&mut sink_task).await {
                        Err(sink_err) => sink_err,
                        Ok(_) => err,
                    },
                    other => other,
                };
                sink_task.abort();
                error!(error = %err, "Harvest aborted");
                return Err(err);
            }
        };

        stats.buckets = tally.buckets;
        stats.objects = tally.objects;
        stats.records_written = records_written;
        stats.total_duration_ms = start.elapsed().as_millis() as u64;

        info!(
            projects = stats.projects,
            buckets = stats.buckets,
            objects = stats.objects,
            records = stats.records_written,
            duration_ms = stats.total_duration_ms,
            "Processing complete"
        );

        Ok(stats)
    }
}

async fn join_task<T>(handle: &mut JoinHandle<Result<T, HarvestError>>) -> Result<T, HarvestError> {
    handle
        .await
        .map_err(|e| HarvestError::Task(e.to_string()))?
}

// ============================================================================
// Tests
// ============================================================================
