use crate::harvest::harvester::{ObjectHarvester, ProjectTally};
use crate::model::{HarvestItem, Project};
use crate::traits::{HarvestError, ObjectStore};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{info, instrument};

/// Bounded worker pool running one harvest per project.
#[derive(Clone)]
pub struct HarvesterExecutor {
    semaphore: Arc<Semaphore>,
    concurrency_limit: usize,
}

impl HarvesterExecutor {
    pub fn new(concurrency_limit: usize) -> Self {
        let concurrency_limit = concurrency_limit.max(1);
        Self {
            semaphore: Arc::new(Semaphore::new(concurrency_limit)),
            concurrency_limit,
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Harvests every project, at most `concurrency_limit` at a time.
    ///
    /// `sink` is held until every project task has completed and is then
    /// dropped, which closes the channel once all sends are done. On the
    /// first failure the remaining tasks are aborted and the error returned.
    #[instrument(skip_all, fields(projects = projects.len(), limit = self.concurrency_limit))]
    pub async fn run_all<S>(
        &self,
        harvester: Arc<ObjectHarvester<S>>,
        projects: Vec<Project>,
        sink: mpsc::Sender<HarvestItem>,
    ) -> Result<ProjectTally, HarvestError>
    where
        S: ObjectStore + 'static,
    {
        let mut tasks = JoinSet::new();

        for project in projects {
            let semaphore = Arc::clone(&self.semaphore);
            let harvester = Arc::clone(&harvester);
            let sink = sink.clone();

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| HarvestError::Task(format!("Semaphore error: {}", e)))?;

                info!("Starting harvest for project: {}", project.project_id);
                let tally = harvester.harvest(&project, &sink).await?;
                info!(
                    buckets = tally.buckets,
                    objects = tally.objects,
                    "Finished harvest for project: {}",
                    project.project_id
                );
                Ok::<_, HarvestError>(tally)
            });
        }

        let mut total = ProjectTally::default();
        while let Some(joined) = tasks.join_next().await {
            // Returning early drops the JoinSet, which aborts the rest.
            let tally = joined.map_err(|e| HarvestError::Task(e.to_string()))??;
            total.add(tally);
        }

        // Every harvester is done; this is the last sender.
        drop(sink);
        Ok(total)
    }
}
