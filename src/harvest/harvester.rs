//! Per-project bucket and object listing.

use tokio::sync::mpsc;
use tracing::{debug, instrument};

use crate::model::{Bucket, HarvestItem, ObjectQuery, Project};
use crate::traits::{HarvestError, ObjectStore};

/// Counts of what one project harvest observed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProjectTally {
    pub buckets: usize,
    pub objects: usize,
}

impl ProjectTally {
    pub fn add(&mut self, other: ProjectTally) {
        self.buckets += other.buckets;
        self.objects += other.objects;
    }
}

/// Lists every object of a project and forwards it to the sink channel.
///
/// One harvester is shared by all project tasks of a run; it carries only
/// the store handle and the run-wide listing options.
pub struct ObjectHarvester<S> {
    store: S,
    query: ObjectQuery,
}

impl<S: ObjectStore> ObjectHarvester<S> {
    pub fn new(store: S, include_versions: bool) -> Self {
        Self {
            store,
            query: ObjectQuery {
                versions: include_versions,
            },
        }
    }

    /// Harvests every bucket of `project`.
    ///
    /// Each send waits for channel capacity, so a slow sink throttles
    /// listing.
    ///
    /// # Errors
    ///
    /// Returns on the first failed bucket or object page, or if the sink
    /// channel has been closed.
    #[instrument(skip(self, sink), fields(project = %project.project_id))]
    pub async fn harvest(
        &self,
        project: &Project,
        sink: &mpsc::Sender<HarvestItem>,
    ) -> Result<ProjectTally, HarvestError> {
        let mut tally = ProjectTally::default();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .store
                .list_buckets(&project.project_id, page_token.as_deref())
                .await
                .map_err(|source| HarvestError::BucketListing {
                    project: project.project_id.clone(),
                    source,
                })?;
            let next = page.continuation().map(str::to_string);

            for bucket in &page.items {
                tally.buckets += 1;
                tally.objects += self.harvest_bucket(project, bucket, sink).await?;
            }

            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        debug!(
            buckets = tally.buckets,
            objects = tally.objects,
            "Project harvest finished"
        );
        Ok(tally)
    }

    async fn harvest_bucket(
        &self,
        project: &Project,
        bucket: &Bucket,
        sink: &mpsc::Sender<HarvestItem>,
    ) -> Result<usize, HarvestError> {
        let mut sent = 0usize;
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .store
                .list_objects(&bucket.name, self.query, page_token.as_deref())
                .await
                .map_err(|source| HarvestError::ObjectListing {
                    bucket: bucket.name.clone(),
                    source,
                })?;
            let next = page.continuation().map(str::to_string);

            for object in page.items {
                debug!(
                    "Processing file {} (bucket {}, project {})...",
                    object.name, bucket.name, project.project_id
                );
                let item = HarvestItem {
                    project_id: project.project_id.clone(),
                    bucket_name: bucket.name.clone(),
                    object,
                };
                sink.send(item)
                    .await
                    .map_err(|_| HarvestError::ChannelClosed(project.project_id.clone()))?;
                sent += 1;
            }

            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(sent)
    }
}
