//! In-memory collaborators for tests.
//!
//! [`FakeCloud`] serves projects, buckets and objects from memory with
//! configurable page size, scheduling jitter and failure injection.
//! [`MemorySink`] collects records instead of writing a file.

use async_trait::async_trait;
use rand::Rng;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use crate::harvest::sink::load_schema;
use crate::harvest::traits::RecordSink;
use crate::model::{Bucket, ObjectAttrs, ObjectQuery, OutputRecord, Page, Project};
use crate::traits::{EnumerationError, ObjectStore, ProjectDirectory, WriteError};

#[derive(Default)]
pub struct FakeCloud {
    projects: Vec<Project>,
    buckets: HashMap<String, Vec<Bucket>>,
    // bucket name -> (object, is_live)
    objects: HashMap<String, Vec<(ObjectAttrs, bool)>>,
    page_size: usize,
    max_jitter_yields: usize,
    fail_projects: bool,
    fail_buckets: HashSet<String>,
    fail_objects: HashSet<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self {
            page_size: 2,
            ..Default::default()
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Each listing call yields to the scheduler a random number of times,
    /// up to `max_yields`, to shuffle task interleavings.
    pub fn with_jitter(mut self, max_yields: usize) -> Self {
        self.max_jitter_yields = max_yields;
        self
    }

    pub fn with_project(mut self, project_id: &str) -> Self {
        self.projects.push(Project::new(project_id));
        self.buckets.entry(project_id.to_string()).or_default();
        self
    }

    pub fn with_bucket(mut self, project_id: &str, bucket: &str) -> Self {
        self.buckets
            .entry(project_id.to_string())
            .or_default()
            .push(Bucket::new(bucket));
        self.objects.entry(bucket.to_string()).or_default();
        self
    }

    /// Adds a live object to the bucket named by `object.bucket`.
    pub fn with_object(mut self, object: ObjectAttrs) -> Self {
        self.objects
            .entry(object.bucket.clone())
            .or_default()
            .push((object, true));
        self
    }

    /// Adds a non-current version, only listed when versions are requested.
    pub fn with_noncurrent_object(mut self, object: ObjectAttrs) -> Self {
        self.objects
            .entry(object.bucket.clone())
            .or_default()
            .push((object, false));
        self
    }

    pub fn fail_projects(mut self) -> Self {
        self.fail_projects = true;
        self
    }

    pub fn fail_buckets(mut self, project_id: &str) -> Self {
        self.fail_buckets.insert(project_id.to_string());
        self
    }

    pub fn fail_objects(mut self, bucket: &str) -> Self {
        self.fail_objects.insert(bucket.to_string());
        self
    }

    /// Highest number of listing calls observed running at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> InFlight<'_> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let yields = if self.max_jitter_yields == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.max_jitter_yields)
        };
        for _ in 0..yields {
            tokio::task::yield_now().await;
        }
        InFlight(&self.in_flight)
    }

    fn paginate<T: Clone>(
        &self,
        items: &[T],
        page_token: Option<&str>,
    ) -> Result<Page<T>, EnumerationError> {
        let offset = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| EnumerationError::Parse(format!("bad page token {token:?}")))?,
            None => 0,
        };
        let end = (offset + self.page_size).min(items.len());
        let page = items.get(offset..end).unwrap_or_default().to_vec();
        let next = if end < items.len() {
            Some(end.to_string())
        } else {
            // The real APIs end pagination with an empty token as often as a missing one.
            Some(String::new())
        };
        Ok(Page::new(page, next))
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProjectDirectory for FakeCloud {
    async fn list_projects(
        &self,
        page_token: Option<&str>,
    ) -> Result<Page<Project>, EnumerationError> {
        let _guard = self.enter().await;
        if self.fail_projects {
            return Err(EnumerationError::Api {
                status: 403,
                message: "permission denied".to_string(),
            });
        }
        self.paginate(&self.projects, page_token)
    }
}

#[async_trait]
impl ObjectStore for FakeCloud {
    async fn list_buckets(
        &self,
        project_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<Bucket>, EnumerationError> {
        let _guard = self.enter().await;
        if self.fail_buckets.contains(project_id) {
            return Err(EnumerationError::Other(format!(
                "bucket listing failed for {project_id}"
            )));
        }
        let buckets = self.buckets.get(project_id).cloned().unwrap_or_default();
        self.paginate(&buckets, page_token)
    }

    async fn list_objects(
        &self,
        bucket: &str,
        query: ObjectQuery,
        page_token: Option<&str>,
    ) -> Result<Page<ObjectAttrs>, EnumerationError> {
        let _guard = self.enter().await;
        if self.fail_objects.contains(bucket) {
            return Err(EnumerationError::Other(format!(
                "object listing failed for {bucket}"
            )));
        }
        let objects: Vec<ObjectAttrs> = self
            .objects
            .get(bucket)
            .map(|all| {
                all.iter()
                    .filter(|(_, live)| *live || query.versions)
                    .map(|(o, _)| o.clone())
                    .collect()
            })
            .unwrap_or_default();
        self.paginate(&objects, page_token)
    }
}

/// Sink that keeps records in memory. Clones share the same storage.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<OutputRecord>>>,
    finished: Arc<AtomicUsize>,
    fail_after: Option<usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every append after `n` successful ones.
    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Default::default()
        }
    }

    pub fn records(&self) -> Vec<OutputRecord> {
        self.records.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn finish_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &OutputRecord) -> Result<(), WriteError> {
        let mut records = self
            .records
            .lock()
            .map_err(|e| WriteError::Serialize(e.to_string()))?;
        if self.fail_after.is_some_and(|n| records.len() >= n) {
            return Err(WriteError::Io(std::io::Error::other("disk full")));
        }
        records.push(record.clone());
        Ok(())
    }

    fn finish(self) -> Result<(), WriteError> {
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Bundled schema parsed once per test binary.
pub fn bundled_schema() -> &'static apache_avro::Schema {
    static SCHEMA: OnceLock<apache_avro::Schema> = OnceLock::new();
    SCHEMA.get_or_init(|| load_schema(None).unwrap())
}
