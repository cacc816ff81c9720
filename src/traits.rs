use crate::model::{Bucket, ObjectAttrs, ObjectQuery, Page, Project};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Failures of the paginated listing collaborators.
#[derive(Error, Debug)]
pub enum EnumerationError {
    #[error("API request failed (status {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(String),
    #[error("Failed to parse API response: {0}")]
    Parse(String),
    #[error("Listing failed: {0}")]
    Other(String),
}

/// Failures while preparing a run, before any record is written.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("No access token provided (use --access-token or GOOGLE_OAUTH_ACCESS_TOKEN)")]
    MissingCredentials,
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
    #[error("Failed to load schema from {path}: {source}")]
    SchemaRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid Avro schema: {0}")]
    SchemaParse(String),
    #[error("Failed to create output file {path}: {source}")]
    OutputFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to open container writer: {0}")]
    Container(String),
}

/// Failures while serializing or persisting records.
#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to serialize record: {0}")]
    Serialize(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error for a harvest run. Every variant aborts the run.
#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Failed to list projects: {0}")]
    ProjectListing(#[source] EnumerationError),
    #[error("Failed to list buckets of project {project}: {source}")]
    BucketListing {
        project: String,
        source: EnumerationError,
    },
    #[error("Failed to list objects in bucket {bucket}: {source}")]
    ObjectListing {
        bucket: String,
        source: EnumerationError,
    },
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Write(#[from] WriteError),
    #[error("Sink channel closed while project {0} was still harvesting")]
    ChannelClosed(String),
    #[error("Task failed: {0}")]
    Task(String),
}

/// Paginated directory of the projects visible to the caller.
#[async_trait]
pub trait ProjectDirectory: Send + Sync {
    /// Fetches one page of projects. `None` requests the first page.
    async fn list_projects(
        &self,
        page_token: Option<&str>,
    ) -> Result<Page<Project>, EnumerationError>;
}

/// Paginated bucket and object listings.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list_buckets(
        &self,
        project_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<Bucket>, EnumerationError>;

    async fn list_objects(
        &self,
        bucket: &str,
        query: ObjectQuery,
        page_token: Option<&str>,
    ) -> Result<Page<ObjectAttrs>, EnumerationError>;
}

#[async_trait]
impl<T: ProjectDirectory + ?Sized> ProjectDirectory for Arc<T> {
    async fn list_projects(
        &self,
        page_token: Option<&str>,
    ) -> Result<Page<Project>, EnumerationError> {
        (**self).list_projects(page_token).await
    }
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for Arc<T> {
    async fn list_buckets(
        &self,
        project_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<Bucket>, EnumerationError> {
        (**self).list_buckets(project_id, page_token).await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        query: ObjectQuery,
        page_token: Option<&str>,
    ) -> Result<Page<ObjectAttrs>, EnumerationError> {
        (**self).list_objects(bucket, query, page_token).await
    }
}

#[async_trait]
impl<T: ProjectDirectory + ?Sized> ProjectDirectory for &T {
    async fn list_projects(
        &self,
        page_token: Option<&str>,
    ) -> Result<Page<Project>, EnumerationError> {
        (**self).list_projects(page_token).await
    }
}

#[async_trait]
impl<T: ObjectStore + ?Sized> ObjectStore for &T {
    async fn list_buckets(
        &self,
        project_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<Bucket>, EnumerationError> {
        (**self).list_buckets(project_id, page_token).await
    }

    async fn list_objects(
        &self,
        bucket: &str,
        query: ObjectQuery,
        page_token: Option<&str>,
    ) -> Result<Page<ObjectAttrs>, EnumerationError> {
        (**self).list_objects(bucket, query, page_token).await
    }
}
