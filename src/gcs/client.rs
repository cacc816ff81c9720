//! REST client for the project directory and object listings.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::gcs::types::{BucketsListResponse, ObjectsListResponse, ProjectsListResponse};
use crate::model::{Bucket, ObjectAttrs, ObjectQuery, Page, Project};
use crate::traits::{EnumerationError, ObjectStore, ProjectDirectory, SetupError};

/// Cloud Storage JSON API base URL
const STORAGE_API_BASE: &str = "https://storage.googleapis.com/storage/v1";

/// Cloud Resource Manager v1 base URL
const RESOURCE_MANAGER_API_BASE: &str = "https://cloudresourcemanager.googleapis.com/v1";

/// Maximum results per page
const MAX_RESULTS: u32 = 1000;

/// Authenticated client for Cloud Resource Manager and Cloud Storage.
///
/// Takes an already-issued OAuth 2.0 access token with the
/// `cloud-platform.read-only` (or broader) scope. Token refresh is the
/// caller's concern.
#[derive(Clone)]
pub struct GcsClient {
    http: reqwest::Client,
    access_token: String,
    storage_base: String,
    resource_manager_base: String,
}

impl GcsClient {
    pub fn new(access_token: impl Into<String>) -> Result<Self, SetupError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SetupError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            access_token: access_token.into(),
            storage_base: STORAGE_API_BASE.to_string(),
            resource_manager_base: RESOURCE_MANAGER_API_BASE.to_string(),
        })
    }

    /// Points the client at alternative endpoints (emulators, proxies).
    pub fn with_endpoints(
        mut self,
        storage_base: impl Into<String>,
        resource_manager_base: impl Into<String>,
    ) -> Self {
        self.storage_base = storage_base.into();
        self.resource_manager_base = resource_manager_base.into();
        self
    }

    #[instrument(skip(self, query))]
    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, EnumerationError> {
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .query(query)
            .send()
            .await
            .map_err(|e| EnumerationError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EnumerationError::Api {
                status: status.as_u16(),
                message,
            });
        }

        debug!("API request succeeded: status={}", status);
        response
            .json::<T>()
            .await
            .map_err(|e| EnumerationError::Parse(e.to_string()))
    }
}

fn paging(page_token: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![("maxResults", MAX_RESULTS.to_string())];
    if let Some(token) = page_token {
        query.push(("pageToken", token.to_string()));
    }
    query
}

#[async_trait]
impl ProjectDirectory for GcsClient {
    async fn list_projects(
        &self,
        page_token: Option<&str>,
    ) -> Result<Page<Project>, EnumerationError> {
        let url = format!("{}/projects", self.resource_manager_base);
        let mut query = Vec::new();
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }

        let response: ProjectsListResponse = self.get_json(&url, &query).await?;
        Ok(Page::new(
            response.projects.into_iter().map(Project::from).collect(),
            response.next_page_token,
        ))
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    async fn list_buckets(
        &self,
        project_id: &str,
        page_token: Option<&str>,
    ) -> Result<Page<Bucket>, EnumerationError> {
        let url = format!("{}/b", self.storage_base);
        let mut query = paging(page_token);
        query.push(("project", project_id.to_string()));

        let response: BucketsListResponse = self.get_json(&url, &query).await?;
        Ok(Page::new(
            response.items.into_iter().map(Bucket::from).collect(),
            response.next_page_token,
        ))
    }

    async fn list_objects(
        &self,
        bucket: &str,
        query: ObjectQuery,
        page_token: Option<&str>,
    ) -> Result<Page<ObjectAttrs>, EnumerationError> {
        // Bucket names are restricted to [a-z0-9._-], no path escaping needed.
        let url = format!("{}/b/{}/o", self.storage_base, bucket);
        let mut params = paging(page_token);
        params.push(("projection", "full".to_string()));
        if query.versions {
            params.push(("versions", "true".to_string()));
        }

        let response: ObjectsListResponse = self.get_json(&url, &params).await?;
        let items = response
            .items
            .into_iter()
            .map(ObjectAttrs::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, response.next_page_token))
    }
}
