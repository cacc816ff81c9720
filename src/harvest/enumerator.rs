//! Project discovery.

use tracing::{debug, info, instrument};

use crate::model::Project;
use crate::traits::{HarvestError, ProjectDirectory};

/// Walks every page of a [`ProjectDirectory`].
pub struct ProjectEnumerator<D> {
    directory: D,
}

impl<D: ProjectDirectory> ProjectEnumerator<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Returns every visible project, fully materialized.
    ///
    /// The whole project list is held in memory before harvesting starts.
    ///
    /// # Errors
    ///
    /// Returns [`HarvestError::ProjectListing`] on the first failed page.
    #[instrument(skip(self))]
    pub async fn list_all_projects(&self) -> Result<Vec<Project>, HarvestError> {
        info!("Retrieving a list of all projects");

        let mut projects = Vec::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .directory
                .list_projects(page_token.as_deref())
                .await
                .map_err(HarvestError::ProjectListing)?;
            pages += 1;

            let next = page.continuation().map(str::to_string);
            debug!(page = pages, count = page.items.len(), "Fetched project page");
            projects.extend(page.items);

            match next {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        info!(projects = projects.len(), pages, "Project enumeration complete");
        Ok(projects)
    }
}
