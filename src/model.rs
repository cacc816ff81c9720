use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: String,
}

impl Project {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub name: String,
}

impl Bucket {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Team membership attached to a project-scoped ACL entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTeam {
    pub project_number: String,
    pub team: String, // "owners", "editors" or "viewers"
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    pub entity: String, // e.g., "user-alice@example.com", "allUsers"
    pub entity_id: String,
    pub role: String, // "OWNER" or "READER"
    pub domain: String,
    pub email: String,
    pub project_team: Option<ProjectTeam>,
}

/// Full attribute set of one stored object, as returned by a listing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectAttrs {
    pub bucket: String,
    pub name: String,
    pub content_type: String,
    pub content_language: String,
    pub content_encoding: String,
    pub content_disposition: String,
    pub cache_control: String,
    pub event_based_hold: bool,
    pub temporary_hold: bool,
    pub retention_expiration_time: Option<DateTime<Utc>>,
    pub acl: Vec<AclEntry>,
    pub predefined_acl: String,
    pub owner: String,
    pub size: i64,
    pub md5: Vec<u8>,
    pub crc32c: u32,
    pub media_link: String,
    pub generation: i64,
    pub metageneration: i64,
    pub storage_class: String,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub deleted: Option<DateTime<Utc>>,
    pub customer_key_sha256: String,
    pub kms_key_name: String,
    pub etag: String,
}

/// One discovered object in transit from a harvester to the sink.
#[derive(Debug, Clone)]
pub struct HarvestItem {
    pub project_id: String,
    pub bucket_name: String,
    pub object: ObjectAttrs,
}

/// Flat, schema-shaped row written to the export file.
///
/// Field names match the Avro schema (`schema/gcs2bq.avsc`). Timestamps are
/// epoch ticks where `0` means "absent": `created`, `updated` and `deleted`
/// are microseconds, `retention_expiration_time` is milliseconds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub project_id: String,
    pub bucket: String,
    pub name: String,
    pub content_type: String,
    pub content_language: String,
    pub cache_control: String,
    pub event_based_hold: bool,
    pub temporary_hold: bool,
    pub retention_expiration_time: i64,
    pub acl: Vec<BTreeMap<String, String>>,
    pub predefined_acl: String,
    pub owner: String,
    pub size: i64,
    pub content_encoding: String,
    pub content_disposition: String,
    pub md5: String,
    pub crc32c: i32,
    pub media_link: String,
    pub generation: i64,
    pub metageneration: i64,
    pub storage_class: String,
    pub created: i64,
    pub deleted: i64,
    pub updated: i64,
    pub customer_key_sha256: String,
    pub kms_key_name: String,
    pub etag: String,
}

/// One page of a paginated listing.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }

    /// Token for the following page, or `None` when this was the last one.
    ///
    /// An empty string token also ends pagination.
    pub fn continuation(&self) -> Option<&str> {
        self.next_page_token.as_deref().filter(|t| !t.is_empty())
    }
}

/// Object listing options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObjectQuery {
    /// Include non-current object versions
    pub versions: bool,
}
