//! Cloud Resource Manager and Cloud Storage JSON API response types.
//!
//! The storage API encodes 64-bit integers as decimal strings and hashes as
//! base64, so objects are decoded here and converted to [`ObjectAttrs`].

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{AclEntry, Bucket, ObjectAttrs, Project, ProjectTeam};
use crate::traits::EnumerationError;

/// Cloud Resource Manager v1 projects.list response
///
/// See: https://cloud.google.com/resource-manager/reference/rest/v1/projects/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectsListResponse {
    #[serde(default)]
    pub projects: Vec<ProjectResource>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResource {
    pub project_id: String,
}

impl From<ProjectResource> for Project {
    fn from(resource: ProjectResource) -> Self {
        Project::new(resource.project_id)
    }
}

/// Cloud Storage buckets.list response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketsListResponse {
    #[serde(default)]
    pub items: Vec<BucketResource>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BucketResource {
    pub name: String,
}

impl From<BucketResource> for Bucket {
    fn from(resource: BucketResource) -> Self {
        Bucket::new(resource.name)
    }
}

/// Cloud Storage objects.list response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectsListResponse {
    #[serde(default)]
    pub items: Vec<ObjectResource>,
    pub next_page_token: Option<String>,
}

/// Cloud Storage object resource (`projection=full`)
///
/// See: https://cloud.google.com/storage/docs/json_api/v1/objects#resource
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectResource {
    pub name: String,
    pub bucket: String,
    pub content_type: String,
    pub content_language: String,
    pub content_encoding: String,
    pub content_disposition: String,
    pub cache_control: String,
    pub event_based_hold: bool,
    pub temporary_hold: bool,
    pub retention_expiration_time: Option<String>,
    pub acl: Vec<ObjectAccessControl>,
    pub owner: Option<Owner>,
    pub size: Option<String>,
    pub md5_hash: Option<String>,
    pub crc32c: Option<String>,
    pub media_link: String,
    pub generation: Option<String>,
    pub metageneration: Option<String>,
    pub storage_class: String,
    pub time_created: Option<String>,
    pub updated: Option<String>,
    pub time_deleted: Option<String>,
    pub customer_encryption: Option<CustomerEncryption>,
    pub kms_key_name: String,
    pub etag: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObjectAccessControl {
    pub entity: String,
    pub entity_id: String,
    pub role: String,
    pub domain: String,
    pub email: String,
    pub project_team: Option<ProjectTeamResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTeamResource {
    #[serde(default)]
    pub project_number: String,
    #[serde(default)]
    pub team: String,
}

#[derive(Debug, Deserialize)]
pub struct Owner {
    #[serde(default)]
    pub entity: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerEncryption {
    #[serde(default)]
    pub key_sha256: String,
}

impl TryFrom<ObjectResource> for ObjectAttrs {
    type Error = EnumerationError;

    fn try_from(o: ObjectResource) -> Result<Self, Self::Error> {
        let md5 = match o.md5_hash.as_deref() {
            Some(encoded) => decode_base64("md5Hash", encoded)?,
            None => Vec::new(),
        };
        let crc32c = match o.crc32c.as_deref() {
            Some(encoded) => {
                let bytes: [u8; 4] = decode_base64("crc32c", encoded)?
                    .try_into()
                    .map_err(|_| EnumerationError::Parse("crc32c is not 4 bytes".to_string()))?;
                u32::from_be_bytes(bytes)
            }
            None => 0,
        };

        Ok(ObjectAttrs {
            size: parse_int("size", o.size.as_deref())?,
            generation: parse_int("generation", o.generation.as_deref())?,
            metageneration: parse_int("metageneration", o.metageneration.as_deref())?,
            created: parse_time("timeCreated", o.time_created.as_deref())?,
            updated: parse_time("updated", o.updated.as_deref())?,
            deleted: parse_time("timeDeleted", o.time_deleted.as_deref())?,
            retention_expiration_time: parse_time(
                "retentionExpirationTime",
                o.retention_expiration_time.as_deref(),
            )?,
            acl: o
                .acl
                .into_iter()
                .map(|entry| AclEntry {
                    entity: entry.entity,
                    entity_id: entry.entity_id,
                    role: entry.role,
                    domain: entry.domain,
                    email: entry.email,
                    project_team: entry.project_team.map(|t| ProjectTeam {
                        project_number: t.project_number,
                        team: t.team,
                    }),
                })
                .collect(),
            owner: o.owner.map(|owner| owner.entity).unwrap_or_default(),
            customer_key_sha256: o
                .customer_encryption
                .map(|c| c.key_sha256)
                .unwrap_or_default(),
            md5,
            crc32c,
            bucket: o.bucket,
            name: o.name,
            content_type: o.content_type,
            content_language: o.content_language,
            content_encoding: o.content_encoding,
            content_disposition: o.content_disposition,
            cache_control: o.cache_control,
            event_based_hold: o.event_based_hold,
            temporary_hold: o.temporary_hold,
            // Only meaningful on insert; listings never return it.
            predefined_acl: String::new(),
            media_link: o.media_link,
            storage_class: o.storage_class,
            kms_key_name: o.kms_key_name,
            etag: o.etag,
        })
    }
}

fn decode_base64(field: &str, encoded: &str) -> Result<Vec<u8>, EnumerationError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| EnumerationError::Parse(format!("{field}: {e}")))
}

fn parse_int(field: &str, value: Option<&str>) -> Result<i64, EnumerationError> {
    value.map_or(Ok(0), |v| {
        v.parse()
            .map_err(|e| EnumerationError::Parse(format!("{field} {v:?}: {e}")))
    })
}

fn parse_time(field: &str, value: Option<&str>) -> Result<Option<DateTime<Utc>>, EnumerationError> {
    value
        .map(|v| {
            DateTime::parse_from_rfc3339(v)
                .map(|t| t.with_timezone(&Utc))
                .map_err(|e| EnumerationError::Parse(format!("{field} {v:?}: {e}")))
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    const OBJECT_JSON: &str = r#"{
        "kind": "storage#object",
        "name": "reports/q1.csv",
        "bucket": "finance-exports",
        "generation": "1711900800123456",
        "metageneration": "2",
        "contentType": "text/csv",
        "storageClass": "STANDARD",
        "size": "52428800",
        "md5Hash": "XrY7u+Ae7tCTyyK7j1rNww==",
        "crc32c": "AAAAAQ==",
        "mediaLink": "https://storage.googleapis.com/download/storage/v1/b/finance-exports/o/reports%2Fq1.csv?alt=media",
        "timeCreated": "2024-03-31T16:00:00.123456Z",
        "updated": "2024-04-01T09:30:00Z",
        "retentionExpirationTime": "2030-01-01T00:00:00Z",
        "temporaryHold": true,
        "etag": "CMDk0c/1/YIDEAI=",
        "owner": { "entity": "user-finance@example.com" },
        "customerEncryption": { "encryptionAlgorithm": "AES256", "keySha256": "H8jw..." },
        "acl": [
            {
                "entity": "project-owners-1234",
                "role": "OWNER",
                "projectTeam": { "projectNumber": "1234", "team": "owners" }
            },
            {
                "entity": "user-auditor@example.com",
                "role": "READER",
                "email": "auditor@example.com",
                "entityId": "00b4903a"
            }
        ]
    }"#;

    #[test]
    fn test_object_resource_conversion() {
        let resource: ObjectResource = serde_json::from_str(OBJECT_JSON).unwrap();
        let attrs = ObjectAttrs::try_from(resource).unwrap();

        assert_eq!(attrs.name, "reports/q1.csv");
        assert_eq!(attrs.bucket, "finance-exports");
        assert_eq!(attrs.generation, 1_711_900_800_123_456);
        assert_eq!(attrs.metageneration, 2);
        assert_eq!(attrs.size, 52_428_800);
        assert_eq!(hex::encode(&attrs.md5), "5eb63bbbe01eeed093cb22bb8f5acdc3");
        assert_eq!(attrs.crc32c, 1);
        assert_eq!(
            attrs.created.unwrap().timestamp_micros(),
            1_711_900_800_123_456
        );
        assert!(attrs.deleted.is_none());
        assert_eq!(
            attrs.retention_expiration_time.unwrap().timestamp(),
            1_893_456_000
        );
        assert!(attrs.temporary_hold);
        assert!(!attrs.event_based_hold);
        assert_eq!(attrs.owner, "user-finance@example.com");
        assert_eq!(attrs.customer_key_sha256, "H8jw...");
        assert_eq!(attrs.acl.len(), 2);
        assert_eq!(attrs.acl[0].project_team.as_ref().unwrap().team, "owners");
        assert!(attrs.acl[1].project_team.is_none());
        assert_eq!(attrs.acl[1].entity_id, "00b4903a");
    }

    #[test]
    fn test_minimal_object_defaults() {
        let resource: ObjectResource =
            serde_json::from_str(r#"{"name": "a", "bucket": "b"}"#).unwrap();
        let attrs = ObjectAttrs::try_from(resource).unwrap();

        assert_eq!(attrs.size, 0);
        assert!(attrs.md5.is_empty());
        assert!(attrs.created.is_none());
        assert_eq!(attrs.owner, "");
    }

    #[test]
    fn test_bad_integer_is_parse_error() {
        let resource: ObjectResource =
            serde_json::from_str(r#"{"name": "a", "bucket": "b", "size": "lots"}"#).unwrap();
        let err = ObjectAttrs::try_from(resource).unwrap_err();
        assert!(matches!(err, EnumerationError::Parse(_)));
    }

    #[test]
    fn test_list_responses_tolerate_missing_items() {
        let buckets: BucketsListResponse = serde_json::from_str(r#"{"kind": "storage#buckets"}"#).unwrap();
        assert!(buckets.items.is_empty());
        assert!(buckets.next_page_token.is_none());

        let projects: ProjectsListResponse = serde_json::from_str(
            r#"{"projects": [{"projectId": "alpha", "lifecycleState": "ACTIVE"}], "nextPageToken": "abc"}"#,
        )
        .unwrap();
        assert_eq!(projects.next_page_token.as_deref(), Some("abc"));
        let project = Project::from(projects.projects.into_iter().next().unwrap());
        assert_eq!(project.project_id, "alpha");
    }
}
