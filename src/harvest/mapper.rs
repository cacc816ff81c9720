//! Mapping from raw object metadata to the flat export row.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::harvest::traits::HarvestStage;
use crate::model::{AclEntry, HarvestItem, ObjectAttrs, OutputRecord};

/// Stage wrapper around [`map_object`].
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordMapper;

impl HarvestStage for RecordMapper {
    type Input = HarvestItem;
    type Output = OutputRecord;
    type Error = Infallible;

    fn execute(&self, input: HarvestItem) -> Result<OutputRecord, Infallible> {
        Ok(map_object(&input.project_id, &input.object))
    }

    fn stage_name(&self) -> &'static str {
        "record_mapper"
    }
}

/// Flattens `object` into an [`OutputRecord`] owned by `project_id`.
pub fn map_object(project_id: &str, object: &ObjectAttrs) -> OutputRecord {
    OutputRecord {
        project_id: project_id.to_string(),
        bucket: object.bucket.clone(),
        name: object.name.clone(),
        content_type: object.content_type.clone(),
        content_language: object.content_language.clone(),
        cache_control: object.cache_control.clone(),
        event_based_hold: object.event_based_hold,
        temporary_hold: object.temporary_hold,
        retention_expiration_time: epoch_millis(object.retention_expiration_time),
        acl: object.acl.iter().map(acl_to_map).collect(),
        predefined_acl: object.predefined_acl.clone(),
        owner: object.owner.clone(),
        size: object.size,
        content_encoding: object.content_encoding.clone(),
        content_disposition: object.content_disposition.clone(),
        md5: hex::encode(&object.md5),
        // Avro has no unsigned int; keep the bit pattern.
        crc32c: object.crc32c as i32,
        media_link: object.media_link.clone(),
        generation: object.generation,
        metageneration: object.metageneration,
        storage_class: object.storage_class.clone(),
        created: epoch_micros(object.created),
        deleted: epoch_micros(object.deleted),
        updated: epoch_micros(object.updated),
        customer_key_sha256: object.customer_key_sha256.clone(),
        kms_key_name: object.kms_key_name.clone(),
        etag: object.etag.clone(),
    }
}

/// Microseconds since the Unix epoch, `0` when unset.
pub fn epoch_micros(ts: Option<DateTime<Utc>>) -> i64 {
    ts.map(|t| t.timestamp_micros()).unwrap_or(0)
}

/// Milliseconds since the Unix epoch, `0` when unset.
pub fn epoch_millis(ts: Option<DateTime<Utc>>) -> i64 {
    ts.map(|t| t.timestamp_millis()).unwrap_or(0)
}

fn acl_to_map(entry: &AclEntry) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    map.insert("entity".to_string(), entry.entity.clone());
    map.insert("entity_id".to_string(), entry.entity_id.clone());
    map.insert("role".to_string(), entry.role.clone());
    map.insert("domain".to_string(), entry.domain.clone());
    map.insert("email".to_string(), entry.email.clone());
    if let Some(team) = &entry.project_team {
        map.insert(
            "team_project_number".to_string(),
            team.project_number.clone(),
        );
        map.insert("team_project_team".to_string(), team.team.clone());
    }
    map
}
