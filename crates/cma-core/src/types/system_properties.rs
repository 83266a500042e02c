//! System properties (`sys`) and resource identity.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Link;

/// Server-assigned bookkeeping for a resource.
///
/// This is a read-only snapshot: it is only ever replaced wholesale, when a
/// resource is re-fetched or after a successful mutating call. Keys this type
/// does not model are kept in an overflow map so the full representation of a
/// resource survives a round trip.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemProperties {
    #[serde(rename = "type")]
    type_tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    space: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    environment: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    content_type: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    created_by: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    updated_by: Option<Link>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    published_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    first_published_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    archived_version: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    archived_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl SystemProperties {
    /// Returns the system type tag (e.g. `"Entry"`).
    pub fn type_tag(&self) -> &str {
        &self.type_tag
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn space(&self) -> Option<&Link> {
        self.space.as_ref()
    }

    pub fn environment(&self) -> Option<&Link> {
        self.environment.as_ref()
    }

    /// Returns the content type link (entries only).
    pub fn content_type(&self) -> Option<&Link> {
        self.content_type.as_ref()
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    pub fn created_by(&self) -> Option<&Link> {
        self.created_by.as_ref()
    }

    pub fn updated_by(&self) -> Option<&Link> {
        self.updated_by.as_ref()
    }

    pub fn published_version(&self) -> Option<u64> {
        self.published_version
    }

    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        self.published_at
    }

    pub fn first_published_at(&self) -> Option<DateTime<Utc>> {
        self.first_published_at
    }

    pub fn archived_version(&self) -> Option<u64> {
        self.archived_version
    }

    pub fn archived_at(&self) -> Option<DateTime<Utc>> {
        self.archived_at
    }

    /// Returns a `sys` key this type does not model.
    pub fn extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    /// Returns true if the resource has a published version.
    pub fn is_published(&self) -> bool {
        self.published_version.is_some()
    }

    /// Returns true if the resource is currently archived.
    pub fn is_archived(&self) -> bool {
        self.archived_version.is_some()
    }

    /// Returns the identity these properties describe, if the resource has an id.
    pub fn identity(&self) -> Option<ResourceIdentity> {
        let id = self.id.clone()?;
        Some(ResourceIdentity {
            type_tag: self.type_tag.clone(),
            id,
            space_id: self.space.as_ref().map(|l| l.id().to_string()),
            environment_id: self.environment.as_ref().map(|l| l.id().to_string()),
        })
    }
}

/// The logical identity of a resource.
///
/// Two hydrations of the same server-side resource share an identity even
/// though they are distinct objects.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceIdentity {
    pub type_tag: String,
    pub id: String,
    pub space_id: Option<String>,
    pub environment_id: Option<String>,
}

impl ResourceIdentity {
    /// Returns a link pointing at this resource.
    pub fn to_link(&self) -> Link {
        Link::new(self.type_tag.clone(), self.id.clone())
    }
}
