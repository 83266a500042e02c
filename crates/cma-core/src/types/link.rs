//! Link type.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A lightweight reference to another resource.
///
/// On the wire a link is `{"sys": {"type": "Link", "linkType": "Entry", "id": "..."}}`.
/// Links are resolved on demand by the transport layer.
///
/// # Example
///
/// ```
/// use cma_core::Link;
/// use serde_json::json;
///
/// let link: Link = serde_json::from_value(json!({
///     "sys": {"type": "Link", "linkType": "Entry", "id": "nyancat"}
/// })).unwrap();
/// assert_eq!(link.link_type(), "Entry");
/// assert_eq!(link.id(), "nyancat");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Link {
    link_type: String,
    id: String,
}

impl Link {
    /// Create a link to a resource of the given type.
    pub fn new(link_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            link_type: link_type.into(),
            id: id.into(),
        }
    }

    /// Returns the linked resource's type tag.
    pub fn link_type(&self) -> &str {
        &self.link_type
    }

    /// Returns the linked resource's id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Read a link out of a raw JSON value, if it is one.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// Returns the wire representation of this link.
    pub fn to_value(&self) -> Value {
        serde_json::json!({
            "sys": {"type": "Link", "linkType": self.link_type, "id": self.id}
        })
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.link_type, self.id)
    }
}

#[derive(Serialize, Deserialize)]
struct LinkWire {
    sys: LinkSys,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LinkSys {
    #[serde(rename = "type")]
    kind: String,
    link_type: String,
    id: String,
}

impl Serialize for Link {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        LinkWire {
            sys: LinkSys {
                kind: "Link".to_string(),
                link_type: self.link_type.clone(),
                id: self.id.clone(),
            },
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Link {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = LinkWire::deserialize(deserializer)?;
        if wire.sys.kind != "Link" {
            return Err(serde::de::Error::custom(format!(
                "expected sys.type 'Link', found '{}'",
                wire.sys.kind
            )));
        }
        Ok(Link {
            link_type: wire.sys.link_type,
            id: wire.sys.id,
        })
    }
}
