use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ClientRef, Resource};
use crate::Result;
use crate::builder::MapContext;
use crate::hydrate::{Hydrate, from_attributes};
use crate::types::SystemProperties;

/// An environment within a space. Content types, entries, assets and
/// locales live in an environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Environment {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sys: Option<SystemProperties>,
    name: String,
    #[serde(skip)]
    client: Option<ClientRef>,
}

impl Environment {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            sys: None,
            name: name.into(),
            client: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Provisioning status reported by the server (`ready`, `queued`, ...).
    pub fn status(&self) -> Option<&str> {
        self.sys
            .as_ref()?
            .extra("status")?
            .pointer("/sys/id")?
            .as_str()
    }
}

impl Resource for Environment {
    fn type_tag(&self) -> &'static str {
        "Environment"
    }

    fn system_properties(&self) -> Option<&SystemProperties> {
        self.sys.as_ref()
    }

    fn client(&self) -> Option<&ClientRef> {
        self.client.as_ref()
    }

    fn attach_client(&mut self, client: ClientRef) {
        self.client = Some(client);
    }

    fn to_json(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }

    resource_plumbing!();
}

impl Hydrate for Environment {
    fn hydrate(raw: &Value, _cx: &MapContext<'_>) -> Result<Self> {
        from_attributes("Environment", raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceBuilder;
    use serde_json::json;

    #[test]
    fn reads_status_link() {
        let raw = json!({
            "sys": {
                "type": "Environment",
                "id": "staging",
                "status": {"sys": {"type": "Link", "linkType": "Status", "id": "ready"}}
            },
            "name": "staging"
        });
        let env = ResourceBuilder::default()
            .build_as::<Environment>(&raw, None)
            .unwrap();
        assert_eq!(env.status(), Some("ready"));
        assert_eq!(env.to_json().unwrap(), raw);
    }
}
