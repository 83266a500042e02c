use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ClientRef, Resource};
use crate::Result;
use crate::builder::MapContext;
use crate::hydrate::{Hydrate, from_attributes};
use crate::types::SystemProperties;

/// A space: the top-level container for environments, roles and webhooks.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Space {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sys: Option<SystemProperties>,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    default_locale: Option<String>,
    #[serde(skip)]
    client: Option<ClientRef>,
}

impl Space {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            sys: None,
            name: name.into(),
            default_locale: None,
            client: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Locale code new environments start with. Only honoured on creation.
    pub fn default_locale(&self) -> Option<&str> {
        self.default_locale.as_deref()
    }

    pub fn set_default_locale(&mut self, code: Option<String>) {
        self.default_locale = code;
    }
}

impl Resource for Space {
    fn type_tag(&self) -> &'static str {
        "Space"
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

impl Hydrate for Space {
    fn hydrate(raw: &Value, _cx: &MapContext<'_>) -> Result<Self> {
        from_attributes("Space", raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceBuilder;
    use serde_json::json;

    #[test]
    fn hydrates_and_serializes() {
        let raw = json!({
            "sys": {"type": "Space", "id": "cfexampleapi", "version": 3},
            "name": "Example"
        });
        let space = ResourceBuilder::default()
            .build_as::<Space>(&raw, None)
            .unwrap();
        assert_eq!(space.name(), "Example");
        assert_eq!(space.to_json().unwrap(), raw);
        assert_eq!(space.as_request_body().unwrap(), json!({"name": "Example"}));
    }

    #[test]
    fn new_space_body_carries_default_locale() {
        let mut space = Space::new("Blog");
        space.set_default_locale(Some("de-DE".into()));
        assert!(space.system_properties().is_none());
        assert_eq!(
            space.as_request_body().unwrap(),
            json!({"name": "Blog", "defaultLocale": "de-DE"})
        );
    }
}
