use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ClientRef, Resource};
use crate::Result;
use crate::builder::MapContext;
use crate::hydrate::{Hydrate, from_attributes};
use crate::types::SystemProperties;

/// A locale of an environment.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Locale {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sys: Option<SystemProperties>,
    name: String,
    code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fallback_code: Option<String>,
    #[serde(default)]
    default: bool,
    #[serde(default)]
    optional: bool,
    #[serde(default = "enabled")]
    content_delivery_api: bool,
    #[serde(default = "enabled")]
    content_management_api: bool,
    #[serde(skip)]
    client: Option<ClientRef>,
}

fn enabled() -> bool {
    true
}

impl Locale {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            sys: None,
            name: name.into(),
            code: code.into(),
            fallback_code: None,
            default: false,
            optional: false,
            content_delivery_api: true,
            content_management_api: true,
            client: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn fallback_code(&self) -> Option<&str> {
        self.fallback_code.as_deref()
    }

    pub fn set_fallback_code(&mut self, code: Option<String>) {
        self.fallback_code = code;
    }

    /// True for the environment's default locale. Server-controlled.
    pub fn is_default(&self) -> bool {
        self.default
    }

    pub fn is_optional(&self) -> bool {
        self.optional
    }

    pub fn set_optional(&mut self, optional: bool) {
        self.optional = optional;
    }

    pub fn content_delivery_api(&self) -> bool {
        self.content_delivery_api
    }

    pub fn content_management_api(&self) -> bool {
        self.content_management_api
    }
}

impl Resource for Locale {
    fn type_tag(&self) -> &'static str {
        "Locale"
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

    /// The API rejects writes that carry `default`.
    fn as_request_body(&self) -> Result<Value> {
        let mut body = self.to_json()?;
        if let Value::Object(ref mut map) = body {
            map.remove("sys");
            map.remove("default");
        }
        Ok(body)
    }

    resource_plumbing!();
}

impl Hydrate for Locale {
    fn hydrate(raw: &Value, _cx: &MapContext<'_>) -> Result<Self> {
        from_attributes("Locale", raw)
    }
}
