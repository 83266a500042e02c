use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ClientRef, Resource};
use crate::Result;
use crate::builder::MapContext;
use crate::constraint::{Constraint, ConstraintContext};
use crate::error::Error;
use crate::hydrate::{Hydrate, from_attributes, subject};
use crate::types::SystemProperties;

/// A custom header sent with every webhook call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookHeader {
    pub key: String,
    /// Secret header values are never returned by the API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub secret: bool,
}

impl WebhookHeader {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            secret: false,
        }
    }

    pub fn secret(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            secret: true,
            ..Self::new(key, value)
        }
    }
}

/// A webhook: a URL called when events matching its topics and filters occur.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sys: Option<SystemProperties>,
    name: String,
    url: String,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    headers: Vec<WebhookHeader>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    http_basic_username: Option<String>,
    /// Write-only: the API never returns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    http_basic_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active: Option<bool>,
    #[serde(default, skip_deserializing, skip_serializing_if = "Vec::is_empty")]
    filters: Vec<Constraint>,
    #[serde(skip)]
    client: Option<ClientRef>,
}

impl WebhookDefinition {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            sys: None,
            name: name.into(),
            url: url.into(),
            topics: Vec::new(),
            headers: Vec::new(),
            http_basic_username: None,
            http_basic_password: None,
            active: None,
            filters: Vec::new(),
            client: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Event topics, such as `Entry.publish` or `*.*`.
    pub fn topics(&self) -> &[String] {
        &self.topics
    }

    pub fn add_topic(&mut self, topic: impl Into<String>) {
        let topic = topic.into();
        if !self.topics.contains(&topic) {
            self.topics.push(topic);
        }
    }

    pub fn headers(&self) -> &[WebhookHeader] {
        &self.headers
    }

    pub fn add_header(&mut self, header: WebhookHeader) {
        self.headers.push(header);
    }

    pub fn set_basic_auth(&mut self, username: impl Into<String>, password: impl Into<String>) {
        self.http_basic_username = Some(username.into());
        self.http_basic_password = Some(password.into());
    }

    pub fn http_basic_username(&self) -> Option<&str> {
        self.http_basic_username.as_deref()
    }

    pub fn is_active(&self) -> bool {
        self.active.unwrap_or(true)
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = Some(active);
    }

    pub fn filters(&self) -> &[Constraint] {
        &self.filters
    }

    /// Add a filter. The constraint tree must be legal in webhook filters.
    pub fn add_filter(&mut self, filter: Constraint) -> Result<()> {
        filter.check(ConstraintContext::WebhookFilter)?;
        self.filters.push(filter);
        Ok(())
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }
}

impl Resource for WebhookDefinition {
    fn type_tag(&self) -> &'static str {
        "WebhookDefinition"
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

impl Hydrate for WebhookDefinition {
    fn hydrate(raw: &Value, cx: &MapContext<'_>) -> Result<Self> {
        let mut webhook: WebhookDefinition = from_attributes("WebhookDefinition", raw)?;
        match raw.get("filters") {
            None | Some(Value::Null) => {}
            Some(Value::Array(filters)) => {
                for filter in filters {
                    webhook.filters.push(
                        cx.constraints()
                            .build_in(filter, ConstraintContext::WebhookFilter)?,
                    );
                }
            }
            Some(_) => {
                return Err(Error::invalid_shape(
                    subject(raw),
                    "WebhookDefinition",
                    "'filters' must be an array",
                ));
            }
        }
        Ok(webhook)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResourceBuilder;
    use serde_json::json;

    fn raw_webhook() -> Value {
        json!({
            "sys": {"type": "WebhookDefinition", "id": "hook"},
            "name": "Build",
            "url": "https://ci.example.com/build",
            "topics": ["Entry.publish", "Asset.*"],
            "headers": [{"key": "X-Token", "secret": true}],
            "filters": [
                {"equals": [{"doc": "sys.environment.sys.id"}, "master"]},
                {"not": {"in": [{"doc": "sys.contentType.sys.id"}, ["draft"]]}}
            ]
        })
    }

    #[test]
    fn hydrates_filters() {
        let webhook = ResourceBuilder::default()
            .build_as::<WebhookDefinition>(&raw_webhook(), None)
            .unwrap();
        assert_eq!(webhook.filters().len(), 2);
        assert!(webhook.headers()[0].secret);
        assert!(webhook.is_active());
        assert_eq!(webhook.to_json().unwrap(), raw_webhook());
    }

    #[test]
    fn paths_are_illegal_in_filters() {
        let mut raw = raw_webhook();
        raw["filters"] = json!([{"paths": [{"doc": "fields.title"}]}]);
        let err = ResourceBuilder::default().build(&raw).unwrap_err();
        assert!(matches!(err, Error::IllegalConstraint { .. }));

        let mut webhook = WebhookDefinition::new("Build", "https://ci.example.com");
        let err = webhook
            .add_filter(Constraint::and([Constraint::equals("sys.id", "x")]))
            .unwrap_err();
        assert!(matches!(err, Error::IllegalConstraint { .. }));
        assert!(webhook.filters().is_empty());
    }

    #[test]
    fn builds_new_webhook_body() {
        let mut webhook = WebhookDefinition::new("Build", "https://ci.example.com");
        webhook.add_topic("Entry.publish");
        webhook.add_topic("Entry.publish");
        webhook.set_basic_auth("ci", "hunter2");
        webhook
            .add_filter(Constraint::regexp("sys.id", "^post-"))
            .unwrap();
        let body = webhook.as_request_body().unwrap();
        assert_eq!(body["topics"], json!(["Entry.publish"]));
        assert_eq!(body["httpBasicPassword"], "hunter2");
        assert_eq!(
            body["filters"],
            json!([{"regexp": [{"doc": "sys.id"}, {"pattern": "^post-"}]}])
        );
    }
}
