//! Resource action tests for cma-core.
//!
//! A recording in-memory client stands in for the HTTP transport.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cma_core::{
    ApiClient, Asset, ClientRef, ContentType, ContentTypeRouter, Entry, EntryModel, Error, Link,
    Resource, ResourceAction, ResourceActions, ResourceBuilder, Result, Space, TypeRegistry,
};
use serde_json::{Value, json};

#[derive(Debug, Default)]
struct RecordingClient {
    builder: ResourceBuilder,
    calls: Mutex<Vec<String>>,
}

impl RecordingClient {
    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Echo the request body back with server-side bookkeeping filled in.
    fn respond(&self, resource: &dyn Resource, version: u64, extra: Value) -> Result<Box<dyn Resource>> {
        let mut body = resource.as_request_body()?;
        let mut sys = json!({
            "type": resource.type_tag(),
            "id": resource.id().unwrap_or("generated"),
            "version": version
        });
        if let Some(ct) = resource.content_type_id() {
            sys["contentType"] = Link::new("ContentType", ct).to_value();
        }
        if let (Value::Object(sys), Value::Object(extra)) = (&mut sys, extra) {
            sys.extend(extra);
        }
        body["sys"] = sys;
        self.builder.build(&body)
    }
}

#[async_trait]
impl ApiClient for RecordingClient {
    async fn resolve_link(&self, link: &Link) -> Result<Box<dyn Resource>> {
        self.record(format!("resolve {link}"));
        self.builder.build(&json!({
            "sys": {"type": link.link_type(), "id": link.id()},
            "name": "Resolved"
        }))
    }

    async fn create(&self, resource: &dyn Resource) -> Result<Box<dyn Resource>> {
        self.record(format!("create {}", resource.type_tag()));
        self.respond(resource, 1, json!({}))
    }

    async fn update(&self, resource: &dyn Resource) -> Result<Box<dyn Resource>> {
        let version = resource.version().unwrap_or(0);
        self.record(format!("update {} v{version}", resource.type_tag()));
        self.respond(resource, version + 1, json!({}))
    }

    async fn delete(&self, resource: &dyn Resource) -> Result<()> {
        self.record(format!("delete {}", resource.id().unwrap_or_default()));
        Ok(())
    }

    async fn perform(
        &self,
        resource: &dyn Resource,
        action: &ResourceAction,
    ) -> Result<Box<dyn Resource>> {
        self.record(format!("{action} {}", resource.id().unwrap_or_default()));
        let version = resource.version().unwrap_or(0) + 1;
        let extra = match action {
            ResourceAction::Publish => json!({"publishedVersion": version - 1}),
            ResourceAction::Archive => json!({"archivedVersion": version - 1}),
            _ => json!({}),
        };
        self.respond(resource, version, extra)
    }
}

fn client() -> (Arc<RecordingClient>, ClientRef) {
    let recording = Arc::new(RecordingClient::default());
    let client: ClientRef = recording.clone();
    (recording, client)
}

fn attached_entry(client: &ClientRef) -> Entry {
    ResourceBuilder::default()
        .build_as::<Entry>(
            &json!({
                "sys": {
                    "type": "Entry",
                    "id": "nyancat",
                    "version": 3,
                    "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": "cat"}}
                },
                "fields": {"name": {"en-US": "Nyan Cat"}}
            }),
            Some(client),
        )
        .unwrap()
}

// ============================================================================
// Save
// ============================================================================

#[tokio::test]
async fn test_save_creates_then_updates() {
    let (recording, client) = client();
    let mut entry = Entry::new("cat");
    entry.set_field("name", "en-US", json!("Grumpy Cat"));
    entry.attach_client(client);

    entry.save().await.unwrap();
    assert_eq!(entry.id(), Some("generated"));
    assert_eq!(entry.version(), Some(1));
    assert_eq!(entry.text("name", "en-US"), Some("Grumpy Cat"));

    entry.set_field("name", "en-US", json!("Grumpier Cat"));
    entry.save().await.unwrap();
    assert_eq!(entry.version(), Some(2));
    assert_eq!(entry.text("name", "en-US"), Some("Grumpier Cat"));

    assert_eq!(recording.calls(), ["create Entry", "update Entry v1"]);
}

#[tokio::test]
async fn test_refresh_keeps_client() {
    let (_recording, client) = client();
    let mut entry = attached_entry(&client);
    entry.save().await.unwrap();
    assert!(entry.client().is_some());
    entry.publish().await.unwrap();
}

#[derive(Debug)]
struct Author(Entry);

impl EntryModel for Author {
    const CONTENT_TYPE_ID: &'static str = "author";

    fn from_entry(entry: Entry) -> Result<Self> {
        Ok(Author(entry))
    }

    fn entry(&self) -> &Entry {
        &self.0
    }

    fn entry_mut(&mut self) -> &mut Entry {
        &mut self.0
    }
}

fn routed_client() -> (Arc<RecordingClient>, ClientRef) {
    let mut registry = TypeRegistry::with_defaults();
    registry.register_entry_router(ContentTypeRouter::new().route_model::<Author>());
    let recording = Arc::new(RecordingClient {
        builder: ResourceBuilder::new(registry),
        calls: Mutex::default(),
    });
    let client: ClientRef = recording.clone();
    (recording, client)
}

#[tokio::test]
async fn test_plain_entry_saves_through_routed_client() {
    let (recording, client) = routed_client();
    let mut entry = Entry::new("author");
    entry.set_field("name", "en-US", json!("Ada"));
    entry.attach_client(client);

    entry.save().await.unwrap();
    assert_eq!(entry.id(), Some("generated"));
    assert_eq!(entry.version(), Some(1));
    assert!(entry.client().is_some());

    entry.publish().await.unwrap();
    assert_eq!(entry.version(), Some(2));
    assert_eq!(entry.text("name", "en-US"), Some("Ada"));
    assert_eq!(recording.calls(), ["create Entry", "publish generated"]);
}

#[tokio::test]
async fn test_model_saves_through_routed_client() {
    let (_recording, client) = routed_client();
    let mut author = Author(Entry::new("author"));
    author.0.set_field("name", "en-US", json!("Grace"));
    author.attach_client(client);

    author.save().await.unwrap();
    assert_eq!(author.id(), Some("generated"));
    assert_eq!(author.entry().text("name", "en-US"), Some("Grace"));
}

#[tokio::test]
async fn test_detached_resource_cannot_act() {
    let mut space = Space::new("Blog");
    match space.save().await {
        Err(Error::Detached { type_tag }) => assert_eq!(type_tag, "Space"),
        other => panic!("expected Detached, got {:?}", other),
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test]
async fn test_publish_and_archive_entry() {
    let (recording, client) = client();
    let mut entry = attached_entry(&client);

    entry.publish().await.unwrap();
    assert!(entry.system_properties().unwrap().is_published());
    assert_eq!(entry.version(), Some(4));

    entry.archive().await.unwrap();
    assert!(entry.system_properties().unwrap().is_archived());

    assert_eq!(recording.calls(), ["publish nyancat", "archive nyancat"]);
}

#[tokio::test]
async fn test_unsupported_action_is_rejected_before_calling() {
    let (recording, client) = client();
    let mut content_type = ResourceBuilder::default()
        .build_as::<ContentType>(
            &json!({"sys": {"type": "ContentType", "id": "cat"}, "name": "Cat", "fields": []}),
            Some(&client),
        )
        .unwrap();

    let err = content_type.archive().await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedAction { .. }));
    let err = content_type.process("en-US").await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedAction { .. }));
    assert!(recording.calls().is_empty());
}

#[tokio::test]
async fn test_unsaved_resource_cannot_publish() {
    let (recording, client) = client();
    let mut asset = Asset::new();
    asset.attach_client(client);
    let err = asset.publish().await.unwrap_err();
    assert!(matches!(
        err,
        Error::MissingSystemProperty { property: "id", .. }
    ));
    assert!(recording.calls().is_empty());
}

#[tokio::test]
async fn test_process_asset() {
    let (recording, client) = client();
    let mut asset = ResourceBuilder::default()
        .build_as::<Asset>(
            &json!({"sys": {"type": "Asset", "id": "logo", "version": 1}, "fields": {}}),
            Some(&client),
        )
        .unwrap();
    asset.process("en-US").await.unwrap();
    assert_eq!(recording.calls(), ["process logo"]);
}

#[tokio::test]
async fn test_delete_and_resolve() {
    let (recording, client) = client();
    let entry = attached_entry(&client);

    let friend = entry.resolve(&Link::new("Space", "blog")).await.unwrap();
    assert!(friend.is::<Space>());

    entry.delete().await.unwrap();
    assert_eq!(recording.calls(), ["resolve Space:blog", "delete nyancat"]);
}

#[tokio::test]
async fn test_actions_through_trait_object() {
    let (recording, client) = client();
    let mut resource: Box<dyn Resource> = Box::new(attached_entry(&client));
    resource.publish().await.unwrap();
    assert_eq!(resource.version(), Some(4));
    assert!(resource.is::<Entry>());
    assert_eq!(recording.calls(), ["publish nyancat"]);
}
