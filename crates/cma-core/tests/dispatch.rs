//! Dispatch tests for cma-core.
//!
//! These exercise the registry, the resource builder and entry models
//! together, the way an application wires them at startup.

use cma_core::{
    ContentTypeRouter, Entry, EntryModel, Error, FieldFactory, Resource, ResourceBuilder, Result,
    Space, TypeRegistry, ValidationFactory, mapper_fn, mapper_for,
};
use proptest::prelude::*;
use serde_json::{Value, json};

#[derive(Debug)]
struct Author(Entry);

impl Author {
    fn name(&self) -> Option<&str> {
        self.0.text("name", "en-US")
    }
}

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

#[derive(Debug)]
struct BlogPost(Entry);

impl EntryModel for BlogPost {
    const CONTENT_TYPE_ID: &'static str = "blogPost";

    fn from_entry(entry: Entry) -> Result<Self> {
        Ok(BlogPost(entry))
    }

    fn entry(&self) -> &Entry {
        &self.0
    }

    fn entry_mut(&mut self) -> &mut Entry {
        &mut self.0
    }
}

fn entry(id: &str, content_type: &str) -> Value {
    json!({
        "sys": {
            "type": "Entry",
            "id": id,
            "version": 1,
            "space": {"sys": {"type": "Link", "linkType": "Space", "id": "blog"}},
            "environment": {"sys": {"type": "Link", "linkType": "Environment", "id": "master"}},
            "contentType": {"sys": {"type": "Link", "linkType": "ContentType", "id": content_type}}
        },
        "fields": {"name": {"en-US": format!("{id} name")}}
    })
}

fn routed_builder() -> ResourceBuilder {
    let mut registry = TypeRegistry::with_defaults();
    registry.register_entry_router(
        ContentTypeRouter::new()
            .route_model::<Author>()
            .route_model::<BlogPost>(),
    );
    ResourceBuilder::new(registry)
}

// ============================================================================
// Contextual dispatch
// ============================================================================

#[test]
fn test_entries_route_by_content_type() {
    let builder = routed_builder();

    let author = builder.build(&entry("a1", "author")).unwrap();
    let post = builder.build(&entry("p1", "blogPost")).unwrap();
    let plain = builder.build(&entry("x1", "recipe")).unwrap();

    assert!(author.is::<Author>());
    assert!(post.is::<BlogPost>());
    assert!(plain.is::<Entry>());
    assert_eq!(author.downcast_ref::<Author>().unwrap().name(), Some("a1 name"));
    assert_eq!(author.type_tag(), "Entry");
    assert_eq!(author.content_type_id(), Some("author"));
}

#[test]
fn test_entries_without_routes_use_default_mapper() {
    let builder = ResourceBuilder::default();
    assert!(builder.build(&entry("a1", "author")).unwrap().is::<Entry>());
    assert!(builder.build(&entry("p1", "blogPost")).unwrap().is::<Entry>());
}

#[test]
fn test_contextual_mapping_wins_over_plain() {
    let mut registry = TypeRegistry::with_defaults();
    registry.register_contextual("Entry", |_raw: &Value| Some(mapper_for::<Author>()));
    // Re-registering the plain mapping afterwards does not change precedence.
    registry.register("Entry", mapper_for::<Entry>());
    let builder = ResourceBuilder::new(registry);

    let resource = builder.build(&entry("p1", "blogPost")).unwrap();
    assert!(resource.is::<Author>());
}

#[test]
fn test_model_errors_propagate() {
    #[derive(Debug)]
    struct Strict(Entry);

    impl EntryModel for Strict {
        const CONTENT_TYPE_ID: &'static str = "strict";

        fn from_entry(entry: Entry) -> Result<Self> {
            if entry.field("title", "en-US").is_none() {
                return Err(Error::InvalidShape {
                    subject: entry.id().unwrap_or("entry").to_string(),
                    tag: "strict".to_string(),
                    reason: "missing title".to_string(),
                });
            }
            Ok(Strict(entry))
        }

        fn entry(&self) -> &Entry {
            &self.0
        }

        fn entry_mut(&mut self) -> &mut Entry {
            &mut self.0
        }
    }

    let mut registry = TypeRegistry::with_defaults();
    registry.register_entry_router(ContentTypeRouter::new().route_model::<Strict>());
    let builder = ResourceBuilder::new(registry);

    let err = builder.build(&entry("s1", "strict")).unwrap_err();
    assert!(err.to_string().contains("missing title"));
}

#[test]
fn test_custom_mapper_closure() {
    let mut registry = TypeRegistry::new();
    registry.register(
        "Space",
        mapper_fn(|raw, cx| {
            let mut space = cma_core::hydrate::<Space>(raw, cx)?;
            space.set_name(space.name().to_uppercase());
            Ok(Box::new(space))
        }),
    );
    let builder = ResourceBuilder::new(registry);
    let space: Space = builder
        .build_as(&json!({"sys": {"type": "Space", "id": "s"}, "name": "blog"}), None)
        .unwrap();
    assert_eq!(space.name(), "BLOG");
}

// ============================================================================
// Collections
// ============================================================================

#[test]
fn test_collection_fails_on_unknown_item() {
    let builder = routed_builder();
    let mut items: Vec<Value> = (0..5).map(|i| entry(&format!("e{i}"), "author")).collect();
    items[2] = json!({"sys": {"type": "Snippet", "id": "e2"}});
    let raw = json!({"sys": {"type": "Array"}, "items": items, "total": 5, "skip": 0, "limit": 5});

    match builder.build_collection(&raw) {
        Err(Error::UnknownType { type_tag }) => assert_eq!(type_tag, "Snippet"),
        other => panic!("expected UnknownType, got {:?}", other),
    }
}

#[test]
fn test_collection_mixes_models_in_order() {
    let builder = routed_builder();
    let raw = json!({
        "items": [entry("a", "author"), entry("b", "blogPost"), entry("c", "recipe")],
        "total": 3, "skip": 0, "limit": 100
    });
    let collection = builder.build_collection(&raw).unwrap();
    let items = collection.into_items();
    assert!(items[0].is::<Author>());
    assert!(items[1].is::<BlogPost>());
    assert!(items[2].is::<Entry>());
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_identity_equality() {
    let builder = routed_builder();
    let first = builder.build(&entry("a1", "author")).unwrap();
    let second = builder.build(&entry("a1", "author")).unwrap();
    let other = builder.build(&entry("a2", "author")).unwrap();

    assert!(*first == *second);
    assert!(*first != *other);
    assert_eq!(first.as_link().unwrap().to_string(), "Entry:a1");

    let unsaved: Box<dyn Resource> = Box::new(Entry::new("author"));
    let unsaved_too: Box<dyn Resource> = Box::new(Entry::new("author"));
    assert!(*unsaved != *unsaved_too);
    assert!(unsaved.as_link().is_none());
}

// ============================================================================
// Properties
// ============================================================================

const FIELD_TYPES: &[&str] = &[
    "Symbol", "Text", "Boolean", "Date", "Integer", "Number", "Location", "Object", "RichText",
];

const FLAGS: [&str; 4] = ["required", "localized", "disabled", "omitted"];

proptest! {
    #[test]
    fn prop_absent_flags_serialize_as_false(
        tag in prop::sample::select(FIELD_TYPES),
        present in prop::collection::vec(any::<Option<bool>>(), 4),
    ) {
        let mut raw = json!({"id": "f", "name": "F", "type": tag});
        for (flag, value) in FLAGS.iter().zip(&present) {
            if let Some(value) = value {
                raw[*flag] = json!(value);
            }
        }
        let field = FieldFactory::default()
            .build(&raw, &ValidationFactory::default())
            .unwrap();
        let out = field.to_value();
        for (flag, value) in FLAGS.iter().zip(&present) {
            prop_assert_eq!(&out[*flag], &json!(value.unwrap_or(false)));
        }
        prop_assert_eq!(out["type"].as_str(), Some(tag));
    }

    #[test]
    fn prop_dispatch_is_deterministic(
        content_type in prop::sample::select(&["author", "blogPost", "recipe", "other"][..]),
        id in "[a-z0-9]{1,12}",
    ) {
        let builder = routed_builder();
        let raw = entry(&id, content_type);
        let first = builder.build(&raw).unwrap();
        let second = builder.build(&raw).unwrap();
        prop_assert_eq!(first.is::<Author>(), second.is::<Author>());
        prop_assert_eq!(first.is::<BlogPost>(), second.is::<BlogPost>());
        prop_assert_eq!(first.is::<Entry>(), second.is::<Entry>());
        prop_assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        prop_assert!(*first == *second);
    }
}
