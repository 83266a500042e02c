//! Type registry: maps a payload's `sys.type` to the mapper that builds it.
//!
//! Plain mappings are a fixed table from type tag to [`Mapper`]. Contextual
//! mappings are predicates over the whole payload that may pick a more
//! specific mapper, such as a user model for entries of one content type.
//! They are consulted first, on every lookup; a contextual match is never
//! cached because the same tag can resolve differently per payload.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;
use tracing::trace;

use crate::Result;
use crate::builder::MapContext;
use crate::error::Error;
use crate::hydrate::{Hydrate, hydrate, subject};
use crate::resource::{
    Asset, ContentType, Entry, EntryModel, Environment, Locale, Resource, Role, Space,
    WebhookDefinition,
};

/// Builds one resource from a raw payload.
pub trait Mapper: Send + Sync {
    fn map(&self, raw: &Value, cx: &MapContext<'_>) -> Result<Box<dyn Resource>>;

    /// Name of the type this mapper produces, for logs and `Debug`.
    fn target(&self) -> &str {
        std::any::type_name::<Self>()
    }
}

pub type MapperRef = Arc<dyn Mapper>;

/// A contextual predicate: inspects a payload and optionally picks a mapper.
pub type Matcher = Arc<dyn Fn(&Value) -> Option<MapperRef> + Send + Sync>;

/// Maps payloads through a type's [`Hydrate`] impl.
pub struct HydrateMapper<T>(PhantomData<fn() -> T>);

impl<T: Hydrate> Mapper for HydrateMapper<T> {
    fn map(&self, raw: &Value, cx: &MapContext<'_>) -> Result<Box<dyn Resource>> {
        Ok(Box::new(hydrate::<T>(raw, cx)?))
    }

    fn target(&self) -> &str {
        std::any::type_name::<T>()
    }
}

/// The mapper for a hydratable type.
pub fn mapper_for<T: Hydrate>() -> MapperRef {
    Arc::new(HydrateMapper::<T>(PhantomData))
}

/// Adapts a closure into a [`Mapper`].
pub struct FnMapper<F>(F);

impl<F> Mapper for FnMapper<F>
where
    F: Fn(&Value, &MapContext<'_>) -> Result<Box<dyn Resource>> + Send + Sync,
{
    fn map(&self, raw: &Value, cx: &MapContext<'_>) -> Result<Box<dyn Resource>> {
        (self.0)(raw, cx)
    }
}

/// A mapper from a closure.
pub fn mapper_fn<F>(f: F) -> MapperRef
where
    F: Fn(&Value, &MapContext<'_>) -> Result<Box<dyn Resource>> + Send + Sync + 'static,
{
    Arc::new(FnMapper(f))
}

/// Table of plain and contextual mappings, keyed by system type tag.
#[derive(Clone)]
pub struct TypeRegistry {
    mappers: HashMap<String, MapperRef>,
    contextual: HashMap<String, Matcher>,
}

impl TypeRegistry {
    /// An empty registry. See [`TypeRegistry::with_defaults`] for the standard set.
    pub fn new() -> Self {
        Self {
            mappers: HashMap::new(),
            contextual: HashMap::new(),
        }
    }

    /// A registry with every built-in resource kind registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("Space", mapper_for::<Space>());
        registry.register("Environment", mapper_for::<Environment>());
        registry.register("Locale", mapper_for::<Locale>());
        registry.register("ContentType", mapper_for::<ContentType>());
        registry.register("Entry", mapper_for::<Entry>());
        registry.register("Asset", mapper_for::<Asset>());
        registry.register("Role", mapper_for::<Role>());
        registry.register("WebhookDefinition", mapper_for::<WebhookDefinition>());
        registry
    }

    /// Register a plain mapping. A later registration for the same tag wins.
    pub fn register(&mut self, type_tag: impl Into<String>, mapper: MapperRef) {
        self.mappers.insert(type_tag.into(), mapper);
    }

    /// Register a contextual mapping, replacing any earlier one for the tag.
    ///
    /// The matcher runs on every payload with this tag. When it returns
    /// `None` the plain mapping applies.
    pub fn register_contextual<F>(&mut self, type_tag: impl Into<String>, matcher: F)
    where
        F: Fn(&Value) -> Option<MapperRef> + Send + Sync + 'static,
    {
        self.contextual.insert(type_tag.into(), Arc::new(matcher));
    }

    /// Route entries to per-content-type mappers.
    pub fn register_entry_router(&mut self, router: ContentTypeRouter) {
        self.register_contextual("Entry", router.into_matcher());
    }

    /// Remove both the plain and the contextual mapping for a tag.
    pub fn unregister(&mut self, type_tag: &str) {
        self.mappers.remove(type_tag);
        self.contextual.remove(type_tag);
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.mappers.contains_key(type_tag) || self.contextual.contains_key(type_tag)
    }

    /// Pick the mapper for a payload.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidShape`] if the payload has no string `sys.type`,
    /// and [`Error::UnknownType`] if nothing is registered for the tag.
    pub fn resolve(&self, raw: &Value) -> Result<MapperRef> {
        let type_tag = type_tag_of(raw)?;
        if let Some(matcher) = self.contextual.get(type_tag) {
            if let Some(mapper) = matcher(raw) {
                trace!(type_tag, target = mapper.target(), "contextual mapping matched");
                return Ok(mapper);
            }
        }
        self.mappers
            .get(type_tag)
            .cloned()
            .ok_or_else(|| Error::UnknownType {
                type_tag: type_tag.to_string(),
            })
    }
}

impl Default for TypeRegistry {
    /// Same as [`TypeRegistry::with_defaults`].
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut mappers: Vec<(&String, &str)> = self
            .mappers
            .iter()
            .map(|(tag, mapper)| (tag, mapper.target()))
            .collect();
        mappers.sort();
        let mut contextual: Vec<&String> = self.contextual.keys().collect();
        contextual.sort();
        f.debug_struct("TypeRegistry")
            .field("mappers", &mappers)
            .field("contextual", &contextual)
            .finish()
    }
}

/// Returns a payload's `sys.type`.
pub fn type_tag_of(raw: &Value) -> Result<&str> {
    raw.pointer("/sys/type")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::invalid_shape(subject(raw), "resource", "missing sys.type"))
}

/// Contextual mapping for entries, keyed by content type id.
#[derive(Clone, Default)]
pub struct ContentTypeRouter {
    routes: HashMap<String, MapperRef>,
}

impl ContentTypeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map entries of one content type with `mapper`.
    pub fn route(mut self, content_type_id: impl Into<String>, mapper: MapperRef) -> Self {
        self.routes.insert(content_type_id.into(), mapper);
        self
    }

    /// Map entries of `T::CONTENT_TYPE_ID` to `T`.
    pub fn route_model<T: EntryModel>(self) -> Self {
        self.route(T::CONTENT_TYPE_ID, mapper_for::<T>())
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn into_matcher(self) -> impl Fn(&Value) -> Option<MapperRef> + Send + Sync + 'static {
        move |raw: &Value| {
            let id = raw.pointer("/sys/contentType/sys/id")?.as_str()?;
            self.routes.get(id).cloned()
        }
    }
}

impl fmt::Debug for ContentTypeRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut routes: Vec<&String> = self.routes.keys().collect();
        routes.sort();
        f.debug_struct("ContentTypeRouter")
            .field("routes", &routes)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_sys_type_is_a_shape_error() {
        let registry = TypeRegistry::with_defaults();
        let err = registry.resolve(&json!({"sys": {"id": "x"}})).err();
        assert!(matches!(err, Some(Error::InvalidShape { .. })));
        let err = registry.resolve(&json!({"sys": {"type": 3}})).err();
        assert!(matches!(err, Some(Error::InvalidShape { .. })));
    }

    #[test]
    fn unknown_tag_is_reported() {
        let registry = TypeRegistry::with_defaults();
        let err = registry.resolve(&json!({"sys": {"type": "Upload"}})).err();
        match err {
            Some(Error::UnknownType { type_tag }) => assert_eq!(type_tag, "Upload"),
            other => panic!("expected UnknownType, got {:?}", other),
        }
    }

    #[test]
    fn empty_registry_knows_nothing() {
        let registry = TypeRegistry::new();
        assert!(!registry.contains("Entry"));
        assert!(registry.resolve(&json!({"sys": {"type": "Entry"}})).is_err());
    }

    #[test]
    fn defaults_cover_builtin_kinds() {
        let registry = TypeRegistry::default();
        for tag in [
            "Space",
            "Environment",
            "Locale",
            "ContentType",
            "Entry",
            "Asset",
            "Role",
            "WebhookDefinition",
        ] {
            assert!(registry.contains(tag), "missing {tag}");
        }
    }

    #[test]
    fn later_registration_wins() {
        let mut registry = TypeRegistry::new();
        registry.register("Space", mapper_for::<Space>());
        registry.register("Space", mapper_for::<Environment>());
        let mapper = registry.resolve(&json!({"sys": {"type": "Space"}})).unwrap();
        assert!(mapper.target().ends_with("Environment"));
    }

    #[test]
    fn contextual_none_falls_back_to_plain() {
        let mut registry = TypeRegistry::with_defaults();
        registry.register_contextual("Entry", |_raw: &Value| None);
        let mapper = registry
            .resolve(&json!({"sys": {"type": "Entry"}}))
            .unwrap();
        assert!(mapper.target().ends_with("Entry"));
    }

    #[test]
    fn unregister_removes_both_mappings() {
        let mut registry = TypeRegistry::with_defaults();
        registry.register_entry_router(ContentTypeRouter::new());
        registry.unregister("Entry");
        assert!(!registry.contains("Entry"));
    }
}
