//! Resource builder: dispatches raw payloads and collections.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::Result;
use crate::constraint::ConstraintFactory;
use crate::error::Error;
use crate::hydrate::subject;
use crate::registry::{TypeRegistry, type_tag_of};
use crate::resource::{ClientRef, Resource, downcast};
use crate::schema::{FieldFactory, ValidationFactory};

/// What a mapper can see while building one resource.
#[derive(Clone, Copy, Debug)]
pub struct MapContext<'a> {
    fields: &'a FieldFactory,
    validations: &'a ValidationFactory,
    constraints: &'a ConstraintFactory,
    client: Option<&'a ClientRef>,
}

impl<'a> MapContext<'a> {
    pub fn fields(&self) -> &'a FieldFactory {
        self.fields
    }

    pub fn validations(&self) -> &'a ValidationFactory {
        self.validations
    }

    pub fn constraints(&self) -> &'a ConstraintFactory {
        self.constraints
    }

    /// The client newly built resources get attached to.
    pub fn client(&self) -> Option<&'a ClientRef> {
        self.client
    }
}

/// Builds resources from raw API payloads.
///
/// Owns the type registry and the three schema factories. A builder is
/// cheap to clone and is normally configured once, then shared.
#[derive(Clone, Debug, Default)]
pub struct ResourceBuilder {
    registry: TypeRegistry,
    fields: FieldFactory,
    validations: ValidationFactory,
    constraints: ConstraintFactory,
}

impl ResourceBuilder {
    /// A builder over `registry` with the default schema factories.
    pub fn new(registry: TypeRegistry) -> Self {
        Self {
            registry,
            ..Self::default()
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    pub fn fields_mut(&mut self) -> &mut FieldFactory {
        &mut self.fields
    }

    pub fn validations_mut(&mut self) -> &mut ValidationFactory {
        &mut self.validations
    }

    pub fn constraints_mut(&mut self) -> &mut ConstraintFactory {
        &mut self.constraints
    }

    pub fn context<'a>(&'a self, client: Option<&'a ClientRef>) -> MapContext<'a> {
        MapContext {
            fields: &self.fields,
            validations: &self.validations,
            constraints: &self.constraints,
            client,
        }
    }

    /// Build a detached resource from a payload.
    pub fn build(&self, raw: &Value) -> Result<Box<dyn Resource>> {
        self.build_for(raw, None)
    }

    /// Build a resource and attach it to `client`.
    pub fn build_for(&self, raw: &Value, client: Option<&ClientRef>) -> Result<Box<dyn Resource>> {
        let mapper = self.registry.resolve(raw)?;
        mapper.map(raw, &self.context(client))
    }

    /// Build a resource and unbox it as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TypeMismatch`] if the payload maps to another type.
    pub fn build_as<T: Resource>(&self, raw: &Value, client: Option<&ClientRef>) -> Result<T> {
        downcast(self.build_for(raw, client)?)
    }

    /// Replace `existing`'s data with a payload of the same type.
    ///
    /// The payload is fully built before anything is touched, so on error
    /// `existing` is unchanged. Its client is kept.
    pub fn refresh(&self, existing: &mut dyn Resource, raw: &Value) -> Result<()> {
        let fresh = self.build_for(raw, existing.client())?;
        existing.refresh_from(fresh)
    }

    /// Build a collection envelope. Fails as a whole if any item fails.
    pub fn build_collection(&self, raw: &Value) -> Result<ResourceCollection> {
        self.build_collection_for(raw, None)
    }

    #[instrument(skip_all)]
    pub fn build_collection_for(
        &self,
        raw: &Value,
        client: Option<&ClientRef>,
    ) -> Result<ResourceCollection> {
        let obj = raw
            .as_object()
            .ok_or_else(|| Error::malformed_collection("envelope must be a JSON object"))?;
        let items = obj
            .get("items")
            .ok_or_else(|| Error::malformed_collection("missing 'items'"))?
            .as_array()
            .ok_or_else(|| Error::malformed_collection("'items' must be an array"))?;
        let total = counter(raw, "total")?;
        let skip = counter(raw, "skip")?;
        let limit = counter(raw, "limit")?;

        let built = items
            .iter()
            .map(|item| {
                self.build_for(item, client).inspect_err(|e| {
                    debug!(item = %subject(item), error = %e, "collection item failed to build");
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(
            count = built.len(),
            total,
            tag = ?items.first().and_then(|item| type_tag_of(item).ok()),
            "built collection"
        );
        Ok(ResourceCollection {
            items: built,
            total,
            skip,
            limit,
        })
    }
}

fn counter(raw: &Value, key: &str) -> Result<u64> {
    raw.get(key)
        .ok_or_else(|| Error::malformed_collection(format!("missing '{key}'")))?
        .as_u64()
        .ok_or_else(|| Error::malformed_collection(format!("'{key}' must be a non-negative integer")))
}

/// One page of resources with its pagination counters.
#[derive(Debug)]
pub struct ResourceCollection {
    items: Vec<Box<dyn Resource>>,
    total: u64,
    skip: u64,
    limit: u64,
}

impl ResourceCollection {
    pub fn items(&self) -> &[Box<dyn Resource>] {
        &self.items
    }

    /// Total number of matching resources on the server, across all pages.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn skip(&self) -> u64 {
        self.skip
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns true if pages remain after this one.
    pub fn has_more(&self) -> bool {
        self.skip.saturating_add(self.items.len() as u64) < self.total
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Box<dyn Resource>> {
        self.items.iter()
    }

    pub fn into_items(self) -> Vec<Box<dyn Resource>> {
        self.items
    }
}

impl IntoIterator for ResourceCollection {
    type Item = Box<dyn Resource>;
    type IntoIter = std::vec::IntoIter<Box<dyn Resource>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResourceCollection {
    type Item = &'a Box<dyn Resource>;
    type IntoIter = std::slice::Iter<'a, Box<dyn Resource>>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
