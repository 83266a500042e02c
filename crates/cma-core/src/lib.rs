//! cma-core - Resource model, type registry and hydration for the cma
//! content management SDK.
//!
//! Raw API payloads are dispatched on their `sys.type` through a
//! [`TypeRegistry`] and hydrated into concrete [`Resource`] values by a
//! [`ResourceBuilder`]. Content type schemas are assembled from the
//! [`FieldFactory`], [`ValidationFactory`] and [`ConstraintFactory`]
//! tables, each of which can be extended with new keys.
//!
//! This crate does no I/O. Hydrated resources keep a [`ClientRef`] back to
//! the transport that produced them, which is what [`ResourceActions`] uses
//! to save, publish and delete.

pub mod builder;
pub mod constraint;
pub mod error;
pub mod hydrate;
pub mod registry;
pub mod resource;
pub mod schema;
pub mod traits;
pub mod types;

pub use builder::{MapContext, ResourceBuilder, ResourceCollection};
pub use constraint::{Constraint, ConstraintContext, ConstraintFactory, ConstraintKind};
pub use error::{Error, InvalidInputError, ProtocolError, TransportError};
pub use hydrate::{Hydrate, hydrate};
pub use registry::{
    ContentTypeRouter, Mapper, MapperRef, Matcher, TypeRegistry, mapper_fn, mapper_for,
};
pub use resource::{
    Actions, Asset, AssetFile, ClientRef, ContentType, Effect, Entry, EntryModel, Environment,
    Locale, LocalizedFields, Policy, Resource, ResourceAction, Role, Space, WebhookDefinition,
    WebhookHeader, downcast,
};
pub use schema::{
    ArrayItems, Bounds, FieldDefinition, FieldFactory, FieldKind, ItemType, LinkType, StringList,
    Validation, ValidationFactory, ValidationKind, ValidationRule,
};
pub use traits::{ApiClient, ResourceActions};
pub use types::{Link, ResourceIdentity, SystemProperties};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
