//! Resource kinds and the [`Resource`] trait they share.
//!
//! Every API object the SDK understands implements [`Resource`]: it knows its
//! system type tag, carries its [`SystemProperties`] once the server has
//! assigned them, and can serialize itself in two forms:
//!
//! - [`Resource::to_json`], the full representation including `sys`
//! - [`Resource::as_request_body`], the slimmed form sent on create/update
//!
//! Dispatch hands out `Box<dyn Resource>`; use [`downcast_ref`](trait.Resource.html#method.downcast_ref)
//! or [`downcast`] to get at the concrete type.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::Result;
use crate::error::Error;
use crate::traits::ApiClient;
use crate::types::{Link, ResourceIdentity, SystemProperties};

/// The back-reference a hydrated resource keeps to the client that produced it.
pub type ClientRef = Arc<dyn ApiClient>;

/// Implements the `Any` plumbing and in-place refresh for a concrete resource.
macro_rules! resource_plumbing {
    () => {
        fn refresh_from(
            &mut self,
            fresh: Box<dyn $crate::resource::Resource>,
        ) -> $crate::Result<()> {
            $crate::hydrate::replace(self, fresh)
        }

        fn as_dyn(&self) -> &dyn $crate::resource::Resource {
            self
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }

        fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any> {
            self
        }
    };
}

mod asset;
mod content_type;
mod entry;
mod environment;
mod locale;
mod role;
mod space;
mod webhook;

pub use asset::{Asset, AssetFile};
pub use content_type::ContentType;
pub use entry::{Entry, EntryModel, LocalizedFields};
pub use environment::Environment;
pub use locale::Locale;
pub use role::{Actions, Effect, Policy, Role};
pub use space::Space;
pub use webhook::{WebhookDefinition, WebhookHeader};

/// An action a resource can ask the API to perform on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResourceAction {
    Publish,
    Unpublish,
    Archive,
    Unarchive,
    /// Process an asset's uploaded file for one locale.
    Process { locale: String },
}

impl ResourceAction {
    pub fn name(&self) -> &'static str {
        match self {
            ResourceAction::Publish => "publish",
            ResourceAction::Unpublish => "unpublish",
            ResourceAction::Archive => "archive",
            ResourceAction::Unarchive => "unarchive",
            ResourceAction::Process { .. } => "process",
        }
    }
}

impl fmt::Display for ResourceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An API object with identity, serialization forms and a client back-reference.
pub trait Resource: fmt::Debug + Send + Sync + 'static {
    /// The system type tag this resource is registered under.
    fn type_tag(&self) -> &'static str;

    /// Server-assigned bookkeeping; `None` until the resource is first saved.
    fn system_properties(&self) -> Option<&SystemProperties>;

    /// The client this resource was hydrated by, if any.
    fn client(&self) -> Option<&ClientRef>;

    fn attach_client(&mut self, client: ClientRef);

    /// Full representation, including `sys`.
    fn to_json(&self) -> Result<Value>;

    /// Body sent on create/update. Never includes `sys`.
    fn as_request_body(&self) -> Result<Value> {
        let mut body = self.to_json()?;
        if let Value::Object(ref mut map) = body {
            map.remove("sys");
        }
        Ok(body)
    }

    /// Content type id for entries; the transport sends it when creating.
    fn content_type_id(&self) -> Option<&str> {
        None
    }

    fn supports(&self, action: &ResourceAction) -> bool {
        let _ = action;
        false
    }

    /// Replace this resource's data with a freshly hydrated copy of the same type.
    ///
    /// The object itself stays where it is; the client back-reference is kept
    /// when the fresh copy has none.
    fn refresh_from(&mut self, fresh: Box<dyn Resource>) -> Result<()>;

    fn as_dyn(&self) -> &dyn Resource;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn id(&self) -> Option<&str> {
        self.system_properties()?.id()
    }

    fn version(&self) -> Option<u64> {
        self.system_properties()?.version()
    }

    /// Logical identity: type tag, id, and owning space/environment.
    fn identity(&self) -> Option<ResourceIdentity> {
        self.system_properties()?.identity()
    }

    /// A link to this resource, for the transport's fetch-by-link calls.
    fn as_link(&self) -> Option<Link> {
        self.identity().map(|identity| identity.to_link())
    }
}

impl dyn Resource {
    pub fn is<T: Resource>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Resource>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    pub fn downcast_mut<T: Resource>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

/// Resources compare by identity, never by address or field data.
///
/// Resources without an id (not yet saved) are never equal to anything.
impl PartialEq for dyn Resource {
    fn eq(&self, other: &Self) -> bool {
        match (self.identity(), other.identity()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

/// Unbox a resource into its concrete type.
///
/// # Errors
///
/// Returns [`Error::TypeMismatch`] if the resource is of another type.
pub fn downcast<T: Resource>(resource: Box<dyn Resource>) -> Result<T> {
    let found = resource.type_tag();
    resource
        .into_any()
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| Error::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            found: found.to_string(),
        })
}

/// Returns the client back-reference or a [`Error::Detached`] error.
pub(crate) fn attached_client<R: Resource + ?Sized>(resource: &R) -> Result<ClientRef> {
    resource.client().cloned().ok_or_else(|| Error::Detached {
        type_tag: resource.type_tag().to_string(),
    })
}
