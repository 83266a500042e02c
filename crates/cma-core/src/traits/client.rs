//! The client a hydrated resource calls back into.

use async_trait::async_trait;

use crate::Result;
use crate::resource::{Resource, ResourceAction};
use crate::types::Link;

/// The API surface resources use to act on themselves.
///
/// Implemented by the HTTP transport. Every call that returns a resource
/// returns a freshly hydrated copy, already attached to this client.
#[async_trait]
pub trait ApiClient: std::fmt::Debug + Send + Sync {
    /// Fetch the resource a link points at.
    async fn resolve_link(&self, link: &Link) -> Result<Box<dyn Resource>>;

    /// Create a resource that has no id yet.
    async fn create(&self, resource: &dyn Resource) -> Result<Box<dyn Resource>>;

    /// Update a resource at its current version.
    async fn update(&self, resource: &dyn Resource) -> Result<Box<dyn Resource>>;

    /// Delete a resource.
    async fn delete(&self, resource: &dyn Resource) -> Result<()>;

    /// Perform a lifecycle action (publish, archive, ...) on a resource.
    async fn perform(
        &self,
        resource: &dyn Resource,
        action: &ResourceAction,
    ) -> Result<Box<dyn Resource>>;
}
