//! Lifecycle actions available on any attached resource.

use async_trait::async_trait;
use tracing::debug;

use crate::Result;
use crate::error::Error;
use crate::resource::{Resource, ResourceAction, attached_client};
use crate::types::Link;

/// Save, publish, archive and delete a resource through its client back-reference.
///
/// Every mutating call replaces the resource's data in place with the
/// server's response, so the caller's handle stays valid and sees the new
/// `sys.version`.
///
/// # Errors
///
/// All methods fail with [`Error::Detached`] when the resource was not
/// hydrated by a client, and lifecycle methods fail with
/// [`Error::UnsupportedAction`] when the resource kind does not offer them.
#[async_trait]
pub trait ResourceActions: Resource {
    /// Create the resource if it has no id yet, otherwise update it.
    async fn save(&mut self) -> Result<()> {
        let client = attached_client(self)?;
        let fresh = if self.id().is_some() {
            debug!(type_tag = self.type_tag(), id = ?self.id(), "updating resource");
            client.update(self.as_dyn()).await?
        } else {
            debug!(type_tag = self.type_tag(), "creating resource");
            client.create(self.as_dyn()).await?
        };
        self.refresh_from(fresh)
    }

    async fn publish(&mut self) -> Result<()> {
        self.perform(ResourceAction::Publish).await
    }

    async fn unpublish(&mut self) -> Result<()> {
        self.perform(ResourceAction::Unpublish).await
    }

    async fn archive(&mut self) -> Result<()> {
        self.perform(ResourceAction::Archive).await
    }

    async fn unarchive(&mut self) -> Result<()> {
        self.perform(ResourceAction::Unarchive).await
    }

    /// Ask the API to process an asset's uploaded file for one locale.
    async fn process(&mut self, locale: &str) -> Result<()> {
        self.perform(ResourceAction::Process {
            locale: locale.to_string(),
        })
        .await
    }

    /// Perform an action and refresh the resource from the response.
    async fn perform(&mut self, action: ResourceAction) -> Result<()> {
        let client = attached_client(self)?;
        if !self.supports(&action) {
            return Err(Error::UnsupportedAction {
                action: action.to_string(),
                type_tag: self.type_tag().to_string(),
            });
        }
        require_id(self)?;
        debug!(type_tag = self.type_tag(), id = ?self.id(), %action, "performing action");
        let fresh = client.perform(self.as_dyn(), &action).await?;
        self.refresh_from(fresh)
    }

    /// Delete the resource on the server. The local value is left untouched.
    async fn delete(&self) -> Result<()> {
        let client = attached_client(self)?;
        require_id(self)?;
        debug!(type_tag = self.type_tag(), id = ?self.id(), "deleting resource");
        client.delete(self.as_dyn()).await
    }

    /// Fetch the resource a link points at, through this resource's client.
    async fn resolve(&self, link: &Link) -> Result<Box<dyn Resource>> {
        let client = attached_client(self)?;
        client.resolve_link(link).await
    }
}

impl<T: Resource + ?Sized> ResourceActions for T {}

fn require_id<R: Resource + ?Sized>(resource: &R) -> Result<()> {
    match resource.id() {
        Some(_) => Ok(()),
        None => Err(Error::MissingSystemProperty {
            type_tag: resource.type_tag().to_string(),
            property: "id",
        }),
    }
}
