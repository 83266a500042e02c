//! Management API client.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, trace};

use cma_core::error::Error;
use cma_core::{
    ApiClient, Asset, ClientRef, ContentType, Environment, Link, Resource, ResourceAction,
    ResourceBuilder, ResourceCollection, Result, Space, downcast,
};

use crate::config::ClientConfig;
use crate::endpoints::Endpoints;
use crate::http::{RestClient, WriteHeaders};
use crate::query::Query;
use crate::stream::ResourceStream;

/// Client for one space and environment of the management API.
///
/// Cloning is cheap; clones share the HTTP connection pool and the
/// resource builder. Every resource it returns is attached to it, so
/// `save`, `publish` and friends work without passing the client around.
///
/// ```no_run
/// use cma_core::ResourceActions;
/// use cma_rest::{ClientConfig, ManagementClient};
///
/// # async fn run() -> cma_core::Result<()> {
/// let client = ManagementClient::new(ClientConfig::from_env()?)?;
/// let mut entry = client.entry("nyancat").await?;
/// entry.publish().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ManagementClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    rest: RestClient,
    builder: ResourceBuilder,
    endpoints: Endpoints,
}

impl ManagementClient {
    /// Create a client that maps responses with the default registry.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Self::with_builder(config, ResourceBuilder::default())
    }

    /// Create a client that maps responses with a custom builder, e.g. one
    /// with entry models routed by content type.
    pub fn with_builder(config: ClientConfig, builder: ResourceBuilder) -> Result<Self> {
        let rest = RestClient::new(&config)?;
        let endpoints = Endpoints::new(config.space_id(), config.environment_id());
        Ok(Self {
            inner: Arc::new(ClientInner {
                rest,
                builder,
                endpoints,
            }),
        })
    }

    pub fn builder(&self) -> &ResourceBuilder {
        &self.inner.builder
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.inner.endpoints
    }

    /// This client as the back-reference resources hold.
    pub fn client_ref(&self) -> ClientRef {
        Arc::new(self.clone())
    }

    // ------------------------------------------------------------------
    // Fetching
    // ------------------------------------------------------------------

    /// Fetch one resource of any kind.
    #[instrument(skip(self))]
    pub async fn fetch(&self, type_tag: &str, id: &str) -> Result<Box<dyn Resource>> {
        let path = self.inner.endpoints.item(type_tag, id)?;
        let raw = self.inner.rest.get(&path).await?;
        self.materialize(&raw)
    }

    /// Fetch one resource and unbox it as `T`.
    pub async fn fetch_as<T: Resource>(&self, type_tag: &str, id: &str) -> Result<T> {
        downcast(self.fetch(type_tag, id).await?)
    }

    /// Fetch one page of a collection.
    #[instrument(skip(self))]
    pub async fn fetch_collection(&self, type_tag: &str, query: &Query) -> Result<ResourceCollection> {
        let path = self.inner.endpoints.collection(type_tag)?;
        self.page(&path, query).await
    }

    /// Stream every resource matching `query`, fetching pages as needed.
    ///
    /// Paging starts at the query's `skip` and advances by the size of each
    /// page until the reported total is reached.
    pub fn paginate(&self, type_tag: &str, query: Query) -> Result<ResourceStream> {
        let path = self.inner.endpoints.collection(type_tag)?;
        let client = self.clone();

        let stream = async_stream::try_stream! {
            let mut skip = query.start();
            loop {
                let page = client.page(&path, &query.clone().skip(skip)).await?;
                let fetched = page.len() as u64;
                let more = page.has_more();
                trace!(skip, fetched, total = page.total(), "fetched page");
                for resource in page {
                    yield resource;
                }
                let next = skip.saturating_add(fetched);
                if fetched == 0 || !more || next == skip {
                    break;
                }
                skip = next;
            }
        };
        Ok(ResourceStream::new(stream))
    }

    pub async fn space(&self) -> Result<Space> {
        let id = self.inner.endpoints.space_id().to_string();
        self.fetch_as("Space", &id).await
    }

    pub async fn environment(&self, id: &str) -> Result<Environment> {
        self.fetch_as("Environment", id).await
    }

    pub async fn content_type(&self, id: &str) -> Result<ContentType> {
        self.fetch_as("ContentType", id).await
    }

    pub async fn content_types(&self, query: &Query) -> Result<ResourceCollection> {
        self.fetch_collection("ContentType", query).await
    }

    /// Fetch an entry. Routed content types come back as their model type.
    pub async fn entry(&self, id: &str) -> Result<Box<dyn Resource>> {
        self.fetch("Entry", id).await
    }

    pub async fn entries(&self, query: &Query) -> Result<ResourceCollection> {
        self.fetch_collection("Entry", query).await
    }

    pub async fn asset(&self, id: &str) -> Result<Asset> {
        self.fetch_as("Asset", id).await
    }

    pub async fn assets(&self, query: &Query) -> Result<ResourceCollection> {
        self.fetch_collection("Asset", query).await
    }

    pub async fn locales(&self) -> Result<ResourceCollection> {
        self.fetch_collection("Locale", &Query::new()).await
    }

    pub async fn roles(&self) -> Result<ResourceCollection> {
        self.fetch_collection("Role", &Query::new()).await
    }

    pub async fn webhooks(&self) -> Result<ResourceCollection> {
        self.fetch_collection("WebhookDefinition", &Query::new()).await
    }

    async fn page(&self, path: &str, query: &Query) -> Result<ResourceCollection> {
        let raw = self.inner.rest.get_query(path, query).await?;
        self.inner
            .builder
            .build_collection_for(&raw, Some(&self.client_ref()))
    }

    fn materialize(&self, raw: &Value) -> Result<Box<dyn Resource>> {
        self.inner.builder.build_for(raw, Some(&self.client_ref()))
    }
}

fn require_version(resource: &dyn Resource) -> Result<u64> {
    resource.version().ok_or_else(|| Error::MissingSystemProperty {
        type_tag: resource.type_tag().to_string(),
        property: "version",
    })
}

#[async_trait]
impl ApiClient for ManagementClient {
    async fn resolve_link(&self, link: &Link) -> Result<Box<dyn Resource>> {
        debug!(%link, "resolving link");
        self.fetch(link.link_type(), link.id()).await
    }

    #[instrument(skip_all, fields(type_tag = resource.type_tag()))]
    async fn create(&self, resource: &dyn Resource) -> Result<Box<dyn Resource>> {
        let path = self.inner.endpoints.collection_for(resource)?;
        let body = resource.as_request_body()?;
        let headers = match resource.content_type_id() {
            Some(content_type) => WriteHeaders::content_type(content_type),
            None => WriteHeaders::default(),
        };
        let raw = self.inner.rest.post(&path, &body, &headers).await?;
        self.materialize(&raw)
    }

    #[instrument(skip_all, fields(type_tag = resource.type_tag(), id = ?resource.id()))]
    async fn update(&self, resource: &dyn Resource) -> Result<Box<dyn Resource>> {
        let path = self.inner.endpoints.item_for(resource)?;
        let version = require_version(resource)?;
        let body = resource.as_request_body()?;
        let raw = self
            .inner
            .rest
            .put(&path, Some(&body), &WriteHeaders::version(version))
            .await?;
        self.materialize(&raw)
    }

    #[instrument(skip_all, fields(type_tag = resource.type_tag(), id = ?resource.id()))]
    async fn delete(&self, resource: &dyn Resource) -> Result<()> {
        let path = self.inner.endpoints.item_for(resource)?;
        self.inner
            .rest
            .delete(&path, &WriteHeaders::default())
            .await?;
        Ok(())
    }

    #[instrument(skip_all, fields(type_tag = resource.type_tag(), id = ?resource.id(), action = %action))]
    async fn perform(
        &self,
        resource: &dyn Resource,
        action: &ResourceAction,
    ) -> Result<Box<dyn Resource>> {
        let path = self.inner.endpoints.action_for(resource, action)?;
        let headers = WriteHeaders::version(require_version(resource)?);
        let raw = match action {
            ResourceAction::Publish | ResourceAction::Archive | ResourceAction::Process { .. } => {
                self.inner.rest.put(&path, None, &headers).await?
            }
            ResourceAction::Unpublish | ResourceAction::Unarchive => {
                self.inner.rest.delete(&path, &headers).await?
            }
        };

        // Processing is acknowledged without a body.
        if raw.is_null() {
            debug!("action returned no body, fetching current state");
            let item = self.inner.endpoints.item_for(resource)?;
            let raw = self.inner.rest.get(&item).await?;
            return self.materialize(&raw);
        }
        self.materialize(&raw)
    }
}

impl fmt::Debug for ManagementClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagementClient")
            .field("base_url", &self.inner.rest.base_url().as_str())
            .field("space_id", &self.inner.endpoints.space_id())
            .field("environment_id", &self.inner.endpoints.environment_id())
            .finish()
    }
}
