//! cma-rest - HTTP transport for the cma content management SDK.
//!
//! [`ManagementClient`] implements [`cma_core::ApiClient`] on top of
//! `reqwest`, so resources it returns can save, publish and resolve links
//! themselves.
//!
//! ```no_run
//! use cma_rest::{ClientConfig, ManagementClient, Query};
//!
//! # async fn run() -> cma_core::Result<()> {
//! let client = ManagementClient::new(ClientConfig::new("CFPAT-token", "my-space"))?;
//! let posts = client
//!     .entries(&Query::new().content_type("blogPost").limit(10))
//!     .await?;
//! for post in &posts {
//!     println!("{:?}", post.id());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod endpoints;
pub mod http;
mod management;
pub mod query;
mod stream;

pub use config::{BaseUrl, ClientConfig, DEFAULT_BASE_URL, DEFAULT_ENVIRONMENT};
pub use endpoints::Endpoints;
pub use http::{MANAGEMENT_MEDIA_TYPE, RestClient, WriteHeaders};
pub use management::ManagementClient;
pub use query::Query;
pub use stream::ResourceStream;
