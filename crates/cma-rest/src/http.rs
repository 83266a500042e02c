//! HTTP client for the management API.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument, trace};

use cma_core::Result;
use cma_core::error::{Error, InvalidInputError, ProtocolError, TransportError};

use crate::config::{BaseUrl, ClientConfig};
use crate::query::Query;

/// Media type of every request body.
pub const MANAGEMENT_MEDIA_TYPE: &str = "application/vnd.contentful.management.v1+json";

const VERSION_HEADER: HeaderName = HeaderName::from_static("x-contentful-version");
const CONTENT_TYPE_HEADER: HeaderName = HeaderName::from_static("x-contentful-content-type");

/// Per-request headers for writes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WriteHeaders {
    /// Sent as `X-Contentful-Version`; the server rejects stale versions.
    pub version: Option<u64>,
    /// Sent as `X-Contentful-Content-Type` when creating entries.
    pub content_type: Option<String>,
}

impl WriteHeaders {
    pub fn version(version: u64) -> Self {
        Self {
            version: Some(version),
            ..Self::default()
        }
    }

    pub fn content_type(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            ..Self::default()
        }
    }
}

/// Error body returned by the API.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    #[serde(default)]
    sys: Option<ErrorSys>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorSys {
    #[serde(default)]
    id: Option<String>,
}

/// Authenticated JSON client bound to one base URL.
///
/// Responses are returned as raw JSON; turning them into resources is the
/// management client's job.
#[derive(Debug, Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: BaseUrl,
    auth: HeaderValue,
}

impl RestClient {
    /// Create a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError`] if the access token is not a valid
    /// header value, and a transport error if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.access_token()))
            .map_err(|_| InvalidInputError::Other {
                message: "access token contains invalid header characters".to_string(),
            })?;
        auth.set_sensitive(true);

        let mut builder = reqwest::Client::builder().user_agent(config.user_agent());
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(transport_error)?;

        Ok(Self {
            client,
            base_url: config.base_url().clone(),
            auth,
        })
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    pub async fn get(&self, path: &str) -> Result<Value> {
        debug!(path, "GET");
        self.send(self.request(Method::GET, path)).await
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    pub async fn get_query(&self, path: &str, query: &Query) -> Result<Value> {
        debug!(path, "GET with query");
        trace!(?query, "query parameters");
        self.send(self.request(Method::GET, path).query(query.pairs()))
            .await
    }

    #[instrument(skip(self, body), fields(base = %self.base_url))]
    pub async fn post(&self, path: &str, body: &Value, headers: &WriteHeaders) -> Result<Value> {
        debug!(path, "POST");
        self.send(self.write(Method::POST, path, headers).json(body))
            .await
    }

    /// PUT with an optional body. Action endpoints take no body.
    #[instrument(skip(self, body), fields(base = %self.base_url))]
    pub async fn put(
        &self,
        path: &str,
        body: Option<&Value>,
        headers: &WriteHeaders,
    ) -> Result<Value> {
        debug!(path, "PUT");
        let mut request = self.write(Method::PUT, path, headers);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send(request).await
    }

    #[instrument(skip(self), fields(base = %self.base_url))]
    pub async fn delete(&self, path: &str, headers: &WriteHeaders) -> Result<Value> {
        debug!(path, "DELETE");
        self.send(self.write(Method::DELETE, path, headers)).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.base_url.join(path))
            .header(AUTHORIZATION, self.auth.clone())
    }

    fn write(&self, method: Method, path: &str, headers: &WriteHeaders) -> RequestBuilder {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static(MANAGEMENT_MEDIA_TYPE));
        if let Some(version) = headers.version {
            map.insert(VERSION_HEADER, HeaderValue::from(version));
        }
        if let Some(ref content_type) = headers.content_type {
            if let Ok(value) = HeaderValue::from_str(content_type) {
                map.insert(CONTENT_TYPE_HEADER, value);
            }
        }
        self.request(method, path).headers(map)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        trace!(status = %status, "response");

        if !status.is_success() {
            return Err(Error::Protocol(parse_error_response(response).await));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Null);
        }
        let bytes = response.bytes().await.map_err(transport_error)?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| {
            Error::Transport(TransportError::Decode {
                message: e.to_string(),
            })
        })
    }
}

async fn parse_error_response(response: reqwest::Response) -> ProtocolError {
    let status = response.status().as_u16();
    match response.json::<ErrorBody>().await {
        Ok(body) => ProtocolError::new(status, body.sys.and_then(|s| s.id), body.message)
            .with_request_id(body.request_id),
        Err(_) => ProtocolError::new(status, None, None),
    }
}

/// Map a `reqwest` failure onto the transport error taxonomy.
pub(crate) fn transport_error(err: reqwest::Error) -> Error {
    let transport = if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else if err.is_decode() {
        TransportError::Decode {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    };
    Error::Transport(transport)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_creation() {
        let config = ClientConfig::new("token", "space");
        let client = RestClient::new(&config).unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.contentful.com/");
    }

    #[test]
    fn rejects_token_with_newline() {
        let config = ClientConfig::new("bad\ntoken", "space");
        let err = RestClient::new(&config).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn write_headers_constructors() {
        assert_eq!(WriteHeaders::version(3).version, Some(3));
        assert_eq!(
            WriteHeaders::content_type("cat").content_type.as_deref(),
            Some("cat")
        );
    }
}
