//! Client configuration.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use cma_core::Result;
use cma_core::error::{Error, InvalidInputError};

/// Default API host.
pub const DEFAULT_BASE_URL: &str = "https://api.contentful.com";

/// Environment used when none is configured.
pub const DEFAULT_ENVIRONMENT: &str = "master";

pub const ENV_ACCESS_TOKEN: &str = "CONTENTFUL_MANAGEMENT_TOKEN";
pub const ENV_SPACE_ID: &str = "CONTENTFUL_SPACE_ID";
pub const ENV_ENVIRONMENT_ID: &str = "CONTENTFUL_ENVIRONMENT_ID";
pub const ENV_BASE_URL: &str = "CONTENTFUL_BASE_URL";

/// A validated API base URL.
///
/// The URL must be absolute and use HTTPS; plain HTTP is accepted for
/// localhost only. A trailing slash is dropped.
///
/// # Example
///
/// ```
/// use cma_rest::BaseUrl;
///
/// let base = BaseUrl::new("https://api.contentful.com/").unwrap();
/// assert_eq!(base.join("/spaces/abc"), "https://api.contentful.com/spaces/abc");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BaseUrl(Url);

impl BaseUrl {
    /// Parse and validate a base URL.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::BaseUrl`] if the URL is not valid.
    pub fn new(s: impl AsRef<str>) -> Result<Self> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| invalid_base_url(s, e.to_string()))?;

        if url.cannot_be_a_base() {
            return Err(invalid_base_url(s, "must be an absolute URL"));
        }
        let Some(host) = url.host_str() else {
            return Err(invalid_base_url(s, "must have a host"));
        };
        let is_localhost = matches!(host, "localhost" | "127.0.0.1" | "[::1]");
        if url.scheme() != "https" && !(url.scheme() == "http" && is_localhost) {
            return Err(invalid_base_url(
                s,
                "must use HTTPS (HTTP allowed only for localhost)",
            ));
        }

        Ok(Self(url))
    }

    /// Returns the absolute URL for an API path such as `/spaces/abc`.
    pub fn join(&self, path: &str) -> String {
        let base = self.0.as_str().trim_end_matches('/');
        format!("{}/{}", base, path.trim_start_matches('/'))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    pub fn as_url(&self) -> &Url {
        &self.0
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str().trim_end_matches('/'))
    }
}

impl FromStr for BaseUrl {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

fn invalid_base_url(value: &str, reason: impl Into<String>) -> Error {
    InvalidInputError::BaseUrl {
        value: value.to_string(),
        reason: reason.into(),
    }
    .into()
}

/// Everything the management client needs to reach one space.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: BaseUrl,
    access_token: String,
    space_id: String,
    environment_id: String,
    user_agent: String,
    timeout: Option<Duration>,
}

impl ClientConfig {
    /// Configuration for a space on the default host and environment.
    pub fn new(access_token: impl Into<String>, space_id: impl Into<String>) -> Self {
        Self {
            base_url: BaseUrl(Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid")),
            access_token: access_token.into(),
            space_id: space_id.into(),
            environment_id: DEFAULT_ENVIRONMENT.to_string(),
            user_agent: concat!("cma-rest/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: None,
        }
    }

    /// Read configuration from the process environment.
    ///
    /// `CONTENTFUL_MANAGEMENT_TOKEN` and `CONTENTFUL_SPACE_ID` are required;
    /// `CONTENTFUL_ENVIRONMENT_ID` and `CONTENTFUL_BASE_URL` are optional.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Like [`ClientConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| InvalidInputError::Missing {
                    name: name.to_string(),
                })
        };

        let mut config = Self::new(required(ENV_ACCESS_TOKEN)?, required(ENV_SPACE_ID)?);
        if let Some(environment) = lookup(ENV_ENVIRONMENT_ID).filter(|v| !v.is_empty()) {
            config = config.with_environment(environment);
        }
        if let Some(base_url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            config = config.with_base_url(&base_url)?;
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = BaseUrl::new(base_url)?;
        Ok(self)
    }

    pub fn with_environment(mut self, environment_id: impl Into<String>) -> Self {
        self.environment_id = environment_id.into();
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Per-request timeout. Unset means no timeout beyond the OS defaults.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn space_id(&self) -> &str {
        &self.space_id
    }

    pub fn environment_id(&self) -> &str {
        &self.environment_id
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url.as_str())
            .field("access_token", &"[REDACTED]")
            .field("space_id", &self.space_id)
            .field("environment_id", &self.environment_id)
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn base_url_normalizes_trailing_slash() {
        let base = BaseUrl::new("https://api.contentful.com/").unwrap();
        assert_eq!(base.to_string(), "https://api.contentful.com");
        assert_eq!(base.join("spaces"), "https://api.contentful.com/spaces");
    }

    #[test]
    fn base_url_requires_https_off_localhost() {
        assert!(BaseUrl::new("http://api.contentful.com").is_err());
        assert!(BaseUrl::new("http://localhost:8080").is_ok());
        assert!(BaseUrl::new("http://127.0.0.1:8080").is_ok());
        assert!(BaseUrl::new("not a url").is_err());
        assert!(BaseUrl::new("mailto:ops@example.com").is_err());
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::new("token", "space");
        assert_eq!(config.base_url().to_string(), DEFAULT_BASE_URL);
        assert_eq!(config.environment_id(), "master");
        assert!(config.user_agent().starts_with("cma-rest/"));
        assert!(config.timeout().is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let config = ClientConfig::new("CFPAT-secret", "space");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("CFPAT-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn from_lookup_reads_variables() {
        let vars: HashMap<&str, &str> = [
            (ENV_ACCESS_TOKEN, "token"),
            (ENV_SPACE_ID, "space"),
            (ENV_ENVIRONMENT_ID, "staging"),
            (ENV_BASE_URL, "http://localhost:9000"),
        ]
        .into_iter()
        .collect();
        let config = ClientConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.space_id(), "space");
        assert_eq!(config.environment_id(), "staging");
        assert_eq!(config.base_url().join("spaces"), "http://localhost:9000/spaces");
    }

    #[test]
    fn from_lookup_names_missing_variable() {
        let err = ClientConfig::from_lookup(|k| (k == ENV_ACCESS_TOKEN).then(|| "t".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_SPACE_ID));
    }
}
