use crate::core::codec::RdfFormat;
use crate::core::error::{LdpError, Result};
use crate::core::protocol::ContentNegotiator;
use crate::core::resource::slug::DEFAULT_RETRY_LIMIT;
use crate::core::resource::SlugAllocator;
use oxrdf::NamedNode;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

/// Configuration for the LDP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Scheme and authority used to build target URIs. When unset, each
    /// request's `Host` header is used with `http://`.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Path of the container created at startup.
    #[serde(default = "default_root_container")]
    pub root_container: String,
    /// Sequential slug candidates tried before falling back to a random suffix.
    #[serde(default = "default_slug_retry_limit")]
    pub slug_retry_limit: usize,
    /// Serve `default_format` when nothing in `Accept` matches, instead of 406.
    #[serde(default = "default_true")]
    pub fallback_to_default_format: bool,
    #[serde(default = "default_format")]
    pub default_format: RdfFormat,
    /// Add `Access-Control-Allow-Origin: *` to every response.
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}

fn default_root_container() -> String {
    "/".to_string()
}

fn default_slug_retry_limit() -> usize {
    DEFAULT_RETRY_LIMIT
}

fn default_true() -> bool {
    true
}

fn default_format() -> RdfFormat {
    RdfFormat::Turtle
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            base_url: None,
            root_container: default_root_container(),
            slug_retry_limit: default_slug_retry_limit(),
            fallback_to_default_format: true,
            default_format: default_format(),
            enable_cors: true,
        }
    }
}

impl ServerConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        let config: ServerConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// [`LdpError::Config`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        self.bind
            .parse::<SocketAddr>()
            .map_err(|e| LdpError::Config(format!("bind '{}': {}", self.bind, e)))?;
        if let Some(base) = &self.base_url {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(LdpError::Config(format!(
                    "base_url '{}' must start with http:// or https://",
                    base
                )));
            }
        }
        if !self.root_container.starts_with('/') {
            return Err(LdpError::Config(format!(
                "root_container '{}' must start with '/'",
                self.root_container
            )));
        }
        if self.slug_retry_limit == 0 {
            return Err(LdpError::Config("slug_retry_limit must be at least 1".into()));
        }
        Ok(())
    }

    /// Output negotiator honouring the fallback policy.
    #[must_use]
    pub fn negotiator(&self) -> ContentNegotiator {
        let fallback = self
            .fallback_to_default_format
            .then_some(self.default_format);
        ContentNegotiator::default().with_fallback(fallback)
    }

    #[must_use]
    pub fn slug_allocator(&self) -> SlugAllocator {
        SlugAllocator::new(self.slug_retry_limit)
    }

    /// Scheme and authority for a request with `host`.
    ///
    /// # Errors
    ///
    /// [`LdpError::InvalidUri`] without `base_url` or `Host`.
    pub fn base_for(&self, host: Option<&str>) -> Result<String> {
        match (&self.base_url, host) {
            (Some(base), _) => Ok(base.trim_end_matches('/').to_string()),
            (None, Some(host)) if !host.is_empty() => Ok(format!("http://{}", host)),
            _ => Err(LdpError::InvalidUri("request has no Host header".into())),
        }
    }

    /// Target URI of `path` under `base`. Trailing slashes are dropped
    /// except on the bare root.
    pub fn target_uri(&self, base: &str, path: &str) -> Result<NamedNode> {
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        let iri = format!("{}{}", base, path);
        NamedNode::new(iri.clone()).map_err(|e| LdpError::InvalidUri(format!("{}: {}", iri, e)))
    }

    /// Fix `base_url` to `http://{bind}` when unset, so the root container
    /// and request targets share one authority whatever `Host` says.
    ///
    /// Returns `true` if the base was derived here.
    pub fn pin_base_url(&mut self) -> bool {
        if self.base_url.is_some() {
            return false;
        }
        self.base_url = Some(format!("http://{}", self.bind));
        true
    }

    /// URI of the root container; uses `http://{bind}` without `base_url`.
    pub fn root_container_uri(&self) -> Result<NamedNode> {
        let base = self.base_for(Some(&self.bind))?;
        self.target_uri(&base, &self.root_container)
    }
}
