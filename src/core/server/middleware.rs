//! Axum middleware extracting LDP request headers.

use super::config::ServerConfig;
use crate::core::protocol::headers::{self as ldp_headers, parse_interaction_model, parse_slug};
use crate::core::protocol::Conditions;
use crate::core::types::ResourceKind;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use std::sync::Arc;

const EXPOSED_HEADERS: &str = "ETag, Location, Link, Allow, Accept-Post, Accept-Patch, Vary";

async fn ldp_middleware_handler(
    State(layer): State<LdpLayer>,
    req: Request,
    next: Next,
) -> Response {
    layer.handle_middleware(req, next).await
}

/// LDP request state extracted from HTTP headers.
#[derive(Clone, Debug, Default)]
pub struct LdpState {
    pub conditions: Conditions,
    /// Decoded `Slug` hint.
    pub slug: Option<String>,
    pub accept: Option<String>,
    pub content_type: Option<String>,
    /// Interaction model from `Link: <…>; rel="type"`.
    pub interaction_model: Option<ResourceKind>,
    pub host: Option<String>,
}

impl LdpState {
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let joined = |name: header::HeaderName| {
            let values: Vec<&str> = headers
                .get_all(name)
                .iter()
                .filter_map(|v| v.to_str().ok())
                .collect();
            (!values.is_empty()).then(|| values.join(", "))
        };

        let if_match = joined(header::IF_MATCH);
        let if_none_match = joined(header::IF_NONE_MATCH);

        LdpState {
            conditions: Conditions::from_header_values(
                if_match.as_deref(),
                if_none_match.as_deref(),
            ),
            slug: text(ldp_headers::SLUG).as_deref().and_then(parse_slug),
            accept: joined(header::ACCEPT),
            content_type: text(header::CONTENT_TYPE.as_str()),
            interaction_model: joined(header::LINK)
                .as_deref()
                .and_then(parse_interaction_model),
            host: text(header::HOST.as_str()),
        }
    }
}

/// Axum middleware layer for LDP request handling.
#[derive(Clone, Debug)]
pub struct LdpLayer {
    config: Arc<ServerConfig>,
}

impl Default for LdpLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl LdpLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ServerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ServerConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    #[must_use]
    pub fn middleware(
        &self,
    ) -> impl tower::Layer<
        axum::routing::Route,
        Service = impl tower::Service<
            Request,
            Response = Response,
            Error = std::convert::Infallible,
            Future = impl Send + 'static,
        > + Clone
                      + Send
                      + Sync
                      + 'static,
    > + Clone {
        axum::middleware::from_fn_with_state(self.clone(), ldp_middleware_handler)
    }

    async fn handle_middleware(&self, mut req: Request, next: Next) -> Response {
        tracing::debug!("{} {}", req.method(), req.uri().path());

        let ldp_state = LdpState::from_headers(req.headers());
        req.extensions_mut().insert(Arc::new(ldp_state));

        let mut response = next.run(req).await;
        if self.config.enable_cors {
            let headers = response.headers_mut();
            headers.insert(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            );
            headers.insert(
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_static(EXPOSED_HEADERS),
            );
        }
        response
    }
}
