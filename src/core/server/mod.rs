//! LDP HTTP server on axum.
//!
//! # Module Organization
//!
//! ```text
//! server/
//! ├── middleware - LdpLayer and the LdpState extractor
//! ├── handlers   - one handler per verb
//! ├── response   - LdpError → HTTP response
//! └── config     - ServerConfig options
//! ```
//!
//! # Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`LdpLayer`] | Axum middleware layer |
//! | [`LdpState`] | LDP request headers (preconditions, Slug, Link, Accept) |
//! | [`ServerConfig`] | Server configuration options |
//!
//! # Examples
//!
//! ```
//! use ldp_rs::core::server::{ldp_service, ServerConfig};
//! use ldp_rs::{MemoryStore, ResourceManager};
//! use std::sync::Arc;
//!
//! let engine = Arc::new(ResourceManager::new(Arc::new(MemoryStore::new())));
//! let config = ServerConfig {
//!     base_url: Some("http://example.org".into()),
//!     ..Default::default()
//! };
//! let app: axum::Router = ldp_service(engine, config);
//! ```
//!
//! # HTTP Status Codes
//!
//! | Code | When |
//! |------|------|
//! | 201 | POST, or PUT to an absent URI |
//! | 204 | DELETE, PATCH, OPTIONS |
//! | 304 | `If-None-Match` matched on GET/HEAD |
//! | 405 | verb not in the target's `Allow` set |
//! | 409 | containment change or tombstoned URI |
//! | 412 / 428 | failed or missing `If-Match` on replace |

mod config;
mod handlers;
mod middleware;
mod response;


pub use config::ServerConfig;
pub use middleware::{LdpLayer, LdpState};

use crate::core::resource::ResourceManager;
use axum::routing::get;
use axum::Router;
use std::sync::Arc;

/// Shared handler state.
#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<ResourceManager>,
    pub config: Arc<ServerConfig>,
}

/// Router serving every path under the configured base.
pub fn ldp_service(engine: Arc<ResourceManager>, config: ServerConfig) -> Router {
    let layer = LdpLayer::with_config(config.clone());
    let state = ServerState {
        engine,
        config: Arc::new(config),
    };

    let verbs = get(handlers::get_resource)
        .head(handlers::head_resource)
        .post(handlers::post_resource)
        .put(handlers::put_resource)
        .patch(handlers::patch_resource)
        .delete(handlers::delete_resource)
        .options(handlers::options_resource);

    Router::new()
        .route("/", verbs.clone())
        .route("/{*path}", verbs)
        .with_state(state)
        .layer(layer.middleware())
}
