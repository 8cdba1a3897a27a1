//! ldp_rs: Linked Data Platform resource server in Rust.
//!
//! The crate implements the resource lifecycle of an LDP server: graph
//! resources addressed by URI, organised into basic containers, created
//! with `POST`/`PUT`, replaced under `If-Match`, and deleted into permanent
//! tombstones.
//!
//! - **core::resource**: the lifecycle state machine and its helpers (slugs, containment, per-URI locks).
//! - **core::protocol**: entity tags, preconditions, content negotiation, capability headers.
//! - **core::store** / **core::traits**: the storage contract and an in-memory store.
//! - **core::codec**: Turtle, N-Triples and JSON-LD.
//! - **core::server**: the axum surface (feature `server`).

pub mod core;

// Top-level re-exports for common usage
pub use crate::core::codec::RdfFormat;
pub use crate::core::error::{LdpError, Result};
pub use crate::core::protocol::{Capabilities, Conditions, ContentNegotiator, EntityTag, TagList, Verb};
pub use crate::core::resource::{ChildName, Payload, PutOutcome, ResourceManager, SlugAllocator};
pub use crate::core::store::{ChangeSet, MemoryStore, Pattern, Transaction};
pub use crate::core::traits::LdpStorage;
pub use crate::core::types::{ResourceKind, ResourceSnapshot, ResourceState};

#[cfg(feature = "server")]
pub use crate::core::server::{ldp_service, LdpLayer, LdpState, ServerConfig};
