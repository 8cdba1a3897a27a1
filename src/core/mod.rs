//! Linked Data Platform core.
//!
//! # Modules
//!
//! - [`resource`] - lifecycle state machine, slug allocation, containment checks
//! - [`protocol`] - entity tags, preconditions, negotiation, capability metadata
//! - [`store`] - change sets, transactions and the in-memory store
//! - [`codec`] - RDF parsing and serialization
//! - [`types`] - vocabulary and resource state types
//! - [`server`] - axum middleware and handlers
//!
//! # Request flow
//!
//! ```text
//! request ──▶ LdpLayer (headers → LdpState)
//!                 │
//!                 ▼
//!          handler ──▶ ResourceManager ──▶ locks ─▶ guard ─▶ containment ─▶ Transaction::commit
//!                 │
//!                 ▼
//!          negotiator + capabilities ──▶ response
//! ```

pub mod codec;
pub mod error;
pub mod protocol;
pub mod resource;
#[cfg(feature = "server")]
pub mod server;
pub mod store;
pub mod traits;
pub mod types;

pub use error::{LdpError, Result};
pub use types::{ResourceKind, ResourceSnapshot, ResourceState};
