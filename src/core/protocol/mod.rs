//! HTTP-level protocol pieces: entity tags, preconditions, content
//! negotiation, capability metadata and header helpers.

pub mod capabilities;
pub mod conditional;
pub mod headers;
pub mod negotiate;

pub use capabilities::{Capabilities, Verb};
pub use conditional::{evaluate, Conditions, EntityTag, Precondition, TagList, VerbClass};
pub use negotiate::{parse_accept, ContentNegotiator, MediaRange};
