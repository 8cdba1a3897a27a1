//! Resource lifecycle and the services it leans on.
//!
//! | Module | Role |
//! |--------|------|
//! | [`lifecycle`] | [`ResourceManager`]: create, read, replace, delete |
//! | [`slug`] | bounded child-name allocation |
//! | [`containment`] | `ldp:contains` equality check for replace |
//! | [`locks`] | per-URI exclusive scopes |

pub mod containment;
pub mod lifecycle;
pub mod locks;
pub mod slug;

pub use containment::ContainmentDiff;
pub use lifecycle::{ChildName, Payload, PutOutcome, ResourceManager};
pub use locks::{UriLockGuard, UriLockManager};
pub use slug::SlugAllocator;
