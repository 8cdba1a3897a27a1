//! Capability metadata advertised for a target.
//!
//! The verb set depends only on the target's lifecycle state:
//!
//! | State | Allow | Accept-Post / Accept-Patch |
//! |-------|-------|----------------------------|
//! | Live container | GET, HEAD, OPTIONS, PUT, DELETE, POST, PATCH | input formats |
//! | Live resource | GET, HEAD, OPTIONS, PUT, DELETE | none |
//! | Absent | OPTIONS, PUT | none |
//! | Tombstoned | OPTIONS | none |

use crate::core::protocol::headers::format_list;
use crate::core::types::ResourceState;
use serde::Serialize;
use std::fmt;

/// HTTP verbs the server understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verb {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Verb {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Head => "HEAD",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Patch => "PATCH",
            Verb::Delete => "DELETE",
            Verb::Options => "OPTIONS",
        }
    }

    /// Parse a method token, case-sensitively as HTTP requires.
    #[must_use]
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "GET" => Some(Verb::Get),
            "HEAD" => Some(Verb::Head),
            "POST" => Some(Verb::Post),
            "PUT" => Some(Verb::Put),
            "PATCH" => Some(Verb::Patch),
            "DELETE" => Some(Verb::Delete),
            "OPTIONS" => Some(Verb::Options),
            _ => None,
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbs and body formats a target currently accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub allow: Vec<Verb>,
    pub accept_post: Vec<&'static str>,
    pub accept_patch: Vec<&'static str>,
}

impl Capabilities {
    /// Compose capabilities from a state and the parseable input media types.
    #[must_use]
    pub fn compose(state: ResourceState, input_formats: &[&'static str]) -> Self {
        let mut caps = Self {
            allow: Vec::new(),
            accept_post: Vec::new(),
            accept_patch: Vec::new(),
        };
        match state {
            ResourceState::Live(kind) => {
                caps.allow = vec![Verb::Get, Verb::Head, Verb::Options, Verb::Put, Verb::Delete];
                if kind.is_container() {
                    caps.allow.push(Verb::Post);
                    caps.allow.push(Verb::Patch);
                    caps.accept_post = input_formats.to_vec();
                    caps.accept_patch = input_formats.to_vec();
                }
            }
            ResourceState::Absent => caps.allow = vec![Verb::Options, Verb::Put],
            ResourceState::Tombstoned => caps.allow = vec![Verb::Options],
        }
        caps
    }

    #[inline]
    #[must_use]
    pub fn allows(&self, verb: Verb) -> bool {
        self.allow.contains(&verb)
    }

    #[must_use]
    pub fn allow_header(&self) -> String {
        let verbs: Vec<&str> = self.allow.iter().map(|v| v.as_str()).collect();
        format_list(&verbs)
    }

    /// `Accept-Post` value, `None` when POST is not allowed.
    #[must_use]
    pub fn accept_post_header(&self) -> Option<String> {
        (!self.accept_post.is_empty()).then(|| format_list(&self.accept_post))
    }

    #[must_use]
    pub fn accept_patch_header(&self) -> Option<String> {
        (!self.accept_patch.is_empty()).then(|| format_list(&self.accept_patch))
    }

    /// Allowed verbs as owned strings, for `MethodNotAllowed`.
    #[must_use]
    pub fn allowed_names(&self) -> Vec<String> {
        self.allow.iter().map(|v| v.as_str().to_string()).collect()
    }
}
