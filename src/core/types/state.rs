//! Resource state derived from stored statements.

use super::vocab::{dcterms, ldp, rdf, server};
use super::{parse_timestamp, subject_is, term_is};
use crate::core::protocol::EntityTag;
use chrono::{DateTime, Utc};
use oxrdf::{NamedNode, Term, Triple};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interaction model of a live resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Plain LDP RDF source.
    RdfSource,
    /// Basic container; may own children through `ldp:contains`.
    BasicContainer,
}

impl ResourceKind {
    #[inline]
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, ResourceKind::BasicContainer)
    }

    /// `rdf:type` objects the server stamps for this kind.
    #[must_use]
    pub fn type_iris(self) -> Vec<NamedNode> {
        match self {
            ResourceKind::RdfSource => vec![ldp::RDF_SOURCE.into_owned()],
            ResourceKind::BasicContainer => vec![
                ldp::RDF_SOURCE.into_owned(),
                ldp::CONTAINER.into_owned(),
                ldp::BASIC_CONTAINER.into_owned(),
            ],
        }
    }
}

/// Lifecycle state of a URI.
///
/// ```text
/// Absent ──create──▶ Live ──replace──▶ Live ──delete──▶ Tombstoned
/// ```
///
/// `Tombstoned` is terminal: the URI can never be live again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceState {
    Absent,
    Live(ResourceKind),
    Tombstoned,
}

impl ResourceState {
    #[inline]
    #[must_use]
    pub fn is_live(self) -> bool {
        matches!(self, ResourceState::Live(_))
    }

    #[inline]
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, ResourceState::Live(kind) if kind.is_container())
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceState::Absent => write!(f, "absent"),
            ResourceState::Live(ResourceKind::RdfSource) => write!(f, "live resource"),
            ResourceState::Live(ResourceKind::BasicContainer) => write!(f, "live container"),
            ResourceState::Tombstoned => write!(f, "tombstoned"),
        }
    }
}

/// Everything the store holds about one URI, read in a single call.
#[derive(Clone, Debug)]
pub struct ResourceSnapshot {
    pub uri: NamedNode,
    pub state: ResourceState,
    /// Statements with `uri` as subject (the tombstone marker for a tombstone).
    pub statements: Vec<Triple>,
    /// Lexical form of `dcterms:modified`, if any.
    pub modified: Option<String>,
}

impl ResourceSnapshot {
    /// Derive state from the statements about `uri`.
    ///
    /// Statements about other subjects are ignored.
    #[must_use]
    pub fn from_statements(uri: NamedNode, statements: Vec<Triple>) -> Self {
        let statements: Vec<Triple> = statements
            .into_iter()
            .filter(|t| subject_is(t, &uri))
            .collect();

        let tombstoned = statements
            .iter()
            .any(|t| t.predicate.as_ref() == server::DELETED);

        let state = if tombstoned {
            ResourceState::Tombstoned
        } else if statements.is_empty() {
            ResourceState::Absent
        } else if statements.iter().any(|t| {
            t.predicate.as_ref() == rdf::TYPE
                && (term_is(&t.object, ldp::BASIC_CONTAINER) || term_is(&t.object, ldp::CONTAINER))
        }) {
            ResourceState::Live(ResourceKind::BasicContainer)
        } else {
            ResourceState::Live(ResourceKind::RdfSource)
        };

        let modified = statements
            .iter()
            .find(|t| t.predicate.as_ref() == dcterms::MODIFIED)
            .and_then(|t| match &t.object {
                Term::Literal(l) => Some(l.value().to_string()),
                _ => None,
            });

        Self {
            uri,
            state,
            statements,
            modified,
        }
    }

    /// Weak tag of the current representation. `None` unless live.
    #[must_use]
    pub fn etag(&self) -> Option<EntityTag> {
        if !self.state.is_live() {
            return None;
        }
        self.modified.as_deref().map(EntityTag::weak_from_modified)
    }

    #[must_use]
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified.as_deref().and_then(parse_timestamp)
    }

    /// `dcterms:created`, preserved across replace.
    #[must_use]
    pub fn created(&self) -> Option<&Term> {
        self.statements
            .iter()
            .find(|t| t.predicate.as_ref() == dcterms::CREATED)
            .map(|t| &t.object)
    }

    #[inline]
    #[must_use]
    pub fn is_container(&self) -> bool {
        self.state.is_container()
    }

    /// Objects of `ldp:contains`.
    #[must_use]
    pub fn contained(&self) -> Vec<&Term> {
        self.statements
            .iter()
            .filter(|t| t.predicate.as_ref() == ldp::CONTAINS)
            .map(|t| &t.object)
            .collect()
    }
}
