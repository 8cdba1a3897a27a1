//! Core data types for LDP resources.
//!
//! A resource has no identity beyond its URI: its state is derived from
//! the statements whose subject is that URI. [`ResourceSnapshot`] performs
//! the derivation from a single read of the store, so every attribute it
//! reports comes from one consistent view.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ResourceState`] | `Absent`, `Live(kind)`, or `Tombstoned` |
//! | [`ResourceKind`] | plain RDF source or basic container |
//! | [`ResourceSnapshot`] | statements plus derived state, timestamps and tag |

pub mod state;
pub mod vocab;

pub use state::{ResourceKind, ResourceSnapshot, ResourceState};

use chrono::{DateTime, SecondsFormat, Utc};
use oxrdf::{Literal, NamedNode, NamedOrBlankNode, Term, Triple};

/// True if `triple` is about `node`.
#[inline]
pub(crate) fn subject_is(triple: &Triple, node: &NamedNode) -> bool {
    matches!(&triple.subject, NamedOrBlankNode::NamedNode(n) if n == node)
}

/// True if `term` is the IRI `iri`.
#[inline]
pub(crate) fn term_is(term: &Term, iri: oxrdf::NamedNodeRef<'_>) -> bool {
    matches!(term, Term::NamedNode(n) if n.as_ref() == iri)
}

/// `xsd:dateTime` literal with microsecond precision, always UTC.
#[must_use]
pub fn timestamp_literal(at: DateTime<Utc>) -> Literal {
    Literal::new_typed_literal(
        at.to_rfc3339_opts(SecondsFormat::Micros, true),
        vocab::xsd::DATE_TIME,
    )
}

/// Parse a timestamp literal written by [`timestamp_literal`].
#[must_use]
pub fn parse_timestamp(lexical: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(lexical)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}
