//! IRIs the server reads and writes.

use oxrdf::NamedNodeRef;

/// W3C Linked Data Platform vocabulary.
pub mod ldp {
    use super::NamedNodeRef;

    pub const NAMESPACE: &str = "http://www.w3.org/ns/ldp#";

    pub const RESOURCE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#Resource");
    pub const RDF_SOURCE: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#RDFSource");
    pub const CONTAINER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#Container");
    pub const BASIC_CONTAINER: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#BasicContainer");
    pub const CONTAINS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#contains");
    pub const CONSTRAINED_BY: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://www.w3.org/ns/ldp#constrainedBy");
}

/// Dublin Core terms used for timestamps.
pub mod dcterms {
    use super::NamedNodeRef;

    pub const NAMESPACE: &str = "http://purl.org/dc/terms/";

    pub const CREATED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/created");
    pub const MODIFIED: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("http://purl.org/dc/terms/modified");
}

/// Server-private terms. Never accepted from clients.
pub mod server {
    use super::NamedNodeRef;

    pub const NAMESPACE: &str = "urn:ldp-rs:ns#";

    /// Tombstone marker; object is the deletion instant.
    pub const DELETED: NamedNodeRef<'_> = NamedNodeRef::new_unchecked("urn:ldp-rs:ns#deleted");

    /// Documentation IRI advertised in `constrainedBy` links.
    pub const CONSTRAINTS: NamedNodeRef<'_> =
        NamedNodeRef::new_unchecked("urn:ldp-rs:ns#constraints");
}

pub use oxrdf::vocab::{rdf, xsd};

/// LDP types the server owns on every resource.
pub const LDP_TYPES: [NamedNodeRef<'static>; 3] =
    [ldp::RDF_SOURCE, ldp::CONTAINER, ldp::BASIC_CONTAINER];
