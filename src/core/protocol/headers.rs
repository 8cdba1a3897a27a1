//! Shared header parsing and formatting for LDP requests and responses.
//!
//! # Header Formats
//!
//! | Header | Format | Example |
//! |--------|--------|---------|
//! | Slug | Percent-encoded text | `My%20Notes` |
//! | Link | `<iri>; rel="…"`, comma-separated | `<http://www.w3.org/ns/ldp#Resource>; rel="type"` |
//! | Content-Type | Media type with parameters | `text/turtle; charset=utf-8` |
//! | Allow / Accept-Post | Comma-separated tokens | `GET, HEAD, OPTIONS` |
//!
//! # Examples
//!
//! ```
//! use ldp_rs::core::protocol::headers::{media_type_essence, parse_slug};
//!
//! assert_eq!(media_type_essence("Text/Turtle; charset=utf-8"), "text/turtle");
//! assert_eq!(parse_slug("My%20Notes").as_deref(), Some("My Notes"));
//! ```

use crate::core::types::vocab::ldp;
use crate::core::types::ResourceKind;
use oxrdf::NamedNode;

pub const SLUG: &str = "slug";
pub const LINK: &str = "link";
pub const ACCEPT_POST: &str = "accept-post";
pub const ACCEPT_PATCH: &str = "accept-patch";

/// `rel` value of a `Link` pointing at the server's constraints document.
pub const REL_CONSTRAINED_BY: &str = "http://www.w3.org/ns/ldp#constrainedBy";

/// Media type without parameters, lowercased.
#[must_use]
pub fn media_type_essence(value: &str) -> String {
    value
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Decode a `Slug` header. Returns `None` for a blank value.
///
/// Invalid percent escapes are kept literally; a value that does not decode
/// to UTF-8 is used as sent.
#[must_use]
pub fn parse_slug(value: &str) -> Option<String> {
    let raw = value.trim();
    let decoded = urlencoding::decode(raw)
        .map(|d| d.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    let slug = decoded.trim();
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// Format `rel="type"` links for each IRI.
///
/// ```
/// use ldp_rs::core::protocol::headers::format_type_links;
/// use oxrdf::NamedNode;
///
/// let types = [NamedNode::new_unchecked("http://www.w3.org/ns/ldp#Resource")];
/// assert_eq!(
///     format_type_links(&types),
///     "<http://www.w3.org/ns/ldp#Resource>; rel=\"type\""
/// );
/// ```
#[must_use]
pub fn format_type_links(types: &[NamedNode]) -> String {
    types
        .iter()
        .map(|t| format!("<{}>; rel=\"type\"", t.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[inline]
#[must_use]
pub fn format_constrained_by(iri: &str) -> String {
    format!("<{}>; rel=\"{}\"", iri, REL_CONSTRAINED_BY)
}

/// Join tokens into a list header value.
#[inline]
#[must_use]
pub fn format_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Interaction model requested through `Link: <…>; rel="type"`.
///
/// Container types win over plain resource types. Unrelated links are
/// ignored.
#[must_use]
pub fn parse_interaction_model(value: &str) -> Option<ResourceKind> {
    let mut model = None;
    for link in value.split(',') {
        let mut parts = link.split(';');
        let Some(target) = parts.next() else { continue };
        let target = target.trim();
        let Some(iri) = target.strip_prefix('<').and_then(|t| t.strip_suffix('>')) else {
            continue;
        };
        let is_type = parts.any(|p| {
            let p = p.trim();
            p.eq_ignore_ascii_case("rel=\"type\"") || p.eq_ignore_ascii_case("rel=type")
        });
        if !is_type {
            continue;
        }
        if iri == ldp::BASIC_CONTAINER.as_str() || iri == ldp::CONTAINER.as_str() {
            return Some(ResourceKind::BasicContainer);
        }
        if iri == ldp::RESOURCE.as_str() || iri == ldp::RDF_SOURCE.as_str() {
            model = Some(ResourceKind::RdfSource);
        }
    }
    model
}
