//! Entity tags and precondition evaluation.
//!
//! Tags are weak and derived from `dcterms:modified`: the tag changes iff the
//! modification instant changes. Two resources modified at the same instant
//! share a tag, which weak semantics permits.
//!
//! # Evaluation order
//!
//! 1. `If-Match` present: the current tag must be listed (or `*`), else
//!    `PreconditionFailed`. With no current representation it always fails.
//! 2. `If-None-Match` present: if the current tag is listed (or `*` with a
//!    current representation), reads get `NotModified` and writes get
//!    `PreconditionFailed`.
//! 3. Otherwise proceed.
//!
//! Replacing an existing resource additionally requires `If-Match` to be
//! present at all ([`Conditions::require_if_match`]).

use crate::core::error::{LdpError, Result};
use sha2::{Digest, Sha256};
use std::fmt;

/// An HTTP entity tag.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct EntityTag {
    weak: bool,
    opaque: String,
}

impl EntityTag {
    /// Weak tag for a resource last modified at `modified` (lexical form).
    #[must_use]
    pub fn weak_from_modified(modified: &str) -> Self {
        let digest = Sha256::digest(modified.as_bytes());
        Self {
            weak: true,
            opaque: format!("{:x}", digest),
        }
    }

    #[must_use]
    pub fn weak(opaque: impl Into<String>) -> Self {
        Self {
            weak: true,
            opaque: opaque.into(),
        }
    }

    #[must_use]
    pub fn strong(opaque: impl Into<String>) -> Self {
        Self {
            weak: false,
            opaque: opaque.into(),
        }
    }

    /// Parse `W/"x"` or `"x"`. Unquoted values are accepted leniently.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        let (weak, rest) = match value.strip_prefix("W/") {
            Some(rest) => (true, rest),
            None => (false, value),
        };
        let opaque = rest
            .strip_prefix('"')
            .and_then(|r| r.strip_suffix('"'))
            .unwrap_or(rest);
        if opaque.is_empty() || opaque.contains('"') {
            return None;
        }
        Some(Self {
            weak,
            opaque: opaque.to_string(),
        })
    }

    #[inline]
    #[must_use]
    pub fn is_weak(&self) -> bool {
        self.weak
    }

    #[inline]
    #[must_use]
    pub fn opaque(&self) -> &str {
        &self.opaque
    }

    /// Weak comparison: opaque values match, weakness ignored.
    #[inline]
    #[must_use]
    pub fn weak_eq(&self, other: &EntityTag) -> bool {
        self.opaque == other.opaque
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.weak {
            write!(f, "W/\"{}\"", self.opaque)
        } else {
            write!(f, "\"{}\"", self.opaque)
        }
    }
}

/// Value of `If-Match` / `If-None-Match`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TagList {
    Any,
    Tags(Vec<EntityTag>),
}

impl TagList {
    /// Parse a header value. Unparseable members are skipped.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim() == "*" {
            return TagList::Any;
        }
        TagList::Tags(split_tags(value).filter_map(EntityTag::parse).collect())
    }

    /// True if `current` satisfies the list.
    #[must_use]
    pub fn matches(&self, current: &EntityTag) -> bool {
        match self {
            TagList::Any => true,
            TagList::Tags(tags) => tags.iter().any(|t| t.weak_eq(current)),
        }
    }
}

/// Split on commas outside quotes (opaque tags may contain commas).
fn split_tags(value: &str) -> impl Iterator<Item = &str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&value[start..]);
    parts.into_iter().map(str::trim).filter(|p| !p.is_empty())
}

/// Whether the verb being evaluated reads or writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VerbClass {
    Read,
    Write,
}

/// Outcome of [`evaluate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precondition {
    Proceed,
    PreconditionFailed,
    NotModified,
}

/// Evaluate conditional headers against the current tag.
///
/// `current` is `None` when the target has no representation; no tag is
/// computed for such targets.
#[must_use]
pub fn evaluate(
    current: Option<&EntityTag>,
    if_match: Option<&TagList>,
    if_none_match: Option<&TagList>,
    class: VerbClass,
) -> Precondition {
    if let Some(list) = if_match {
        match current {
            Some(tag) if list.matches(tag) => {}
            _ => return Precondition::PreconditionFailed,
        }
    }

    if let (Some(list), Some(tag)) = (if_none_match, current) {
        if list.matches(tag) {
            return match class {
                VerbClass::Read => Precondition::NotModified,
                VerbClass::Write => Precondition::PreconditionFailed,
            };
        }
    }

    Precondition::Proceed
}

/// Conditional headers carried by one request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Conditions {
    pub if_match: Option<TagList>,
    pub if_none_match: Option<TagList>,
}

impl Conditions {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn if_match(tag: EntityTag) -> Self {
        Self {
            if_match: Some(TagList::Tags(vec![tag])),
            if_none_match: None,
        }
    }

    #[must_use]
    pub fn from_header_values(if_match: Option<&str>, if_none_match: Option<&str>) -> Self {
        Self {
            if_match: if_match.map(TagList::parse),
            if_none_match: if_none_match.map(TagList::parse),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.if_match.is_none() && self.if_none_match.is_none()
    }

    /// Replacing a live resource requires `If-Match`.
    ///
    /// # Errors
    ///
    /// [`LdpError::PreconditionRequired`] if the header is absent.
    pub fn require_if_match(&self, uri: &str) -> Result<()> {
        if self.if_match.is_none() {
            return Err(LdpError::PreconditionRequired(format!(
                "If-Match is required to modify {}",
                uri
            )));
        }
        Ok(())
    }

    /// Evaluate and convert the outcome into an error.
    ///
    /// # Errors
    ///
    /// [`LdpError::PreconditionFailed`] or [`LdpError::NotModified`].
    pub fn check(&self, uri: &str, current: Option<&EntityTag>, class: VerbClass) -> Result<()> {
        match evaluate(
            current,
            self.if_match.as_ref(),
            self.if_none_match.as_ref(),
            class,
        ) {
            Precondition::Proceed => Ok(()),
            Precondition::PreconditionFailed => Err(LdpError::PreconditionFailed(format!(
                "entity tag condition does not hold for {}",
                uri
            ))),
            Precondition::NotModified => Err(LdpError::NotModified {
                etag: current.map(ToString::to_string).unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(s: &str) -> EntityTag {
        EntityTag::weak(s)
    }

    // ========== EntityTag Tests ==========

    #[test]
    fn test_weak_from_modified_is_stable() {
        let a = EntityTag::weak_from_modified("2024-01-01T00:00:00Z");
        let b = EntityTag::weak_from_modified("2024-01-01T00:00:00Z");
        assert_eq!(a, b);
        assert!(a.is_weak());
        assert_eq!(a.opaque().len(), 64);
    }

    #[test]
    fn test_weak_from_modified_changes_with_timestamp() {
        let a = EntityTag::weak_from_modified("2024-01-01T00:00:00.000001Z");
        let b = EntityTag::weak_from_modified("2024-01-01T00:00:00.000002Z");
        assert_ne!(a, b);
    }

    #[test]
    fn test_display() {
        assert_eq!(tag("abc").to_string(), "W/\"abc\"");
        assert_eq!(EntityTag::strong("abc").to_string(), "\"abc\"");
    }

    #[test]
    fn test_parse_weak_and_strong() {
        assert_eq!(EntityTag::parse("W/\"abc\""), Some(tag("abc")));
        assert_eq!(EntityTag::parse("\"abc\""), Some(EntityTag::strong("abc")));
        assert_eq!(EntityTag::parse("abc"), Some(EntityTag::strong("abc")));
        assert_eq!(EntityTag::parse(""), None);
        assert_eq!(EntityTag::parse("\"\""), None);
    }

    #[test]
    fn test_weak_eq_ignores_weakness() {
        assert!(tag("abc").weak_eq(&EntityTag::strong("abc")));
        assert!(!tag("abc").weak_eq(&tag("abd")));
    }

    // ========== TagList Tests ==========

    #[test]
    fn test_tag_list_any() {
        assert_eq!(TagList::parse(" * "), TagList::Any);
        assert!(TagList::Any.matches(&tag("x")));
    }

    #[test]
    fn test_tag_list_multiple() {
        let list = TagList::parse("W/\"a\", \"b\" ,W/\"c\"");
        assert_eq!(
            list,
            TagList::Tags(vec![tag("a"), EntityTag::strong("b"), tag("c")])
        );
        assert!(list.matches(&tag("b")));
        assert!(!list.matches(&tag("d")));
    }

    #[test]
    fn test_tag_list_comma_inside_quotes() {
        let list = TagList::parse("\"a,b\", \"c\"");
        assert_eq!(
            list,
            TagList::Tags(vec![EntityTag::strong("a,b"), EntityTag::strong("c")])
        );
    }

    // ========== Evaluation Tests ==========

    #[test]
    fn test_no_headers_proceeds() {
        assert_eq!(
            evaluate(Some(&tag("a")), None, None, VerbClass::Write),
            Precondition::Proceed
        );
    }

    #[test]
    fn test_if_match_hit() {
        let list = TagList::parse("W/\"a\"");
        assert_eq!(
            evaluate(Some(&tag("a")), Some(&list), None, VerbClass::Write),
            Precondition::Proceed
        );
    }

    #[test]
    fn test_if_match_miss() {
        let list = TagList::parse("W/\"stale\"");
        assert_eq!(
            evaluate(Some(&tag("a")), Some(&list), None, VerbClass::Write),
            Precondition::PreconditionFailed
        );
    }

    #[test]
    fn test_if_match_wildcard() {
        assert_eq!(
            evaluate(Some(&tag("a")), Some(&TagList::Any), None, VerbClass::Write),
            Precondition::Proceed
        );
    }

    #[test]
    fn test_if_match_without_current_fails() {
        assert_eq!(
            evaluate(None, Some(&TagList::Any), None, VerbClass::Write),
            Precondition::PreconditionFailed
        );
    }

    #[test]
    fn test_if_none_match_read_not_modified() {
        let list = TagList::parse("W/\"a\"");
        assert_eq!(
            evaluate(Some(&tag("a")), None, Some(&list), VerbClass::Read),
            Precondition::NotModified
        );
    }

    #[test]
    fn test_if_none_match_write_fails() {
        assert_eq!(
            evaluate(Some(&tag("a")), None, Some(&TagList::Any), VerbClass::Write),
            Precondition::PreconditionFailed
        );
    }

    #[test]
    fn test_if_none_match_without_current_proceeds() {
        assert_eq!(
            evaluate(None, None, Some(&TagList::Any), VerbClass::Write),
            Precondition::Proceed
        );
    }

    #[test]
    fn test_if_none_match_checked_after_if_match() {
        let im = TagList::parse("W/\"a\"");
        let inm = TagList::parse("W/\"a\"");
        assert_eq!(
            evaluate(Some(&tag("a")), Some(&im), Some(&inm), VerbClass::Read),
            Precondition::NotModified
        );
    }

    // ========== Conditions Tests ==========

    #[test]
    fn test_require_if_match() {
        let err = Conditions::none().require_if_match("http://h/a").unwrap_err();
        assert!(matches!(err, LdpError::PreconditionRequired(_)));
        assert!(Conditions::if_match(tag("a")).require_if_match("http://h/a").is_ok());
    }

    #[test]
    fn test_check_maps_not_modified() {
        let conditions = Conditions::from_header_values(None, Some("W/\"a\""));
        let err = conditions
            .check("http://h/a", Some(&tag("a")), VerbClass::Read)
            .unwrap_err();
        match err {
            LdpError::NotModified { etag } => assert_eq!(etag, "W/\"a\""),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_check_maps_failed() {
        let conditions = Conditions::from_header_values(Some("W/\"b\""), None);
        let err = conditions
            .check("http://h/a", Some(&tag("a")), VerbClass::Write)
            .unwrap_err();
        assert!(matches!(err, LdpError::PreconditionFailed(_)));
    }
}
