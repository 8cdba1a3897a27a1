//! Containment links may only change through child create and delete.
//!
//! A replace must resubmit exactly the `ldp:contains` objects the target
//! currently has; anything else is a conflict.

use crate::core::error::{LdpError, Result};
use crate::core::types::subject_is;
use crate::core::types::vocab::ldp;
use oxrdf::{NamedNode, Term, Triple};
use std::collections::HashSet;

/// Objects of `target ldp:contains ?o` in `statements`.
#[must_use]
pub fn contained_set(statements: &[Triple], target: &NamedNode) -> HashSet<Term> {
    statements
        .iter()
        .filter(|t| subject_is(t, target) && t.predicate.as_ref() == ldp::CONTAINS)
        .map(|t| t.object.clone())
        .collect()
}

/// Difference between a submitted and the stored containment set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContainmentDiff {
    /// Submitted but not stored.
    pub added: Vec<Term>,
    /// Stored but not submitted.
    pub removed: Vec<Term>,
}

impl ContainmentDiff {
    #[must_use]
    pub fn between(submitted: &[Triple], current: &[Triple], target: &NamedNode) -> Self {
        let submitted = contained_set(submitted, target);
        let current = contained_set(current, target);
        let mut added: Vec<Term> = submitted.difference(&current).cloned().collect();
        let mut removed: Vec<Term> = current.difference(&submitted).cloned().collect();
        added.sort_by_key(ToString::to_string);
        removed.sort_by_key(ToString::to_string);
        Self { added, removed }
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Reject a replacement whose containment set differs from the stored one.
///
/// # Errors
///
/// [`LdpError::Conflict`] listing the offending links.
pub fn enforce(submitted: &[Triple], current: &[Triple], target: &NamedNode) -> Result<()> {
    let diff = ContainmentDiff::between(submitted, current, target);
    if diff.is_empty() {
        return Ok(());
    }
    tracing::warn!(
        "containment change rejected on {}: +{} -{}",
        target,
        diff.added.len(),
        diff.removed.len()
    );
    let list = |terms: &[Term]| {
        terms
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    Err(LdpError::Conflict(format!(
        "ldp:contains of {} can only change by creating or deleting children (added [{}], removed [{}])",
        target.as_str(),
        list(&diff.added),
        list(&diff.removed)
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxrdf::Literal;

    fn node(iri: &str) -> NamedNode {
        NamedNode::new_unchecked(iri)
    }

    fn contains(parent: &str, child: &str) -> Triple {
        Triple::new(node(parent), ldp::CONTAINS, node(child))
    }

    fn title(s: &str, v: &str) -> Triple {
        Triple::new(
            node(s),
            node("http://purl.org/dc/terms/title"),
            Literal::new_simple_literal(v),
        )
    }

    #[test]
    fn test_equal_sets_pass() {
        let current = vec![contains("http://h/c", "http://h/c/a"), title("http://h/c", "old")];
        let submitted = vec![title("http://h/c", "new"), contains("http://h/c", "http://h/c/a")];
        assert!(enforce(&submitted, &current, &node("http://h/c")).is_ok());
    }

    #[test]
    fn test_extra_link_conflicts() {
        let current = vec![contains("http://h/c", "http://h/c/a")];
        let submitted = vec![
            contains("http://h/c", "http://h/c/a"),
            contains("http://h/c", "http://h/c/b"),
        ];
        let err = enforce(&submitted, &current, &node("http://h/c")).unwrap_err();
        assert!(matches!(err, LdpError::Conflict(ref m) if m.contains("http://h/c/b")));
    }

    #[test]
    fn test_missing_link_conflicts() {
        let current = vec![contains("http://h/c", "http://h/c/a")];
        let diff = ContainmentDiff::between(&[], &current, &node("http://h/c"));
        assert!(diff.added.is_empty());
        assert_eq!(diff.removed, vec![Term::from(node("http://h/c/a"))]);
        assert!(enforce(&[], &current, &node("http://h/c")).is_err());
    }

    #[test]
    fn test_links_of_other_subjects_ignored() {
        let submitted = vec![contains("http://h/other", "http://h/c/a")];
        assert!(enforce(&submitted, &[], &node("http://h/c")).is_ok());
    }

    #[test]
    fn test_plain_resource_cannot_gain_links() {
        let submitted = vec![contains("http://h/doc", "http://h/x")];
        assert!(enforce(&submitted, &[], &node("http://h/doc")).is_err());
    }
}
