//! Child name allocation.
//!
//! Without a hint the name is a random UUID and nothing is checked. With a
//! hint, the normalised name is tried, then `name-1` … `name-{limit-1}`,
//! then one `name-<8 hex>` candidate, and finally a UUID. A name is taken
//! when the store holds any statement about it, which includes tombstones,
//! so a deleted name is never handed out again.
//!
//! Allocation is only a proposal: the caller re-checks the name under the
//! URI's exclusive scope before writing.

use crate::core::error::{LdpError, Result};
use crate::core::traits::LdpStorage;
use oxrdf::NamedNode;

/// Longest normalised slug.
pub const MAX_SLUG_LEN: usize = 64;

pub const DEFAULT_RETRY_LIMIT: usize = 8;

/// Lowercase ASCII alphanumerics; runs of anything else become one `-`.
///
/// Returns `None` if nothing usable is left.
///
/// ```
/// use ldp_rs::core::resource::slug::normalize;
///
/// assert_eq!(normalize("My Quarterly Report!").as_deref(), Some("my-quarterly-report"));
/// assert_eq!(normalize("???"), None);
/// ```
#[must_use]
pub fn normalize(hint: &str) -> Option<String> {
    let mut slug = String::with_capacity(hint.len());
    let mut pending_dash = false;
    for c in hint.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug.truncate(MAX_SLUG_LEN);
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() {
        None
    } else {
        Some(slug.to_string())
    }
}

/// URI of child `name` under `parent`.
///
/// # Errors
///
/// [`LdpError::InvalidUri`] if the result is not a valid IRI.
pub fn child_uri(parent: &NamedNode, name: &str) -> Result<NamedNode> {
    let iri = format!("{}/{}", parent.as_str().trim_end_matches('/'), name);
    NamedNode::new(iri.clone()).map_err(|e| LdpError::InvalidUri(format!("{}: {}", iri, e)))
}

/// Bounded slug negotiation against a store.
#[derive(Clone, Copy, Debug)]
pub struct SlugAllocator {
    retry_limit: usize,
}

impl Default for SlugAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_LIMIT)
    }
}

impl SlugAllocator {
    /// `retry_limit` counts checks of the sequential candidates; at least one
    /// check is always made.
    #[must_use]
    pub fn new(retry_limit: usize) -> Self {
        Self {
            retry_limit: retry_limit.max(1),
        }
    }

    #[inline]
    #[must_use]
    pub fn retry_limit(&self) -> usize {
        self.retry_limit
    }

    /// Sequential candidates for a normalised name.
    fn sequence(&self, name: &str) -> impl Iterator<Item = String> + '_ {
        let name = name.to_string();
        (0..self.retry_limit).map(move |i| {
            if i == 0 {
                name.clone()
            } else {
                format!("{}-{}", name, i)
            }
        })
    }

    /// Propose a free child URI under `parent`.
    ///
    /// Makes at most `retry_limit + 1` existence checks.
    ///
    /// # Errors
    ///
    /// Storage failures, or [`LdpError::InvalidUri`] for an unusable parent.
    pub async fn allocate(
        &self,
        store: &dyn LdpStorage,
        parent: &NamedNode,
        hint: Option<&str>,
    ) -> Result<NamedNode> {
        let Some(name) = hint.and_then(normalize) else {
            return child_uri(parent, &uuid::Uuid::new_v4().to_string());
        };

        for candidate in self.sequence(&name) {
            let uri = child_uri(parent, &candidate)?;
            if !store.exists(&uri).await? {
                return Ok(uri);
            }
            tracing::debug!("slug '{}' taken under {}", candidate, parent);
        }

        let suffixed = format!("{}-{:08x}", name, rand::random::<u32>());
        let uri = child_uri(parent, &suffixed)?;
        if !store.exists(&uri).await? {
            return Ok(uri);
        }

        tracing::debug!("slug '{}' exhausted under {}, using a UUID", name, parent);
        child_uri(parent, &uuid::Uuid::new_v4().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::MemoryStore;
    use crate::core::types::timestamp_literal;
    use crate::core::types::vocab::{ldp, rdf, server};
    use chrono::Utc;
    use oxrdf::Triple;

    fn parent() -> NamedNode {
        NamedNode::new_unchecked("http://h/c")
    }

    async fn occupy(store: &MemoryStore, name: &str) {
        let uri = child_uri(&parent(), name).unwrap();
        store
            .add_statements(vec![Triple::new(uri, rdf::TYPE, ldp::RDF_SOURCE.into_owned())])
            .await
            .unwrap();
    }

    // ========== Normalization ==========

    #[test]
    fn test_normalize_lowercases_and_dashes() {
        assert_eq!(normalize("Report").as_deref(), Some("report"));
        assert_eq!(normalize("  a  b__c ").as_deref(), Some("a-b-c"));
        assert_eq!(normalize("--x--").as_deref(), Some("x"));
        assert_eq!(normalize("café au lait").as_deref(), Some("caf-au-lait"));
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("  /// "), None);
    }

    #[test]
    fn test_normalize_caps_length() {
        let long = "a".repeat(200);
        assert_eq!(normalize(&long).unwrap().len(), MAX_SLUG_LEN);
        let dashed = format!("{}-{}", "a".repeat(63), "b".repeat(10));
        assert_eq!(normalize(&dashed).unwrap(), "a".repeat(63));
    }

    #[test]
    fn test_child_uri_joins_once() {
        let with_slash = NamedNode::new_unchecked("http://h/c/");
        assert_eq!(child_uri(&with_slash, "x").unwrap().as_str(), "http://h/c/x");
        assert_eq!(child_uri(&parent(), "x").unwrap().as_str(), "http://h/c/x");
    }

    // ========== Allocation ==========

    #[tokio::test]
    async fn test_no_hint_gives_uuid() {
        let store = MemoryStore::new();
        let uri = SlugAllocator::default()
            .allocate(&store, &parent(), None)
            .await
            .unwrap();
        let name = uri.as_str().rsplit('/').next().unwrap();
        assert!(uuid::Uuid::parse_str(name).is_ok());
    }

    #[tokio::test]
    async fn test_free_hint_used_as_is() {
        let store = MemoryStore::new();
        let uri = SlugAllocator::default()
            .allocate(&store, &parent(), Some("Report"))
            .await
            .unwrap();
        assert_eq!(uri.as_str(), "http://h/c/report");
    }

    #[tokio::test]
    async fn test_collision_appends_counter() {
        let store = MemoryStore::new();
        occupy(&store, "report").await;
        occupy(&store, "report-1").await;
        let uri = SlugAllocator::default()
            .allocate(&store, &parent(), Some("report"))
            .await
            .unwrap();
        assert_eq!(uri.as_str(), "http://h/c/report-2");
    }

    #[tokio::test]
    async fn test_tombstoned_name_is_taken() {
        let store = MemoryStore::new();
        let uri = child_uri(&parent(), "gone").unwrap();
        store
            .add_statements(vec![Triple::new(
                uri,
                server::DELETED,
                timestamp_literal(Utc::now()),
            )])
            .await
            .unwrap();
        let allocated = SlugAllocator::default()
            .allocate(&store, &parent(), Some("gone"))
            .await
            .unwrap();
        assert_eq!(allocated.as_str(), "http://h/c/gone-1");
    }

    #[tokio::test]
    async fn test_exhausted_sequence_falls_back_to_random_suffix() {
        let store = MemoryStore::new();
        let allocator = SlugAllocator::new(3);
        for name in ["report", "report-1", "report-2"] {
            occupy(&store, name).await;
        }
        let uri = allocator
            .allocate(&store, &parent(), Some("report"))
            .await
            .unwrap();
        let name = uri.as_str().rsplit('/').next().unwrap();
        assert!(name.starts_with("report-"));
        assert_eq!(name.len(), "report-".len() + 8);
        assert!(!["report", "report-1", "report-2"].contains(&name));
    }

    #[tokio::test]
    async fn test_unusable_hint_gives_uuid() {
        let store = MemoryStore::new();
        let uri = SlugAllocator::default()
            .allocate(&store, &parent(), Some("!!!"))
            .await
            .unwrap();
        let name = uri.as_str().rsplit('/').next().unwrap();
        assert!(uuid::Uuid::parse_str(name).is_ok());
    }

    #[test]
    fn test_retry_limit_at_least_one() {
        assert_eq!(SlugAllocator::new(0).retry_limit(), 1);
    }
}
