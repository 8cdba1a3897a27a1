use crate::core::error::Result;
use crate::core::store::{ChangeSet, Pattern};
use async_trait::async_trait;
use oxrdf::{NamedNode, Term, Triple};

/// Abstraction for the graph store holding every resource.
///
/// Implementations must make [`apply`](LdpStorage::apply) all-or-nothing:
/// a concurrent reader observes either none or all of a change set.
/// Backend failures are reported as
/// [`LdpError::StorageUnavailable`](crate::core::error::LdpError::StorageUnavailable).
#[async_trait]
pub trait LdpStorage: Send + Sync + 'static {
    /// True if any statement has `subject` as subject. Tombstones count.
    async fn exists(&self, subject: &NamedNode) -> Result<bool>;

    /// True if a statement matches; `object: None` matches any object.
    async fn has_statement(
        &self,
        subject: &NamedNode,
        predicate: &NamedNode,
        object: Option<&Term>,
    ) -> Result<bool>;

    /// All statements with `subject` as subject.
    async fn statements_for(&self, subject: &NamedNode) -> Result<Vec<Triple>>;

    /// First object of `subject predicate ?o`, if any.
    async fn value_of(&self, subject: &NamedNode, predicate: &NamedNode) -> Result<Option<Term>>;

    /// Named subjects of `?s predicate object`.
    async fn subjects_for(&self, predicate: &NamedNode, object: &Term) -> Result<Vec<NamedNode>>;

    /// Add statements in one step.
    async fn add_statements(&self, statements: Vec<Triple>) -> Result<()> {
        let mut changes = ChangeSet::new();
        changes.add(statements);
        self.apply(changes).await
    }

    /// Remove every statement matching `pattern`.
    async fn remove_statements(&self, pattern: Pattern) -> Result<()> {
        let mut changes = ChangeSet::new();
        changes.remove(pattern);
        self.apply(changes).await
    }

    /// Apply a change set atomically, in order.
    async fn apply(&self, changes: ChangeSet) -> Result<()>;
}
