//! Storage-side building blocks: statement patterns, change sets and
//! transactions, plus the in-memory [`MemoryStore`].
//!
//! Every multi-step mutation in the engine is staged in a [`Transaction`]
//! and published with a single [`LdpStorage::apply`] call, so a reader sees
//! either none or all of it. Dropping a transaction without committing it
//! (an early `?` return, a cancelled request future) discards the staged
//! changes.

mod memory;

pub use memory::MemoryStore;

use crate::core::error::Result;
use crate::core::traits::LdpStorage;
use oxrdf::{NamedNode, NamedOrBlankNode, Term, Triple};

/// Triple pattern; `None` positions match anything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Pattern {
    pub subject: Option<NamedOrBlankNode>,
    pub predicate: Option<NamedNode>,
    pub object: Option<Term>,
}

impl Pattern {
    /// Every statement about `subject`.
    #[must_use]
    pub fn subject(subject: impl Into<NamedOrBlankNode>) -> Self {
        Self {
            subject: Some(subject.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: impl Into<NamedNode>) -> Self {
        self.predicate = Some(predicate.into());
        self
    }

    #[must_use]
    pub fn with_object(mut self, object: impl Into<Term>) -> Self {
        self.object = Some(object.into());
        self
    }

    #[must_use]
    pub fn matches(&self, triple: &Triple) -> bool {
        self.subject.as_ref().map_or(true, |s| *s == triple.subject)
            && self.predicate.as_ref().map_or(true, |p| *p == triple.predicate)
            && self.object.as_ref().map_or(true, |o| *o == triple.object)
    }
}

/// One staged mutation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Change {
    Add(Vec<Triple>),
    Remove(Pattern),
}

/// Ordered list of mutations applied as one unit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    changes: Vec<Change>,
}

impl ChangeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, statements: impl IntoIterator<Item = Triple>) -> &mut Self {
        let statements: Vec<Triple> = statements.into_iter().collect();
        if !statements.is_empty() {
            self.changes.push(Change::Add(statements));
        }
        self
    }

    pub fn remove(&mut self, pattern: Pattern) -> &mut Self {
        self.changes.push(Change::Remove(pattern));
        self
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter()
    }
}

impl IntoIterator for ChangeSet {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}

/// Scoped, all-or-nothing group of changes against one store.
///
/// Reads issued through the store while a transaction is open see the
/// committed state only; the engine serialises writers per URI, so the
/// staged changes never need to be visible before commit.
pub struct Transaction<'a> {
    store: &'a dyn LdpStorage,
    changes: ChangeSet,
    committed: bool,
}

impl<'a> Transaction<'a> {
    #[must_use]
    pub fn new(store: &'a dyn LdpStorage) -> Self {
        Self {
            store,
            changes: ChangeSet::new(),
            committed: false,
        }
    }

    pub fn add(&mut self, statements: impl IntoIterator<Item = Triple>) -> &mut Self {
        self.changes.add(statements);
        self
    }

    pub fn remove(&mut self, pattern: Pattern) -> &mut Self {
        self.changes.remove(pattern);
        self
    }

    /// Staged changes so far.
    #[must_use]
    pub fn pending(&self) -> &ChangeSet {
        &self.changes
    }

    /// Publish every staged change at once.
    ///
    /// # Errors
    ///
    /// Whatever the store's `apply` returns; nothing is applied on error.
    pub async fn commit(mut self) -> Result<()> {
        let changes = std::mem::take(&mut self.changes);
        let count = changes.len();
        self.store.apply(changes).await?;
        self.committed = true;
        tracing::debug!("committed transaction with {} changes", count);
        Ok(())
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.committed && !self.changes.is_empty() {
            tracing::debug!(
                "discarding uncommitted transaction with {} changes",
                self.changes.len()
            );
        }
    }
}
