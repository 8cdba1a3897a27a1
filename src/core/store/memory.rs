//! In-process graph store.

use super::{Change, ChangeSet, Pattern};
use crate::core::error::{LdpError, Result};
use crate::core::traits::LdpStorage;
use async_trait::async_trait;
use oxrdf::{NamedNode, NamedOrBlankNode, Term, Triple};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Statements indexed by subject, with set semantics.
///
/// A whole change set is applied under one write lock, so readers never
/// observe a partial mutation. [`set_available`](Self::set_available)
/// simulates a backend outage: while offline every call fails with
/// [`LdpError::StorageUnavailable`].
#[derive(Debug)]
pub struct MemoryStore {
    graph: RwLock<HashMap<NamedOrBlankNode, Vec<Triple>>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Total number of statements held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.graph.read().values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            tracing::error!("memory store is offline");
            Err(LdpError::StorageUnavailable("memory store is offline".into()))
        }
    }

    fn key(subject: &NamedNode) -> NamedOrBlankNode {
        NamedOrBlankNode::NamedNode(subject.clone())
    }
}

fn remove_matching(graph: &mut HashMap<NamedOrBlankNode, Vec<Triple>>, pattern: &Pattern) {
    match &pattern.subject {
        Some(subject) => {
            if let Some(statements) = graph.get_mut(subject) {
                statements.retain(|t| !pattern.matches(t));
                if statements.is_empty() {
                    graph.remove(subject);
                }
            }
        }
        None => {
            graph.retain(|_, statements| {
                statements.retain(|t| !pattern.matches(t));
                !statements.is_empty()
            });
        }
    }
}

#[async_trait]
impl LdpStorage for MemoryStore {
    async fn exists(&self, subject: &NamedNode) -> Result<bool> {
        self.check_available()?;
        Ok(self.graph.read().contains_key(&Self::key(subject)))
    }

    async fn has_statement(
        &self,
        subject: &NamedNode,
        predicate: &NamedNode,
        object: Option<&Term>,
    ) -> Result<bool> {
        self.check_available()?;
        let graph = self.graph.read();
        Ok(graph.get(&Self::key(subject)).is_some_and(|statements| {
            statements
                .iter()
                .any(|t| t.predicate == *predicate && object.map_or(true, |o| t.object == *o))
        }))
    }

    async fn statements_for(&self, subject: &NamedNode) -> Result<Vec<Triple>> {
        self.check_available()?;
        Ok(self
            .graph
            .read()
            .get(&Self::key(subject))
            .cloned()
            .unwrap_or_default())
    }

    async fn value_of(&self, subject: &NamedNode, predicate: &NamedNode) -> Result<Option<Term>> {
        self.check_available()?;
        let graph = self.graph.read();
        Ok(graph.get(&Self::key(subject)).and_then(|statements| {
            statements
                .iter()
                .find(|t| t.predicate == *predicate)
                .map(|t| t.object.clone())
        }))
    }

    async fn subjects_for(&self, predicate: &NamedNode, object: &Term) -> Result<Vec<NamedNode>> {
        self.check_available()?;
        let graph = self.graph.read();
        let mut subjects: Vec<NamedNode> = graph
            .iter()
            .filter(|(_, statements)| {
                statements
                    .iter()
                    .any(|t| t.predicate == *predicate && t.object == *object)
            })
            .filter_map(|(subject, _)| match subject {
                NamedOrBlankNode::NamedNode(n) => Some(n.clone()),
                NamedOrBlankNode::BlankNode(_) => None,
            })
            .collect();
        subjects.sort();
        Ok(subjects)
    }

    async fn apply(&self, changes: ChangeSet) -> Result<()> {
        self.check_available()?;
        let mut graph = self.graph.write();
        for change in changes {
            match change {
                Change::Add(statements) => {
                    for triple in statements {
                        let entry = graph.entry(triple.subject.clone()).or_default();
                        if !entry.contains(&triple) {
                            entry.push(triple);
                        }
                    }
                }
                Change::Remove(pattern) => remove_matching(&mut graph, &pattern),
            }
        }
        Ok(())
    }
}
