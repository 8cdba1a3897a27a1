//! The resource lifecycle state machine.
//!
//! ```text
//!            create_child / create_or_replace
//!   Absent ─────────────────────────────────▶ Live ◀──┐ create_or_replace
//!                                               │    ─┘ (If-Match required)
//!                                        delete │
//!                                               ▼
//!                                          Tombstoned (terminal)
//! ```
//!
//! Every mutating transition acquires the per-URI scopes of the target and
//! any parent, then re-reads state and evaluates preconditions before it
//! stages changes in a [`Transaction`] and commits once. A request dropped
//! before the commit leaves nothing behind.

use super::containment;
use super::locks::{UriLockGuard, UriLockManager};
use super::slug::{child_uri, SlugAllocator};
use crate::core::codec::{self, RdfFormat};
use crate::core::error::{LdpError, Result};
use crate::core::protocol::{Capabilities, Conditions, ContentNegotiator, Verb, VerbClass};
use crate::core::store::{Pattern, Transaction};
use crate::core::traits::LdpStorage;
use crate::core::types::vocab::{dcterms, ldp, rdf, server, LDP_TYPES};
use crate::core::types::{
    subject_is, term_is, timestamp_literal, ResourceKind, ResourceSnapshot, ResourceState,
};
use bytes::Bytes;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use oxrdf::{NamedNode, Term, Triple};
use std::sync::Arc;

/// Attempts to claim a freshly allocated child name before giving up.
const CLAIM_ATTEMPTS: usize = 4;

/// A request body and how to read it.
#[derive(Clone, Debug)]
pub struct Payload {
    pub body: Bytes,
    pub format: RdfFormat,
    /// Interaction model requested with `Link: <…>; rel="type"`.
    pub interaction_model: Option<ResourceKind>,
}

impl Payload {
    #[must_use]
    pub fn new(body: impl Into<Bytes>, format: RdfFormat) -> Self {
        Self {
            body: body.into(),
            format,
            interaction_model: None,
        }
    }

    #[must_use]
    pub fn with_interaction_model(mut self, kind: Option<ResourceKind>) -> Self {
        self.interaction_model = kind;
        self
    }

    fn kind(&self) -> ResourceKind {
        self.interaction_model.unwrap_or(ResourceKind::RdfSource)
    }
}

/// How the name of a new child is chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChildName {
    /// Let the slug allocator pick, optionally from a hint.
    Suggest(Option<String>),
    /// Use exactly this name; fail with `Conflict` if it is taken.
    Exact(String),
}

/// Result of [`ResourceManager::create_or_replace`].
#[derive(Clone, Debug)]
pub enum PutOutcome {
    Created(ResourceSnapshot),
    Replaced(ResourceSnapshot),
}

impl PutOutcome {
    #[must_use]
    pub fn snapshot(&self) -> &ResourceSnapshot {
        match self {
            PutOutcome::Created(s) | PutOutcome::Replaced(s) => s,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_created(&self) -> bool {
        matches!(self, PutOutcome::Created(_))
    }
}

/// Next `modified` instant: now, or one microsecond past `previous` if the
/// clock has not advanced beyond it.
fn next_modified(previous: Option<DateTime<Utc>>) -> DateTime<Utc> {
    let now = Utc::now().trunc_subsecs(6);
    match previous {
        Some(prev) if now <= prev => prev + Duration::microseconds(1),
        _ => now,
    }
}

/// Statements clients may not write: timestamps, tombstone markers and
/// the server-owned LDP types.
fn is_server_managed(triple: &Triple) -> bool {
    let p = triple.predicate.as_ref();
    if p == dcterms::CREATED || p == dcterms::MODIFIED || p == ldp::CONTAINS {
        return true;
    }
    if p.as_str().starts_with(server::NAMESPACE) {
        return true;
    }
    p == rdf::TYPE
        && (term_is(&triple.object, ldp::RESOURCE)
            || LDP_TYPES.iter().any(|ty| term_is(&triple.object, *ty)))
}

/// Client statements about `uri` plus server stamps for a new state.
///
/// `ldp:contains` links are dropped here; callers carry them over from the
/// stored state after the containment check.
fn stamp(
    submitted: Vec<Triple>,
    uri: &NamedNode,
    kind: ResourceKind,
    created: Option<Term>,
    modified: DateTime<Utc>,
) -> Result<Vec<Triple>> {
    let total = submitted.len();
    let about: Vec<Triple> = submitted
        .into_iter()
        .filter(|t| subject_is(t, uri))
        .collect();
    if about.is_empty() {
        return Err(LdpError::MalformedBody(format!(
            "document does not contain data for {}",
            uri.as_str()
        )));
    }
    if about.len() < total {
        tracing::debug!(
            "ignoring {} statements not about {}",
            total - about.len(),
            uri
        );
    }

    let mut statements: Vec<Triple> = about
        .into_iter()
        .filter(|t| !is_server_managed(t))
        .collect();
    statements.extend(
        kind.type_iris()
            .into_iter()
            .map(|ty| Triple::new(uri.clone(), rdf::TYPE, ty)),
    );
    let modified = timestamp_literal(modified);
    let created = created.unwrap_or_else(|| modified.clone().into());
    statements.push(Triple::new(uri.clone(), dcterms::CREATED, created));
    statements.push(Triple::new(uri.clone(), dcterms::MODIFIED, modified));
    Ok(statements)
}

/// Stage a `modified` bump on `snapshot`.
fn bump_modified(tx: &mut Transaction<'_>, snapshot: &ResourceSnapshot) {
    let next = next_modified(snapshot.modified_at());
    tx.remove(Pattern::subject(snapshot.uri.clone()).with_predicate(dcterms::MODIFIED));
    tx.add([Triple::new(
        snapshot.uri.clone(),
        dcterms::MODIFIED,
        timestamp_literal(next),
    )]);
}

fn reused_tombstone(uri: &NamedNode) -> LdpError {
    tracing::warn!("refusing to reuse tombstoned {}", uri);
    LdpError::Conflict(format!("{} was deleted and cannot be reused", uri.as_str()))
}

/// Container types a parent is missing.
fn missing_container_types(parent: &ResourceSnapshot) -> Vec<Triple> {
    ResourceKind::BasicContainer
        .type_iris()
        .into_iter()
        .filter(|ty| {
            !parent
                .statements
                .iter()
                .any(|t| t.predicate.as_ref() == rdf::TYPE && term_is(&t.object, ty.as_ref()))
        })
        .map(|ty| Triple::new(parent.uri.clone(), rdf::TYPE, ty))
        .collect()
}

/// Drives every lifecycle transition against an injected store.
pub struct ResourceManager {
    store: Arc<dyn LdpStorage>,
    locks: UriLockManager,
    slugs: SlugAllocator,
    negotiator: ContentNegotiator,
}

impl ResourceManager {
    #[must_use]
    pub fn new(store: Arc<dyn LdpStorage>) -> Self {
        Self {
            store,
            locks: UriLockManager::new(),
            slugs: SlugAllocator::default(),
            negotiator: ContentNegotiator::default(),
        }
    }

    #[must_use]
    pub fn with_slug_allocator(mut self, slugs: SlugAllocator) -> Self {
        self.slugs = slugs;
        self
    }

    #[must_use]
    pub fn with_negotiator(mut self, negotiator: ContentNegotiator) -> Self {
        self.negotiator = negotiator;
        self
    }

    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LdpStorage> {
        &self.store
    }

    #[inline]
    #[must_use]
    pub fn negotiator(&self) -> &ContentNegotiator {
        &self.negotiator
    }

    #[inline]
    #[must_use]
    pub fn locks(&self) -> &UriLockManager {
        &self.locks
    }

    // ========== Queries ==========

    /// Read everything known about `uri` in one store call.
    pub async fn snapshot(&self, uri: &NamedNode) -> Result<ResourceSnapshot> {
        let statements = self.store.statements_for(uri).await?;
        Ok(ResourceSnapshot::from_statements(uri.clone(), statements))
    }

    pub async fn state_of(&self, uri: &NamedNode) -> Result<ResourceState> {
        Ok(self.snapshot(uri).await?.state)
    }

    /// Read a live resource.
    ///
    /// # Errors
    ///
    /// `NotFound` unless live; `NotModified` / `PreconditionFailed` from
    /// the conditional headers.
    pub async fn read(&self, uri: &NamedNode, conditions: &Conditions) -> Result<ResourceSnapshot> {
        let snapshot = self.snapshot(uri).await?;
        if !snapshot.state.is_live() {
            return Err(LdpError::NotFound(uri.as_str().to_string()));
        }
        conditions.check(uri.as_str(), snapshot.etag().as_ref(), VerbClass::Read)?;
        Ok(snapshot)
    }

    /// Verbs and formats `uri` accepts right now.
    pub async fn capabilities(&self, uri: &NamedNode) -> Result<(ResourceState, Capabilities)> {
        let state = self.state_of(uri).await?;
        let caps = Capabilities::compose(state, &self.negotiator.input_media_types());
        Ok((state, caps))
    }

    /// Fail unless `snapshot` is a live container that accepts `verb`.
    fn require_container(&self, snapshot: &ResourceSnapshot, verb: Verb) -> Result<()> {
        match snapshot.state {
            ResourceState::Live(kind) if kind.is_container() => Ok(()),
            ResourceState::Live(_) => {
                let caps = Capabilities::compose(snapshot.state, &self.negotiator.input_media_types());
                Err(LdpError::MethodNotAllowed {
                    method: verb.to_string(),
                    uri: snapshot.uri.as_str().to_string(),
                    allowed: caps.allowed_names(),
                })
            }
            ResourceState::Absent | ResourceState::Tombstoned => {
                Err(LdpError::NotFound(snapshot.uri.as_str().to_string()))
            }
        }
    }

    /// Reject `verb` on `uri` from its current state alone, before the
    /// request body is looked at. The transition itself checks again.
    ///
    /// # Errors
    ///
    /// POST and PATCH: `NotFound` or `MethodNotAllowed` unless `uri` is a
    /// live container. PUT: `Conflict` on a tombstone.
    pub async fn ensure_accepts(&self, uri: &NamedNode, verb: Verb) -> Result<()> {
        let snapshot = self.snapshot(uri).await?;
        match verb {
            Verb::Post | Verb::Patch => self.require_container(&snapshot, verb),
            Verb::Put if snapshot.state == ResourceState::Tombstoned => Err(reused_tombstone(uri)),
            _ => Ok(()),
        }
    }

    // ========== Transitions ==========

    /// Create a child inside the container `parent` (POST).
    ///
    /// # Errors
    ///
    /// `NotFound` if the parent is not live, `MethodNotAllowed` if it is not
    /// a container, `Conflict` if an exact name is taken or a payload tries
    /// to set containment, `MalformedBody` if the payload says nothing about
    /// the new resource.
    pub async fn create_child(
        &self,
        parent: &NamedNode,
        name: ChildName,
        payload: Payload,
    ) -> Result<ResourceSnapshot> {
        // Every POST into `parent` holds its scope, so allocation and write
        // cannot race each other; only a direct PUT of the same name can.
        let _parent_scope = self.locks.acquire([parent.as_str()]).await;
        let parent_snapshot = self.snapshot(parent).await?;
        self.require_container(&parent_snapshot, Verb::Post)?;

        for attempt in 1..=CLAIM_ATTEMPTS {
            let uri = match &name {
                ChildName::Exact(exact) => child_uri(parent, exact)?,
                ChildName::Suggest(hint) => {
                    self.slugs
                        .allocate(self.store.as_ref(), parent, hint.as_deref())
                        .await?
                }
            };
            let _child_scope = self.locks.acquire([uri.as_str()]).await;

            let target = self.snapshot(&uri).await?;
            match (&name, target.state) {
                (_, ResourceState::Absent) => {}
                (ChildName::Exact(_), ResourceState::Tombstoned) => {
                    return Err(reused_tombstone(&uri));
                }
                (ChildName::Exact(_), ResourceState::Live(_)) => {
                    return Err(LdpError::Conflict(format!("{} already exists", uri.as_str())));
                }
                (ChildName::Suggest(_), _) => {
                    tracing::debug!("lost race for {} (attempt {})", uri, attempt);
                    continue;
                }
            }

            let submitted = codec::parse(&payload.body, payload.format, &uri)?;
            containment::enforce(&submitted, &[], &uri)?;
            let statements = stamp(submitted, &uri, payload.kind(), None, next_modified(None))?;

            let mut tx = Transaction::new(self.store.as_ref());
            tx.add(statements.iter().cloned());
            tx.add(missing_container_types(&parent_snapshot));
            tx.add([Triple::new(parent.clone(), ldp::CONTAINS, uri.clone())]);
            bump_modified(&mut tx, &parent_snapshot);
            tx.commit().await?;

            tracing::info!("created {} in {}", uri, parent);
            return Ok(ResourceSnapshot::from_statements(uri, statements));
        }

        Err(LdpError::Conflict(format!(
            "could not claim a child name under {} after {} attempts",
            parent.as_str(),
            CLAIM_ATTEMPTS
        )))
    }

    /// Create `uri` directly or replace its representation (PUT).
    ///
    /// # Errors
    ///
    /// `Conflict` for tombstones and containment changes,
    /// `PreconditionRequired` / `PreconditionFailed` on replace,
    /// `MalformedBody` for unusable payloads.
    pub async fn create_or_replace(
        &self,
        uri: &NamedNode,
        payload: Payload,
        conditions: &Conditions,
    ) -> Result<PutOutcome> {
        let _scope = self.locks.acquire([uri.as_str()]).await;
        let current = self.snapshot(uri).await?;

        match current.state {
            ResourceState::Tombstoned => Err(reused_tombstone(uri)),
            ResourceState::Absent => {
                conditions.check(uri.as_str(), None, VerbClass::Write)?;
                let submitted = codec::parse(&payload.body, payload.format, uri)?;
                containment::enforce(&submitted, &[], uri)?;
                let statements = stamp(submitted, uri, payload.kind(), None, next_modified(None))?;

                let mut tx = Transaction::new(self.store.as_ref());
                tx.add(statements.iter().cloned());
                tx.commit().await?;

                tracing::info!("created {}", uri);
                Ok(PutOutcome::Created(ResourceSnapshot::from_statements(
                    uri.clone(),
                    statements,
                )))
            }
            ResourceState::Live(kind) => {
                conditions.require_if_match(uri.as_str())?;
                if let Err(err) =
                    conditions.check(uri.as_str(), current.etag().as_ref(), VerbClass::Write)
                {
                    tracing::warn!("precondition failed on {}", uri);
                    return Err(err);
                }
                let submitted = codec::parse(&payload.body, payload.format, uri)?;
                containment::enforce(&submitted, &current.statements, uri)?;

                let mut statements = stamp(
                    submitted,
                    uri,
                    kind,
                    current.created().cloned(),
                    next_modified(current.modified_at()),
                )?;
                statements.extend(
                    current
                        .statements
                        .iter()
                        .filter(|t| t.predicate.as_ref() == ldp::CONTAINS)
                        .cloned(),
                );

                let mut tx = Transaction::new(self.store.as_ref());
                tx.remove(Pattern::subject(uri.clone()));
                tx.add(statements.iter().cloned());
                tx.commit().await?;

                tracing::info!("replaced {}", uri);
                Ok(PutOutcome::Replaced(ResourceSnapshot::from_statements(
                    uri.clone(),
                    statements,
                )))
            }
        }
    }

    /// Hold the scopes of `uri` and of every container linking to it.
    ///
    /// A create of `uri` may add a parent link between the lookup and the
    /// acquisition, so the set is read again under the scopes and the
    /// acquisition repeated until it is stable. Once `uri`'s scope is held
    /// no new link can appear.
    async fn lock_with_parents(&self, uri: &NamedNode) -> Result<(UriLockGuard, Vec<NamedNode>)> {
        let contains: NamedNode = ldp::CONTAINS.into_owned();
        let child: Term = uri.clone().into();
        let mut parents = self.store.subjects_for(&contains, &child).await?;
        parents.sort_by(|a, b| a.as_str().cmp(b.as_str()));

        for attempt in 1..=CLAIM_ATTEMPTS {
            let keys: Vec<&str> = std::iter::once(uri.as_str())
                .chain(parents.iter().map(NamedNode::as_str))
                .collect();
            let scope = self.locks.acquire(keys).await;

            let mut linked = self.store.subjects_for(&contains, &child).await?;
            linked.sort_by(|a, b| a.as_str().cmp(b.as_str()));
            if linked == parents {
                return Ok((scope, parents));
            }
            tracing::debug!(
                "containers of {} changed while locking (attempt {})",
                uri,
                attempt
            );
            drop(scope);
            parents = linked;
        }

        Err(LdpError::Conflict(format!(
            "containers of {} kept changing during delete",
            uri.as_str()
        )))
    }

    /// Tombstone `uri` and unlink it from its containers (DELETE).
    ///
    /// Children of a deleted container stay live.
    ///
    /// # Errors
    ///
    /// `NotFound` unless live; `PreconditionFailed` if conditions are given
    /// and do not hold.
    pub async fn delete(&self, uri: &NamedNode, conditions: &Conditions) -> Result<()> {
        let contains: NamedNode = ldp::CONTAINS.into_owned();
        let child: Term = uri.clone().into();
        let (_scope, parents) = self.lock_with_parents(uri).await?;

        let current = self.snapshot(uri).await?;
        if !current.state.is_live() {
            return Err(LdpError::NotFound(uri.as_str().to_string()));
        }
        if let Err(err) = conditions.check(uri.as_str(), current.etag().as_ref(), VerbClass::Write)
        {
            tracing::warn!("precondition failed on delete of {}", uri);
            return Err(err);
        }

        let parent_snapshots =
            futures::future::try_join_all(parents.iter().map(|p| self.snapshot(p))).await?;

        let mut tx = Transaction::new(self.store.as_ref());
        tx.remove(Pattern::subject(uri.clone()));
        for (parent, parent_snapshot) in parents.iter().zip(&parent_snapshots) {
            tx.remove(
                Pattern::subject(parent.clone())
                    .with_predicate(contains.clone())
                    .with_object(child.clone()),
            );
            bump_modified(&mut tx, parent_snapshot);
        }
        tx.add([Triple::new(
            uri.clone(),
            server::DELETED,
            timestamp_literal(next_modified(current.modified_at())),
        )]);
        tx.commit().await?;

        tracing::info!("deleted {} ({} containers updated)", uri, parents.len());
        Ok(())
    }

    /// Partial update is not implemented: a live container accepts PATCH as
    /// a no-op, anything else rejects it.
    pub async fn patch(&self, uri: &NamedNode, conditions: &Conditions) -> Result<ResourceSnapshot> {
        let current = self.snapshot(uri).await?;
        self.require_container(&current, Verb::Patch)?;
        conditions.check(uri.as_str(), current.etag().as_ref(), VerbClass::Write)?;
        tracing::debug!("PATCH on {} accepted without changes", uri);
        Ok(current)
    }

    /// Ensure `uri` is a live container; creates it if absent.
    ///
    /// Returns `true` if anything was written.
    ///
    /// # Errors
    ///
    /// `Conflict` if `uri` is tombstoned.
    pub async fn bootstrap_container(&self, uri: &NamedNode) -> Result<bool> {
        let _scope = self.locks.acquire([uri.as_str()]).await;
        let current = self.snapshot(uri).await?;
        match current.state {
            ResourceState::Tombstoned => Err(LdpError::Conflict(format!(
                "container {} was deleted",
                uri.as_str()
            ))),
            ResourceState::Live(ResourceKind::BasicContainer) => Ok(false),
            ResourceState::Live(ResourceKind::RdfSource) => {
                let mut tx = Transaction::new(self.store.as_ref());
                tx.add(missing_container_types(&current));
                bump_modified(&mut tx, &current);
                tx.commit().await?;
                tracing::info!("promoted {} to a container", uri);
                Ok(true)
            }
            ResourceState::Absent => {
                let now = timestamp_literal(next_modified(None));
                let mut statements: Vec<Triple> = ResourceKind::BasicContainer
                    .type_iris()
                    .into_iter()
                    .map(|ty| Triple::new(uri.clone(), rdf::TYPE, ty))
                    .collect();
                statements.push(Triple::new(uri.clone(), dcterms::CREATED, now.clone()));
                statements.push(Triple::new(uri.clone(), dcterms::MODIFIED, now));
                self.store.add_statements(statements).await?;
                tracing::info!("bootstrapped container {}", uri);
                Ok(true)
            }
        }
    }
}
