//! The shared, mutable, in-memory statement store.
//!
//! The store is a disposable derived cache of the relational catalog: empty
//! at startup, bulk-populated, incrementally mutated per entity, and
//! replaceable wholesale. It is deliberately scan-bound: its size is
//! bounded by the catalog, not by request volume, so statements live in a
//! plain vector behind one `RwLock`. Every mutating operation holds the
//! write lock for its entire critical section, so no reader ever observes a
//! partially-updated graph; queries evaluate over a snapshot taken under the
//! read lock.
//!
//! Merging has set semantics with one refinement: a statement whose object
//! is a literal replaces any existing literal statement with the same
//! subject and predicate. Literal-valued properties are single-valued here
//! (a category has one display name, a product one price), and shared nodes
//! are written by many entities, so last-write-wins keeps exactly one value
//! per property on them.

use std::sync::RwLock;

use crate::term::{Iri, Statement, Term};

/// Process-wide shared statement store.
///
/// Inject it (behind the facade) rather than holding it as ambient global
/// state; `Arc` is how callers share it.
#[derive(Debug, Default)]
pub struct GraphStore {
    statements: RwLock<Vec<Statement>>,
}

impl GraphStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            statements: RwLock::new(Vec::new()),
        }
    }

    /// Atomically clear and repopulate from a full set of converted
    /// aggregates. Returns the resulting statement count.
    pub fn bulk_load(&self, statement_sets: Vec<Vec<Statement>>) -> usize {
        let mut statements = self.statements.write().expect("statement lock poisoned");
        statements.clear();
        for set in statement_sets {
            merge(&mut statements, set);
        }
        let count = statements.len();
        tracing::info!(count, "statement store repopulated");
        count
    }

    /// Replace an entity's subgraph: remove every statement where `entity`
    /// appears as subject or object, then merge the freshly converted set.
    /// Atomic with respect to readers.
    pub fn upsert(&self, entity: &Iri, fresh: Vec<Statement>) {
        let mut statements = self.statements.write().expect("statement lock poisoned");
        let before = statements.len();
        statements.retain(|s| !s.mentions(entity));
        let removed = before - statements.len();
        merge(&mut statements, fresh);
        tracing::debug!(
            entity = entity.as_str(),
            removed,
            total = statements.len(),
            "entity subgraph replaced"
        );
    }

    /// Remove an entity and cascade over its review subgraph.
    ///
    /// Review nodes reachable through `has_review` are swept first (every
    /// statement where the review appears as subject or object), then every
    /// statement mentioning the entity itself. Without a `has_review` handle
    /// the cascade is skipped and only the entity sweep runs.
    ///
    /// Returns the number of statements removed.
    pub fn remove_entity(&self, entity: &Iri, has_review: Option<&Iri>) -> usize {
        let mut statements = self.statements.write().expect("statement lock poisoned");
        let before = statements.len();

        match has_review {
            Some(has_review) => {
                let reviews: Vec<Iri> = statements
                    .iter()
                    .filter(|s| s.subject == *entity && s.predicate == *has_review)
                    .filter_map(|s| s.object.as_iri().cloned())
                    .collect();
                statements.retain(|s| !reviews.iter().any(|r| s.mentions(r)));
            }
            None => {
                tracing::warn!(
                    entity = entity.as_str(),
                    "review cascade skipped: has_review term unresolved"
                );
            }
        }

        statements.retain(|s| !s.mentions(entity));
        let removed = before - statements.len();
        tracing::debug!(entity = entity.as_str(), removed, "entity removed");
        removed
    }

    /// A consistent point-in-time copy of the store. Query evaluation runs
    /// against snapshots so it never holds the lock across its own work.
    pub fn snapshot(&self) -> Vec<Statement> {
        self.statements.read().expect("statement lock poisoned").clone()
    }

    /// Number of statements.
    pub fn len(&self) -> usize {
        self.statements.read().expect("statement lock poisoned").len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether an equal statement is present.
    pub fn contains(&self, statement: &Statement) -> bool {
        self.statements
            .read()
            .expect("statement lock poisoned")
            .contains(statement)
    }

    /// Every statement mentioning the given resource. Diagnostic helper for
    /// the host application's admin surface.
    pub fn statements_mentioning(&self, iri: &Iri) -> Vec<Statement> {
        self.statements
            .read()
            .expect("statement lock poisoned")
            .iter()
            .filter(|s| s.mentions(iri))
            .cloned()
            .collect()
    }
}

/// Merge a fresh statement set into the store contents (lock held by caller).
fn merge(statements: &mut Vec<Statement>, fresh: Vec<Statement>) {
    for stmt in fresh {
        if statements.contains(&stmt) {
            continue;
        }
        if matches!(stmt.object, Term::Literal(_)) {
            if let Some(existing) = statements.iter_mut().find(|s| {
                s.subject == stmt.subject
                    && s.predicate == stmt.predicate
                    && matches!(s.object, Term::Literal(_))
            }) {
                existing.object = stmt.object;
                continue;
            }
        }
        statements.push(stmt);
    }
}
