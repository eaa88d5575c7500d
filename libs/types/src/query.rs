//! The query graph: named questions, the nodes that implement them, and the
//! dependency choices between them.

use std::collections::{HashMap, HashSet};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use thiserror::Error;

use crate::matching::MatchingRequirements;
use crate::node::Node;

/// Graph construction failure. Only the metadata loader builds queries, so
/// these surface as metadata errors with file context attached.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryGraphError {
    #[error("node {node} already implements query {query} with these matching requirements")]
    DuplicateImplementor { query: String, node: String },

    #[error("query {query} already has an identical dependency choice")]
    DuplicateChoice { query: String },

    #[error("a dependency choice for query {query} names no required queries")]
    EmptyChoice { query: String },
}

/// A node that implements a query, together with that node's matching
/// requirements (if it declared any).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Implementor {
    node: Arc<Node>,
    matching: Option<MatchingRequirements>,
}

impl Implementor {
    pub fn node(&self) -> &Arc<Node> {
        &self.node
    }

    pub fn matching_requirements(&self) -> Option<&MatchingRequirements> {
        self.matching.as_ref()
    }
}

/// One alternative way to satisfy a query's dependencies: an ordered list of
/// required queries, all of which must be answered.
///
/// The list is held in canonical order (lexicographic by query name), so two
/// choices that differ only in input ordering are the same choice. A query
/// may legitimately be required more than once, so this is a list, not a
/// set.
#[derive(Debug, Clone)]
pub struct Choice {
    queries: Vec<Arc<Query>>,
}

impl Choice {
    pub fn queries(&self) -> &[Arc<Query>] {
        &self.queries
    }

    pub fn query_names(&self) -> impl Iterator<Item = &str> {
        self.queries.iter().map(|q| q.name())
    }
}

// Query names are unique within a snapshot, so the canonicalised name
// projection identifies a choice.
impl PartialEq for Choice {
    fn eq(&self, other: &Self) -> bool {
        self.queries.len() == other.queries.len()
            && self
                .query_names()
                .zip(other.query_names())
                .all(|(a, b)| a == b)
    }
}

impl Eq for Choice {}

impl Hash for Choice {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for name in self.query_names() {
            name.hash(state);
        }
    }
}

/// A question that can be asked of the federation.
///
/// Queries cannot be constructed by users; they are obtained by looking them
/// up in a loaded [`Federation`](crate::Federation) snapshot. The loader
/// populates implementors and choices before the query is interned; after
/// interning the query sits behind an `Arc` and is never mutated.
#[derive(Debug, Default)]
pub struct Query {
    name: String,
    implementors: HashSet<Implementor>,
    by_node: HashMap<Arc<Node>, HashSet<Implementor>>,
    by_matching: HashMap<Option<MatchingRequirements>, HashSet<Implementor>>,
    choices: HashSet<Choice>,
}

impl Query {
    /// The name may be any UTF-8 string; uniqueness is enforced by the
    /// loader when the query is interned.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record that `node` implements this query with the given matching
    /// requirements, updating both secondary indices. The same node may
    /// appear again only with distinct matching requirements.
    pub fn add_implementor(
        &mut self,
        node: Arc<Node>,
        matching: Option<MatchingRequirements>,
    ) -> Result<(), QueryGraphError> {
        let implementor = Implementor {
            node: Arc::clone(&node),
            matching: matching.clone(),
        };

        if !self.implementors.insert(implementor.clone()) {
            return Err(QueryGraphError::DuplicateImplementor {
                query: self.name.clone(),
                node: node.name().to_string(),
            });
        }

        // Uniqueness in the primary set guarantees uniqueness in both
        // indices, so these inserts cannot fail.
        self.by_node
            .entry(node)
            .or_default()
            .insert(implementor.clone());
        self.by_matching
            .entry(matching)
            .or_default()
            .insert(implementor);

        Ok(())
    }

    /// Add a dependency choice. The list is canonicalised (sorted by query
    /// name) before insertion; a choice identical under canonicalisation to
    /// an existing one is rejected.
    pub fn add_choice(&mut self, mut queries: Vec<Arc<Query>>) -> Result<(), QueryGraphError> {
        if queries.is_empty() {
            return Err(QueryGraphError::EmptyChoice {
                query: self.name.clone(),
            });
        }

        queries.sort_by(|a, b| a.name().cmp(b.name()));

        if !self.choices.insert(Choice { queries }) {
            return Err(QueryGraphError::DuplicateChoice {
                query: self.name.clone(),
            });
        }

        Ok(())
    }

    pub fn implementors(&self) -> impl Iterator<Item = &Implementor> {
        self.implementors.iter()
    }

    pub fn implementor_count(&self) -> usize {
        self.implementors.len()
    }

    /// The implementors contributed by one particular node.
    pub fn implementors_for_node(&self, node: &Arc<Node>) -> Option<&HashSet<Implementor>> {
        self.by_node.get(node)
    }

    /// The implementors sharing one particular set of matching requirements.
    pub fn implementors_for_matching(
        &self,
        matching: &Option<MatchingRequirements>,
    ) -> Option<&HashSet<Implementor>> {
        self.by_matching.get(matching)
    }

    pub fn choices(&self) -> impl Iterator<Item = &Choice> {
        self.choices.iter()
    }

    pub fn choice_count(&self) -> usize {
        self.choices.len()
    }
}
