//! The federation snapshot: every peer, attribute, agreement, and query
//! described by one metadata file, fully resolved.

use std::collections::HashMap;
use std::sync::Arc;

use crate::agreement::Agreement;
use crate::matching::ConfidenceAttribute;
use crate::node::Node;
use crate::query::Query;

/// An immutable, fully-resolved view of a federation metadata file.
///
/// Built by the metadata loader and then shared read-only across every
/// worker bound to it. There is no reload: a new snapshot is built from the
/// new file and published in place of the old one, and workers drain on
/// whichever snapshot they started with.
///
/// Every reference inside the snapshot resolves within the snapshot: an
/// implementor's node, a matching requirement's confidence attribute, and a
/// choice's required query all point at entries of these maps.
#[derive(Debug)]
pub struct Federation {
    origin: String,
    nodes: HashMap<String, Arc<Node>>,
    nodes_by_key: HashMap<Vec<u8>, Arc<Node>>,
    confidence: HashMap<String, Arc<ConfidenceAttribute>>,
    agreements: HashMap<String, Arc<Agreement>>,
    queries: HashMap<String, Arc<Query>>,
}

impl Federation {
    /// Assemble a snapshot from fully-resolved parts. Only the metadata
    /// loader calls this; the maps must already satisfy the snapshot
    /// invariants (unique names, unique TLS keys, total resolution).
    pub fn new(
        origin: impl Into<String>,
        nodes: HashMap<String, Arc<Node>>,
        nodes_by_key: HashMap<Vec<u8>, Arc<Node>>,
        confidence: HashMap<String, Arc<ConfidenceAttribute>>,
        agreements: HashMap<String, Arc<Agreement>>,
        queries: HashMap<String, Arc<Query>>,
    ) -> Self {
        Self {
            origin: origin.into(),
            nodes,
            nodes_by_key,
            confidence,
            agreements,
            queries,
        }
    }

    /// The metadata file this snapshot was loaded from, for diagnostics.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn find_node(&self, name: &str) -> Option<&Arc<Node>> {
        self.nodes.get(name)
    }

    /// Look a peer up by the TLS public key it presented.
    pub fn find_node_by_key(&self, tls_key: &[u8]) -> Option<&Arc<Node>> {
        self.nodes_by_key.get(tls_key)
    }

    pub fn find_confidence_attribute(&self, name: &str) -> Option<&Arc<ConfidenceAttribute>> {
        self.confidence.get(name)
    }

    pub fn find_agreement(&self, justification: &str) -> Option<&Arc<Agreement>> {
        self.agreements.get(justification)
    }

    pub fn find_query(&self, name: &str) -> Option<&Arc<Query>> {
        self.queries.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.nodes.values()
    }

    pub fn queries(&self) -> impl Iterator<Item = &Arc<Query>> {
        self.queries.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn query_count(&self) -> usize {
        self.queries.len()
    }

    pub fn agreement_count(&self) -> usize {
        self.agreements.len()
    }
}
