//! The loader: decode, validate, intern, resolve.
//!
//! Each phase completes before the next begins, so later phases resolve
//! references only against data the earlier phases have already sanitised:
//!
//! 1. decode the root Federation record;
//! 2. intern nodes (by name and by TLS key);
//! 3. intern agreements;
//! 4. intern confidence attributes;
//! 5. build queries in declaration order, resolving implementing nodes
//!    against phase 2, confidence builders against phase 4, and choice
//!    dependencies against the queries built *so far*.
//!
//! Step 5's resolution rule is deliberate: a choice can only require
//! queries declared earlier in the file. That forbids forward references
//! and cycles, making the query graph a DAG by construction.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, warn};

use aquae_codec::metadata::{MatchingSpecRecord, QuerySpecRecord};
use aquae_codec::FederationRecord;
use aquae_types::{
    Agreement, ConfidenceAttribute, Federation, IdentityAttribute, MatchingRequirements, Node,
    Query,
};

use crate::error::MetadataError;

/// Load, validate and internalise a metadata file.
pub fn load(path: impl AsRef<Path>) -> Result<Federation, MetadataError> {
    let file = path.as_ref().display().to_string();
    let bytes = std::fs::read(path.as_ref()).map_err(|source| MetadataError::Io {
        file: file.clone(),
        source,
    })?;
    from_bytes(&bytes, &file)
}

/// Load from an in-memory buffer. `origin` names the buffer in diagnostics
/// and in the snapshot.
pub fn from_bytes(bytes: &[u8], origin: &str) -> Result<Federation, MetadataError> {
    let record = FederationRecord::decode(bytes).map_err(|source| MetadataError::Decode {
        file: origin.to_string(),
        source,
    })?;

    let (nodes, nodes_by_key) = intern_nodes(&record, origin)?;
    let agreements = intern_agreements(&record, origin);
    let confidence = intern_confidence_attributes(&record, origin)?;
    let queries = build_queries(&record, origin, &nodes, &confidence)?;

    debug!(
        file = origin,
        nodes = nodes.len(),
        agreements = agreements.len(),
        confidence_attributes = confidence.len(),
        queries = queries.len(),
        "metadata snapshot loaded"
    );

    Ok(Federation::new(
        origin,
        nodes,
        nodes_by_key,
        confidence,
        agreements,
        queries,
    ))
}

type NodeMaps = (
    HashMap<String, Arc<Node>>,
    HashMap<Vec<u8>, Arc<Node>>,
);

/// Nodes are straightforward: they reference nothing else in the file.
fn intern_nodes(record: &FederationRecord, file: &str) -> Result<NodeMaps, MetadataError> {
    let mut nodes: HashMap<String, Arc<Node>> = HashMap::new();
    let mut by_key: HashMap<Vec<u8>, Arc<Node>> = HashMap::new();

    for (index, raw) in record.nodes.iter().enumerate() {
        let missing = |name: String, field: &'static str| MetadataError::MissingField {
            file: file.to_string(),
            record: "node",
            name,
            field,
        };

        let name = raw
            .name
            .clone()
            .ok_or_else(|| missing(format!("#{index}"), "name"))?;
        let location = raw
            .location
            .as_ref()
            .ok_or_else(|| missing(name.clone(), "location"))?;
        let hostname = location
            .hostname
            .clone()
            .ok_or_else(|| missing(name.clone(), "hostname"))?;
        let port = location
            .port
            .ok_or_else(|| missing(name.clone(), "port number"))?;
        let certificate = raw
            .certificate
            .clone()
            .ok_or_else(|| missing(name.clone(), "public key certificate"))?;

        let node = Arc::new(Node::new(name.clone(), hostname, port, certificate).map_err(|source| {
            MetadataError::InvalidField {
                file: file.to_string(),
                record: "node",
                name: name.clone(),
                source,
            }
        })?);

        if nodes.insert(name.clone(), Arc::clone(&node)).is_some() {
            return Err(MetadataError::DuplicateNode {
                file: file.to_string(),
                name,
            });
        }

        if let Some(previous) = by_key.insert(node.tls_key().to_vec(), node) {
            return Err(MetadataError::DuplicateTlsKey {
                file: file.to_string(),
                name,
                other: previous.name().to_string(),
            });
        }
    }

    debug!(file, nodes = nodes.len(), "interned nodes");
    Ok((nodes, by_key))
}

/// Agreement semantics downstream are still stubbed, but the snapshot keeps
/// a keyed map so queries can be cross-referenced to them. Records that
/// cannot be keyed are dropped with a warning rather than failing the load.
fn intern_agreements(record: &FederationRecord, file: &str) -> HashMap<String, Arc<Agreement>> {
    let mut agreements: HashMap<String, Arc<Agreement>> = HashMap::new();

    for (index, raw) in record.agreements.iter().enumerate() {
        let Some(justification) = raw.justification.clone() else {
            warn!(file, index, "agreement declaration has no justification, skipping");
            continue;
        };
        if agreements.contains_key(&justification) {
            warn!(
                file,
                %justification,
                "agreement justification appears more than once, keeping the first"
            );
            continue;
        }
        agreements.insert(justification.clone(), Arc::new(Agreement::new(justification)));
    }

    debug!(file, agreements = agreements.len(), "interned agreements");
    agreements
}

/// Confidence attributes reference nothing else in the file.
fn intern_confidence_attributes(
    record: &FederationRecord,
    file: &str,
) -> Result<HashMap<String, Arc<ConfidenceAttribute>>, MetadataError> {
    let mut attributes: HashMap<String, Arc<ConfidenceAttribute>> = HashMap::new();

    for (index, raw) in record.confidence_attributes.iter().enumerate() {
        let missing = |name: String, field: &'static str| MetadataError::MissingField {
            file: file.to_string(),
            record: "confidence attribute",
            name,
            field,
        };

        let name = raw
            .name
            .clone()
            .ok_or_else(|| missing(format!("#{index}"), "name"))?;
        let description = raw
            .description
            .clone()
            .ok_or_else(|| missing(name.clone(), "description"))?;

        let attribute = Arc::new(ConfidenceAttribute::new(name.clone(), description));
        if attributes.insert(name.clone(), attribute).is_some() {
            return Err(MetadataError::DuplicateConfidenceAttribute {
                file: file.to_string(),
                name,
            });
        }
    }

    debug!(
        file,
        confidence_attributes = attributes.len(),
        "interned confidence attributes"
    );
    Ok(attributes)
}

/// Queries are processed in declaration order. For each query the
/// implementing nodes are found in the already-interned node map, and each
/// choice's required queries are found in the map of queries built so far.
fn build_queries(
    record: &FederationRecord,
    file: &str,
    nodes: &HashMap<String, Arc<Node>>,
    confidence: &HashMap<String, Arc<ConfidenceAttribute>>,
) -> Result<HashMap<String, Arc<Query>>, MetadataError> {
    let mut queries: HashMap<String, Arc<Query>> = HashMap::new();

    for (index, raw) in record.queries.iter().enumerate() {
        let name = raw.name.clone().ok_or_else(|| MetadataError::MissingField {
            file: file.to_string(),
            record: "query",
            name: format!("#{index}"),
            field: "name",
        })?;

        if queries.contains_key(&name) {
            return Err(MetadataError::DuplicateQuery {
                file: file.to_string(),
                name,
            });
        }

        let query = build_query(raw, &name, file, nodes, confidence, &queries)?;
        queries.insert(name, Arc::new(query));
    }

    debug!(file, queries = queries.len(), "built query graph");
    Ok(queries)
}

fn build_query(
    raw: &QuerySpecRecord,
    name: &str,
    file: &str,
    nodes: &HashMap<String, Arc<Node>>,
    confidence: &HashMap<String, Arc<ConfidenceAttribute>>,
    interned: &HashMap<String, Arc<Query>>,
) -> Result<Query, MetadataError> {
    if raw.implementors.is_empty() {
        return Err(MetadataError::NoImplementors {
            file: file.to_string(),
            query: name.to_string(),
        });
    }

    let mut query = Query::new(name);

    for implementor in &raw.implementors {
        let node_id = implementor
            .node_id
            .clone()
            .ok_or_else(|| MetadataError::MissingField {
                file: file.to_string(),
                record: "implementing node clause",
                name: name.to_string(),
                field: "node id",
            })?;

        let node = nodes
            .get(&node_id)
            .ok_or_else(|| MetadataError::UnresolvedNode {
                file: file.to_string(),
                query: name.to_string(),
                node: node_id,
            })?;

        let matching = implementor
            .matching
            .as_ref()
            .map(|spec| build_matching_requirements(spec, name, file, confidence))
            .transpose()?;

        query
            .add_implementor(Arc::clone(node), matching)
            .map_err(|source| MetadataError::Graph {
                file: file.to_string(),
                source,
            })?;
    }

    for choice in &raw.choices {
        if choice.required_queries.is_empty() {
            return Err(MetadataError::MissingField {
                file: file.to_string(),
                record: "choice",
                name: name.to_string(),
                field: "required query name(s)",
            });
        }

        let mut resolved = Vec::with_capacity(choice.required_queries.len());
        for required in &choice.required_queries {
            let target =
                interned
                    .get(required)
                    .ok_or_else(|| MetadataError::UnresolvedRequiredQuery {
                        file: file.to_string(),
                        query: name.to_string(),
                        required: required.clone(),
                    })?;
            resolved.push(Arc::clone(target));
        }

        query
            .add_choice(resolved)
            .map_err(|source| MetadataError::Graph {
                file: file.to_string(),
                source,
            })?;
    }

    Ok(query)
}

/// An empty list in the file decodes as an absent set: the schema cannot
/// distinguish the two, and the model treats absent as "nothing declared".
fn build_matching_requirements(
    spec: &MatchingSpecRecord,
    query: &str,
    file: &str,
    confidence: &HashMap<String, Arc<ConfidenceAttribute>>,
) -> Result<MatchingRequirements, MetadataError> {
    let required = collect_attributes(&spec.required, query, file, "required field")?;
    let disambiguators =
        collect_attributes(&spec.disambiguators, query, file, "disambiguator field")?;

    let confidence_set = if spec.confidence_builders.is_empty() {
        None
    } else {
        let mut set: BTreeSet<ConfidenceAttribute> = BTreeSet::new();
        for builder in &spec.confidence_builders {
            let attribute = confidence.get(builder).ok_or_else(|| {
                MetadataError::UnresolvedConfidenceAttribute {
                    file: file.to_string(),
                    query: query.to_string(),
                    attribute: builder.clone(),
                }
            })?;
            if !set.insert((**attribute).clone()) {
                return Err(MetadataError::DuplicateMatchingEntry {
                    file: file.to_string(),
                    query: query.to_string(),
                    list: "confidence attribute",
                    entry: builder.clone(),
                });
            }
        }
        Some(set)
    };

    Ok(MatchingRequirements::new(
        required,
        disambiguators,
        confidence_set,
    ))
}

fn collect_attributes(
    attributes: &[IdentityAttribute],
    query: &str,
    file: &str,
    list: &'static str,
) -> Result<Option<BTreeSet<IdentityAttribute>>, MetadataError> {
    if attributes.is_empty() {
        return Ok(None);
    }

    let mut set = BTreeSet::new();
    for attribute in attributes {
        if !set.insert(*attribute) {
            return Err(MetadataError::DuplicateMatchingEntry {
                file: file.to_string(),
                query: query.to_string(),
                list,
                entry: format!("{attribute:?}"),
            });
        }
    }
    Ok(Some(set))
}
