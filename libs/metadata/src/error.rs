//! Fatal metadata load failures.
//!
//! Every variant names the metadata file and, where one exists, the record
//! and field that triggered the failure, so an operator can fix the file
//! without reading the loader.

use aquae_codec::CodecError;
use aquae_types::{NodeValidationError, QueryGraphError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("failed to read metadata file {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode metadata file {file}: {source}")]
    Decode {
        file: String,
        #[source]
        source: CodecError,
    },

    /// A record is structurally incomplete. `name` is the record's own name
    /// or `#<index>` when the name itself is what is missing.
    #[error("missing {field} for {record} declaration {name} in {file}")]
    MissingField {
        file: String,
        record: &'static str,
        name: String,
        field: &'static str,
    },

    #[error("invalid {record} declaration {name} in {file}: {source}")]
    InvalidField {
        file: String,
        record: &'static str,
        name: String,
        #[source]
        source: NodeValidationError,
    },

    #[error("a declaration for a node named {name} appears more than once in {file}")]
    DuplicateNode { file: String, name: String },

    #[error("node named {name} shares a TLS key with node {other} in {file}")]
    DuplicateTlsKey {
        file: String,
        name: String,
        other: String,
    },

    #[error("a declaration for a confidence attribute named {name} appears more than once in {file}")]
    DuplicateConfidenceAttribute { file: String, name: String },

    #[error("a declaration for a query named {name} appears more than once in {file}")]
    DuplicateQuery { file: String, name: String },

    #[error("query {query} is not implemented by any nodes in {file}")]
    NoImplementors { file: String, query: String },

    #[error("query {query} references an undeclared node {node} in {file}")]
    UnresolvedNode {
        file: String,
        query: String,
        node: String,
    },

    #[error("query {query} references an undeclared confidence attribute {attribute} in {file}")]
    UnresolvedConfidenceAttribute {
        file: String,
        query: String,
        attribute: String,
    },

    /// Choices resolve only against queries declared earlier in the file,
    /// so this also covers forward references and self references.
    #[error("a choice for query {query} references undeclared query {required} in {file}")]
    UnresolvedRequiredQuery {
        file: String,
        query: String,
        required: String,
    },

    #[error("query {query} has a duplicated {list} entry {entry} in {file}")]
    DuplicateMatchingEntry {
        file: String,
        query: String,
        list: &'static str,
        entry: String,
    },

    #[error("in {file}: {source}")]
    Graph {
        file: String,
        #[source]
        source: QueryGraphError,
    },
}
