//! # Aquae Metadata Loader
//!
//! Metadata is the backbone of a federation's configuration: it says who
//! the other nodes are, where to find them, which queries can be run, and
//! which data-sharing agreements are in place. Nodes need compatible
//! metadata to work together — compatible does not always mean matching.
//!
//! This crate turns a metadata file into a [`Federation`] snapshot: decoded
//! through `aquae-codec`, validated for structural completeness, and with
//! every cross-reference resolved. Anything wrong with the file is fatal to
//! the load and reported with the file, record, and field that caused it.
//!
//! Snapshots are not reloadable. To pick up new metadata, load a new
//! snapshot from the new file and swap it in wherever the old one was held;
//! workers still running drain on the snapshot they started with. Because a
//! snapshot is never modified after the loader returns it, sharing it
//! across tasks needs no locking.
//!
//! [`Federation`]: aquae_types::Federation

pub mod error;
pub mod loader;

pub use error::MetadataError;
pub use loader::{from_bytes, load};
