//! # Aquae Codec
//!
//! The "rules" layer of the protocol: everything that turns bytes into
//! structurally-valid records and back.
//!
//! Two schema families share one binary encoding — a length-prefixed
//! tag/field record format (see [`record`]):
//!
//! - the **metadata file**: a single Federation record describing nodes,
//!   agreements, confidence attributes, and query specifications;
//! - the **wire messages**: the frame header and the typed message bodies
//!   carried inside frames.
//!
//! ## What This Crate Does NOT Do
//!
//! The codec is pure. It never resolves cross-references (an implementing
//! node's `node_id` stays a string here — resolution is the metadata
//! loader's job), never touches the network, and never allocates beyond the
//! decoded values themselves. Presence of *required* fields is reported via
//! `Option` on the raw record types so the loader can produce errors that
//! name the offending record; only fields that are structurally unusable
//! (bad UTF-8, wrong scalar width, unknown enum value, truncation) fail
//! here.

pub mod error;
pub mod header;
pub mod messages;
pub mod metadata;
pub mod record;

pub use error::{CodecError, CodecResult};
pub use header::{decode_frame_header, encode_frame_header};
pub use messages::{
    decode_identity_sign_request, decode_signed_query, encode_identity_sign_request,
    encode_signed_query,
};
pub use metadata::FederationRecord;
pub use record::{RecordReader, RecordWriter};
