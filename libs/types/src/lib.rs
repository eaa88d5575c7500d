//! # Aquae Type Library
//!
//! Pure data types for the Aquae protocol: the sanitised domain model built
//! by the metadata loader and the schema of every message that crosses the
//! wire.
//!
//! ## Design Philosophy
//!
//! - **Sanitised at the boundary**: constructors validate untrusted input
//!   once; everything downstream handles values that are known good.
//! - **Immutable after construction**: the [`Federation`] snapshot and the
//!   graph hanging off it are frozen when the loader finishes. Workers share
//!   them behind `Arc` without locking.
//! - **Structural equality**: domain objects derive equality and hashing
//!   from their fields, so two values built from equal inputs compare equal
//!   and land in the same hash bucket.
//! - **Explicit wire mappings**: enum values are mapped to wire tags through
//!   `TryFrom<u8>` tables, never through declaration order.
//!
//! Protocol rules (encoding, decoding, validation of byte input) live in
//! `aquae-codec`; cross-reference resolution lives in `aquae-metadata`;
//! connection handling lives in `aquae-transport`. This crate has no I/O.

pub mod agreement;
pub mod federation;
pub mod matching;
pub mod message;
pub mod node;
pub mod query;
pub mod wire;

pub use agreement::Agreement;
pub use federation::Federation;
pub use matching::{ConfidenceAttribute, MatchingRequirements};
pub use message::{FrameHeader, IdentitySignRequest, PersonIdentity, SignedQuery};
pub use node::{Node, NodeValidationError};
pub use query::{Choice, Implementor, Query, QueryGraphError};
pub use wire::{
    IdentityAttribute, MsgType, WireValueError, MAX_HEADER_LENGTH, MAX_PAYLOAD_SIZE,
    PROTOCOL_VERSION,
};
