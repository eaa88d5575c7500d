//! # Aquae Transport
//!
//! Aquae consists of exchanging messages over a pair of ports, usually a
//! mutually-authenticated TLS socket. This crate marshals those messages on
//! and off the wire using the Aquae framing and encapsulation protocols.
//!
//! A [`Session`] owns one connection and drives a strict state machine over
//! it: one frame at a time, one state change per completed I/O step, and
//! every bound checked before the matching allocation. The state machine
//! distinguishes two failure worlds:
//!
//! - **peer errors** ([`TransportError::Peer`]): the remote end sent
//!   something malformed. Log it, close the session, carry on serving
//!   everything else.
//! - **misuse errors** ([`TransportError::Misuse`]): in-process code drove
//!   the session API in the wrong state. That is a bug in the caller, is
//!   never reachable from bytes a peer controls, and fails the offending
//!   worker fast.
//!
//! I/O failures are treated like peer errors at session granularity.

pub mod error;
pub mod frame;
pub mod session;

pub use error::{TransportError, TransportResult};
pub use frame::encode_frame;
pub use session::{Session, SessionState};
