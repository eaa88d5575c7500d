//! Wire-level constants and enumerations.
//!
//! The values here are the protocol contract shared by every node in a
//! federation. Each enum carries an explicit value table (`TryFrom<u8>`)
//! rather than relying on declaration order, so re-ordering a variant can
//! never silently change what goes on the wire.

use std::convert::TryFrom;
use thiserror::Error;

/// Encapsulation protocol version carried in the high nibble of byte 0 of
/// every frame. The low nibble is reserved and must be zero.
pub const PROTOCOL_VERSION: u8 = 0;

/// Upper bound on a frame's declared payload length (1 MiB). Enforced
/// before any payload byte is read or buffered.
pub const MAX_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Upper bound on the encoded frame header, fixed by the one-byte
/// header-length field.
pub const MAX_HEADER_LENGTH: usize = 255;

/// A wire tag that does not map to any known enum value.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum WireValueError {
    #[error("unknown message type {0} on the wire")]
    UnknownMessageType(u8),

    #[error("unknown identity attribute {0} on the wire")]
    UnknownIdentityAttribute(u8),
}

/// Message type carried in the frame header.
///
/// The numeric assignment is the wire contract; see the value table in
/// `TryFrom<u8>` below.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgType {
    IdentitySignRequest = 0,
    SignedQuery = 1,
    BadQueryResponse = 2,
    QueryResponse = 3,
    SecondWhistle = 4,
    QueryAnswer = 5,
    Finish = 6,
}

impl MsgType {
    /// Message types whose body schema is not yet defined. The transport
    /// surfaces these with an undecoded payload.
    pub fn body_reserved(self) -> bool {
        !matches!(self, MsgType::IdentitySignRequest | MsgType::SignedQuery)
    }
}

impl TryFrom<u8> for MsgType {
    type Error = WireValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(MsgType::IdentitySignRequest),
            1 => Ok(MsgType::SignedQuery),
            2 => Ok(MsgType::BadQueryResponse),
            3 => Ok(MsgType::QueryResponse),
            4 => Ok(MsgType::SecondWhistle),
            5 => Ok(MsgType::QueryAnswer),
            6 => Ok(MsgType::Finish),
            other => Err(WireValueError::UnknownMessageType(other)),
        }
    }
}

impl From<MsgType> for u8 {
    fn from(value: MsgType) -> Self {
        value as u8
    }
}

/// The identity fields a matching process can require of a subject.
///
/// The numeric assignment mirrors the metadata schema's id-field values and
/// is part of the metadata file contract.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IdentityAttribute {
    Surname = 0,
    Postcode = 1,
    YearOfBirth = 2,
    Initials = 3,
    HouseNumber = 4,
    DateOfBirth = 5,
}

impl TryFrom<u8> for IdentityAttribute {
    type Error = WireValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(IdentityAttribute::Surname),
            1 => Ok(IdentityAttribute::Postcode),
            2 => Ok(IdentityAttribute::YearOfBirth),
            3 => Ok(IdentityAttribute::Initials),
            4 => Ok(IdentityAttribute::HouseNumber),
            5 => Ok(IdentityAttribute::DateOfBirth),
            other => Err(WireValueError::UnknownIdentityAttribute(other)),
        }
    }
}

impl From<IdentityAttribute> for u8 {
    fn from(value: IdentityAttribute) -> Self {
        value as u8
    }
}
