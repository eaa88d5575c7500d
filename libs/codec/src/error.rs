//! Decode and encode failures, with enough context to name the record and
//! field that caused them.

use aquae_types::WireValueError;
use thiserror::Error;

/// A structural failure while decoding or encoding a record.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ended inside a field preamble.
    #[error("{record}: truncated record: need {need} bytes for a field preamble, got {got}")]
    Truncated {
        record: &'static str,
        need: usize,
        got: usize,
    },

    /// A field declared more value bytes than the buffer holds.
    #[error("{record}: field tag {tag} declares {declared} bytes but only {available} remain")]
    TruncatedField {
        record: &'static str,
        tag: u8,
        declared: usize,
        available: usize,
    },

    /// A fixed-width scalar field arrived with the wrong width.
    #[error("{record}: field {field} must be exactly {expected} bytes, got {got}")]
    ScalarWidth {
        record: &'static str,
        field: &'static str,
        expected: usize,
        got: usize,
    },

    /// A text field was not valid UTF-8.
    #[error("{record}: field {field} is not valid UTF-8")]
    InvalidUtf8 {
        record: &'static str,
        field: &'static str,
    },

    /// A required field of a wire record was absent.
    #[error("{record}: missing required field {field}")]
    MissingField {
        record: &'static str,
        field: &'static str,
    },

    /// An enum field carried a value outside its table.
    #[error(transparent)]
    WireValue(#[from] WireValueError),

    /// A value too large for the 32-bit field length, encode side.
    #[error("{record}: field tag {tag} value of {len} bytes exceeds the field length limit")]
    FieldTooLong {
        record: &'static str,
        tag: u8,
        len: usize,
    },
}

pub type CodecResult<T> = std::result::Result<T, CodecError>;
