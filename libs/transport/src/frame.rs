//! Frame assembly.
//!
//! The on-wire frame layout:
//!
//! ```text
//! ┌──────────────┬───────────────┬────────────────┬────────────────┐
//! │ byte 0       │ byte 1        │ H bytes        │ L bytes        │
//! │ version/rsvd │ header len H  │ header record  │ payload        │
//! └──────────────┴───────────────┴────────────────┴────────────────┘
//! ```
//!
//! Byte 0 carries the encapsulation version in its high nibble; the low
//! nibble is reserved and must be zero. The header record declares the
//! payload length L and the message type.

use aquae_codec::encode_frame_header;
use aquae_types::{FrameHeader, MsgType, MAX_HEADER_LENGTH, MAX_PAYLOAD_SIZE, PROTOCOL_VERSION};

use crate::error::{TransportError, TransportResult};

/// Assemble one complete frame for `payload`.
///
/// Oversized payloads and headers are caller bugs, not peer input, so they
/// surface as misuse errors.
pub fn encode_frame(msg_type: MsgType, payload: &[u8]) -> TransportResult<Vec<u8>> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(TransportError::misuse(format!(
            "refusing to send a {} byte payload: limit is {}",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let header = FrameHeader {
        payload_len: payload.len() as u32,
        msg_type,
    };
    let header_bytes = encode_frame_header(&header)
        .map_err(|e| TransportError::misuse(format!("failed to encode frame header: {e}")))?;
    if header_bytes.len() > MAX_HEADER_LENGTH {
        return Err(TransportError::misuse(format!(
            "encoded frame header is {} bytes: limit is {}",
            header_bytes.len(),
            MAX_HEADER_LENGTH
        )));
    }

    let mut frame = Vec::with_capacity(2 + header_bytes.len() + payload.len());
    frame.push(PROTOCOL_VERSION << 4);
    frame.push(header_bytes.len() as u8);
    frame.extend_from_slice(&header_bytes);
    frame.extend_from_slice(payload);
    Ok(frame)
}
