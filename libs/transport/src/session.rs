//! The per-connection transport state machine.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use aquae_codec::{
    decode_frame_header, decode_identity_sign_request, decode_signed_query,
};
use aquae_types::{
    IdentitySignRequest, MsgType, SignedQuery, MAX_PAYLOAD_SIZE, PROTOCOL_VERSION,
};

use crate::error::{TransportError, TransportResult};
use crate::frame::encode_frame;

/// Where the session is in the current frame. The state advances on every
/// I/O step that returns at least one byte; when the state is
/// `WaitingForPayload` the expected payload type records which substate the
/// session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    WaitingForFrame,
    ReadFirstByte,
    ReadHeaderLength,
    WaitingForHeader,
    ReadingHeader,
    ParsingHeader,
    WaitingForPayload,
    ReadingPayload,
    ReadPayload,
}

/// One connection's framing state.
///
/// Reads are strictly sequential within a session; the guard checks on
/// every entry point make overlapped or out-of-order use a
/// [`TransportError::Misuse`] rather than silent desynchronisation.
/// Dropping a session mid-frame releases its buffers and, for the peer, is
/// indistinguishable from closing the connection.
pub struct Session<S> {
    io: S,
    state: SessionState,
    expected_payload: Option<MsgType>,
    payload_remaining: usize,
    payload_buffer: Option<BytesMut>,
}

impl<S> Session<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: S) -> Self {
        Self {
            io,
            state: SessionState::WaitingForFrame,
            expected_payload: None,
            payload_remaining: 0,
            payload_buffer: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The message type of the frame whose payload is pending, if any.
    pub fn expected_payload(&self) -> Option<MsgType> {
        self.expected_payload
    }

    pub fn into_inner(self) -> S {
        self.io
    }

    /// Read the framing byte and header of the next frame, returning the
    /// message type the payload will decode as. The payload itself is
    /// consumed by the matching typed reader.
    pub async fn read_frame(&mut self) -> TransportResult<MsgType> {
        if self.state != SessionState::WaitingForFrame {
            return Err(TransportError::misuse(
                "transport not in WAITING_FOR_FRAME state",
            ));
        }
        if self.expected_payload.is_some() {
            return Err(TransportError::misuse(
                "transport in WAITING_FOR_FRAME state but still expecting a payload",
            ));
        }
        if self.payload_remaining != 0 {
            return Err(TransportError::misuse(
                "transport in WAITING_FOR_FRAME state but still has payload left to read",
            ));
        }
        if self.payload_buffer.is_some() {
            return Err(TransportError::misuse(
                "transport in WAITING_FOR_FRAME state but still has buffer space allocated",
            ));
        }

        // Framing byte: version in the high nibble, reserved low nibble.
        let first_byte = self.read_byte("first byte of frame").await?;
        self.state = SessionState::ReadFirstByte;

        let version = (first_byte & 0xF0) >> 4;
        let reserved = first_byte & 0x0F;
        if version != PROTOCOL_VERSION {
            return Err(TransportError::peer(format!(
                "unexpected encapsulation version number {version}"
            )));
        }
        if reserved != 0 {
            return Err(TransportError::peer(
                "non-zero reserved bits in encapsulation byte",
            ));
        }

        let header_length = self.read_byte("header length").await? as usize;
        self.state = SessionState::ReadHeaderLength;
        // No header-less message is defined, so a zero length is malformed.
        if header_length == 0 {
            return Err(TransportError::peer("zero-length frame header"));
        }

        let mut header_buffer = vec![0u8; header_length];
        self.state = SessionState::WaitingForHeader;

        let mut offset = 0;
        while offset < header_length {
            let read = self.io.read(&mut header_buffer[offset..]).await?;
            if read == 0 {
                return Err(TransportError::peer(
                    "unexpected end of stream while reading frame header",
                ));
            }
            self.state = SessionState::ReadingHeader;
            offset += read;
        }
        self.state = SessionState::ParsingHeader;

        let header = decode_frame_header(&header_buffer)
            .map_err(|e| TransportError::peer(format!("invalid frame header: {e}")))?;

        let payload_len = header.payload_len as usize;
        if payload_len > MAX_PAYLOAD_SIZE {
            return Err(TransportError::peer(format!(
                "frame header declares an unreasonably large payload: peer wants to send \
                 {payload_len} bytes and our limit is {MAX_PAYLOAD_SIZE}"
            )));
        }

        // Bound checked; now it is safe to allocate.
        self.payload_remaining = payload_len;
        self.payload_buffer = Some(BytesMut::zeroed(payload_len));
        self.expected_payload = Some(header.msg_type);
        self.state = SessionState::WaitingForPayload;

        trace!(msg_type = ?header.msg_type, payload_len, "frame header read");
        Ok(header.msg_type)
    }

    pub async fn read_identity_sign_request(&mut self) -> TransportResult<IdentitySignRequest> {
        self.expect_payload(MsgType::IdentitySignRequest)?;
        let body = self.read_payload().await?;
        decode_identity_sign_request(&body)
            .map_err(|e| TransportError::peer(format!("invalid IDENTITY_SIGN_REQUEST body: {e}")))
    }

    pub async fn read_signed_query(&mut self) -> TransportResult<SignedQuery> {
        self.expect_payload(MsgType::SignedQuery)?;
        let body = self.read_payload().await?;
        Ok(decode_signed_query(&body))
    }

    /// Consume the payload of a frame without decoding it. This is how the
    /// reserved-body message types are surfaced until the domain layer
    /// defines their schemas.
    pub async fn read_opaque_body(&mut self, msg_type: MsgType) -> TransportResult<Bytes> {
        self.expect_payload(msg_type)?;
        self.read_payload().await
    }

    /// Write one complete frame and flush it.
    pub async fn write_frame(&mut self, msg_type: MsgType, payload: &[u8]) -> TransportResult<()> {
        let frame = encode_frame(msg_type, payload)?;
        self.io.write_all(&frame).await?;
        self.io.flush().await?;
        trace!(?msg_type, payload_len = payload.len(), "frame written");
        Ok(())
    }

    fn expect_payload(&self, msg_type: MsgType) -> TransportResult<()> {
        if self.state != SessionState::WaitingForPayload {
            return Err(TransportError::misuse(
                "transport not in WAITING_FOR_PAYLOAD state",
            ));
        }
        match self.expected_payload {
            Some(expected) if expected == msg_type => Ok(()),
            Some(expected) => Err(TransportError::misuse(format!(
                "transport is expecting a {expected:?} payload, not {msg_type:?}"
            ))),
            None => Err(TransportError::misuse("transport is not expecting a payload")),
        }
    }

    async fn read_payload(&mut self) -> TransportResult<Bytes> {
        let mut buffer = self
            .payload_buffer
            .take()
            .ok_or_else(|| TransportError::misuse("transport has no payload buffer allocated"))?;

        if self.payload_remaining == 0 {
            // An empty payload involves no stream I/O at all.
            self.state = SessionState::ReadPayload;
        } else {
            let mut offset = buffer.len() - self.payload_remaining;
            while self.payload_remaining > 0 {
                let read = self.io.read(&mut buffer[offset..]).await?;
                if read == 0 {
                    return Err(TransportError::peer(
                        "unexpected end of stream while reading payload",
                    ));
                }
                self.state = SessionState::ReadingPayload;
                offset += read;
                self.payload_remaining -= read;
            }
            self.state = SessionState::ReadPayload;
        }

        // Body is handed to the caller; the session is ready for the next
        // frame.
        self.expected_payload = None;
        self.state = SessionState::WaitingForFrame;
        Ok(buffer.freeze())
    }

    async fn read_byte(&mut self, what: &'static str) -> TransportResult<u8> {
        let mut byte = [0u8; 1];
        let read = self.io.read(&mut byte).await?;
        if read == 0 {
            return Err(TransportError::peer(format!(
                "unexpected end of stream while reading {what}"
            )));
        }
        Ok(byte[0])
    }
}
