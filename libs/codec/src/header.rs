//! Frame header codec.
//!
//! The header is a two-field record: the payload length that follows the
//! header on the wire, and the message type the payload decodes as. Both
//! fields are required; a header without either is unusable and fatal to
//! the session.

use std::convert::TryFrom;

use aquae_types::{FrameHeader, MsgType};

use crate::error::{CodecError, CodecResult};
use crate::record::{decode_u32, decode_u8, RecordReader, RecordWriter};

const RECORD: &str = "frame header";

const TAG_LENGTH: u8 = 1;
const TAG_TYPE: u8 = 2;

/// Decode the header record carried between the header-length byte and the
/// payload. Bounds on the payload length are the transport's concern; this
/// only guarantees structure.
pub fn decode_frame_header(bytes: &[u8]) -> CodecResult<FrameHeader> {
    let mut reader = RecordReader::new(bytes, RECORD);
    let mut payload_len = None;
    let mut msg_type = None;

    while let Some((tag, value)) = reader.next_field()? {
        match tag {
            TAG_LENGTH => payload_len = Some(decode_u32(RECORD, "length", value)?),
            TAG_TYPE => msg_type = Some(MsgType::try_from(decode_u8(RECORD, "type", value)?)?),
            _ => {} // Unknown fields are skipped.
        }
    }

    let payload_len = payload_len.ok_or(CodecError::MissingField {
        record: RECORD,
        field: "length",
    })?;
    let msg_type = msg_type.ok_or(CodecError::MissingField {
        record: RECORD,
        field: "type",
    })?;

    Ok(FrameHeader {
        payload_len,
        msg_type,
    })
}

pub fn encode_frame_header(header: &FrameHeader) -> CodecResult<Vec<u8>> {
    let mut writer = RecordWriter::new(RECORD);
    writer
        .u32_field(TAG_LENGTH, header.payload_len)?
        .u8_field(TAG_TYPE, header.msg_type.into())?;
    Ok(writer.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let header = FrameHeader {
            payload_len: 4096,
            msg_type: MsgType::SignedQuery,
        };
        let bytes = encode_frame_header(&header).unwrap();
        assert_eq!(decode_frame_header(&bytes).unwrap(), header);
    }

    #[test]
    fn missing_length_is_fatal() {
        let mut writer = RecordWriter::new(RECORD);
        writer.u8_field(TAG_TYPE, MsgType::Finish.into()).unwrap();
        let err = decode_frame_header(&writer.into_bytes()).unwrap_err();
        assert!(matches!(
            err,
            CodecError::MissingField { field: "length", .. }
        ));
    }

    #[test]
    fn missing_type_is_fatal() {
        let mut writer = RecordWriter::new(RECORD);
        writer.u32_field(TAG_LENGTH, 12).unwrap();
        let err = decode_frame_header(&writer.into_bytes()).unwrap_err();
        assert!(matches!(err, CodecError::MissingField { field: "type", .. }));
    }

    #[test]
    fn unknown_message_type_is_fatal() {
        let mut writer = RecordWriter::new(RECORD);
        writer
            .u32_field(TAG_LENGTH, 0)
            .unwrap()
            .u8_field(TAG_TYPE, 42)
            .unwrap();
        assert!(matches!(
            decode_frame_header(&writer.into_bytes()),
            Err(CodecError::WireValue(_))
        ));
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let mut writer = RecordWriter::new(RECORD);
        writer
            .u32_field(TAG_LENGTH, 9)
            .unwrap()
            .str_field(99, "future extension")
            .unwrap()
            .u8_field(TAG_TYPE, MsgType::QueryAnswer.into())
            .unwrap();
        let header = decode_frame_header(&writer.into_bytes()).unwrap();
        assert_eq!(header.payload_len, 9);
        assert_eq!(header.msg_type, MsgType::QueryAnswer);
    }
}
