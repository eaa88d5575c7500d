//! Message body codecs.
//!
//! Only IDENTITY_SIGN_REQUEST and SIGNED_QUERY have body schemas today. The
//! remaining message types are surfaced by the transport with their payload
//! undecoded until the domain layer defines them.

use aquae_types::{IdentitySignRequest, PersonIdentity, SignedQuery};

use crate::error::CodecResult;
use crate::record::{decode_str, decode_u32, RecordReader, RecordWriter};

mod tags {
    // IdentitySignRequest
    pub const ISR_SUBJECT: u8 = 1;
    pub const ISR_IDENTITY_SET_NODE: u8 = 2;

    // PersonIdentity
    pub const PI_SURNAME: u8 = 1;
    pub const PI_POSTCODE: u8 = 2;
    pub const PI_YEAR_OF_BIRTH: u8 = 3;
    pub const PI_INITIALS: u8 = 4;
    pub const PI_HOUSE_NUMBER: u8 = 5;
    pub const PI_DATE_OF_BIRTH: u8 = 6;
}

pub fn decode_identity_sign_request(bytes: &[u8]) -> CodecResult<IdentitySignRequest> {
    let mut reader = RecordReader::new(bytes, "identity sign request");
    let mut request = IdentitySignRequest::default();

    while let Some((tag, value)) = reader.next_field()? {
        match tag {
            tags::ISR_SUBJECT => request.subject = Some(decode_person_identity(value)?),
            tags::ISR_IDENTITY_SET_NODE => request.identity_set_nodes.push(
                decode_str("identity sign request", "identity set node", value)?.to_string(),
            ),
            _ => {}
        }
    }

    Ok(request)
}

pub fn encode_identity_sign_request(request: &IdentitySignRequest) -> CodecResult<Vec<u8>> {
    let mut writer = RecordWriter::new("identity sign request");
    if let Some(subject) = &request.subject {
        writer.record_field(tags::ISR_SUBJECT, encode_person_identity(subject)?)?;
    }
    for node in &request.identity_set_nodes {
        writer.str_field(tags::ISR_IDENTITY_SET_NODE, node)?;
    }
    Ok(writer.into_bytes())
}

fn decode_person_identity(bytes: &[u8]) -> CodecResult<PersonIdentity> {
    let mut reader = RecordReader::new(bytes, "person identity");
    let mut identity = PersonIdentity::default();

    while let Some((tag, value)) = reader.next_field()? {
        match tag {
            tags::PI_SURNAME => {
                identity.surname = Some(decode_str("person identity", "surname", value)?.into())
            }
            tags::PI_POSTCODE => {
                identity.postcode = Some(decode_str("person identity", "postcode", value)?.into())
            }
            tags::PI_YEAR_OF_BIRTH => {
                identity.year_of_birth =
                    Some(decode_u32("person identity", "year of birth", value)?)
            }
            tags::PI_INITIALS => {
                identity.initials = Some(decode_str("person identity", "initials", value)?.into())
            }
            tags::PI_HOUSE_NUMBER => {
                identity.house_number =
                    Some(decode_str("person identity", "house number", value)?.into())
            }
            tags::PI_DATE_OF_BIRTH => {
                identity.date_of_birth =
                    Some(decode_str("person identity", "date of birth", value)?.into())
            }
            _ => {}
        }
    }

    Ok(identity)
}

fn encode_person_identity(identity: &PersonIdentity) -> CodecResult<RecordWriter> {
    let mut writer = RecordWriter::new("person identity");
    if let Some(surname) = &identity.surname {
        writer.str_field(tags::PI_SURNAME, surname)?;
    }
    if let Some(postcode) = &identity.postcode {
        writer.str_field(tags::PI_POSTCODE, postcode)?;
    }
    if let Some(year) = identity.year_of_birth {
        writer.u32_field(tags::PI_YEAR_OF_BIRTH, year)?;
    }
    if let Some(initials) = &identity.initials {
        writer.str_field(tags::PI_INITIALS, initials)?;
    }
    if let Some(house_number) = &identity.house_number {
        writer.str_field(tags::PI_HOUSE_NUMBER, house_number)?;
    }
    if let Some(date_of_birth) = &identity.date_of_birth {
        writer.str_field(tags::PI_DATE_OF_BIRTH, date_of_birth)?;
    }
    Ok(writer)
}

/// The signed-query envelope is settled by the query layer; until then the
/// body passes through opaque.
pub fn decode_signed_query(bytes: &[u8]) -> SignedQuery {
    SignedQuery::new(bytes.to_vec())
}

pub fn encode_signed_query(query: &SignedQuery) -> Vec<u8> {
    query.payload.clone()
}
