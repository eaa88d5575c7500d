//! Raw metadata file records.
//!
//! These mirror the on-disk Federation schema one-to-one and deliberately
//! stay "raw": node ids and required-query names are plain strings, and
//! required fields are `Option` so the loader can report exactly which
//! record is incomplete. The loader in `aquae-metadata` turns these into the
//! sanitised domain graph.

use std::convert::TryFrom;

use aquae_types::IdentityAttribute;

use crate::error::CodecResult;
use crate::record::{decode_str, decode_u32, decode_u8, RecordReader, RecordWriter};

mod tags {
    // Federation (file root)
    pub const FED_NODE: u8 = 1;
    pub const FED_AGREEMENT: u8 = 2;
    pub const FED_CONFIDENCE: u8 = 3;
    pub const FED_QUERY: u8 = 4;

    // Node
    pub const NODE_NAME: u8 = 1;
    pub const NODE_LOCATION: u8 = 2;
    pub const NODE_CERTIFICATE: u8 = 3;

    // Location
    pub const LOC_HOSTNAME: u8 = 1;
    pub const LOC_PORT: u8 = 2;

    // Agreement (DSA)
    pub const DSA_JUSTIFICATION: u8 = 1;

    // ConfidenceAttribute
    pub const CA_NAME: u8 = 1;
    pub const CA_DESCRIPTION: u8 = 2;

    // QuerySpec
    pub const QS_NAME: u8 = 1;
    pub const QS_IMPLEMENTOR: u8 = 2;
    pub const QS_CHOICE: u8 = 3;

    // ImplementingNode
    pub const IN_NODE_ID: u8 = 1;
    pub const IN_MATCHING: u8 = 2;

    // MatchingSpec
    pub const MS_REQUIRED: u8 = 1;
    pub const MS_DISAMBIGUATOR: u8 = 2;
    pub const MS_CONFIDENCE_BUILDER: u8 = 3;

    // Choice
    pub const CH_REQUIRED_QUERY: u8 = 1;
}

/// The root record of a metadata file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FederationRecord {
    pub nodes: Vec<NodeRecord>,
    pub agreements: Vec<AgreementRecord>,
    pub confidence_attributes: Vec<ConfidenceAttributeRecord>,
    pub queries: Vec<QuerySpecRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeRecord {
    pub name: Option<String>,
    pub location: Option<LocationRecord>,
    pub certificate: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationRecord {
    pub hostname: Option<String>,
    pub port: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgreementRecord {
    pub justification: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfidenceAttributeRecord {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySpecRecord {
    pub name: Option<String>,
    pub implementors: Vec<ImplementingNodeRecord>,
    pub choices: Vec<ChoiceRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImplementingNodeRecord {
    pub node_id: Option<String>,
    pub matching: Option<MatchingSpecRecord>,
}

/// Lists, not sets: duplicate detection is a loader-level validation with a
/// loader-level error message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchingSpecRecord {
    pub required: Vec<IdentityAttribute>,
    pub disambiguators: Vec<IdentityAttribute>,
    pub confidence_builders: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChoiceRecord {
    pub required_queries: Vec<String>,
}

impl FederationRecord {
    /// Decode a whole metadata file.
    pub fn decode(bytes: &[u8]) -> CodecResult<Self> {
        let mut reader = RecordReader::new(bytes, "federation");
        let mut federation = FederationRecord::default();

        while let Some((tag, value)) = reader.next_field()? {
            match tag {
                tags::FED_NODE => federation.nodes.push(decode_node(value)?),
                tags::FED_AGREEMENT => federation.agreements.push(decode_agreement(value)?),
                tags::FED_CONFIDENCE => federation
                    .confidence_attributes
                    .push(decode_confidence_attribute(value)?),
                tags::FED_QUERY => federation.queries.push(decode_query_spec(value)?),
                _ => {}
            }
        }

        Ok(federation)
    }

    /// Encode back to the file representation. Used by tooling and tests;
    /// absent optional fields are omitted, so decode(encode(r)) == r.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut writer = RecordWriter::new("federation");
        for node in &self.nodes {
            writer.record_field(tags::FED_NODE, encode_node(node)?)?;
        }
        for agreement in &self.agreements {
            writer.record_field(tags::FED_AGREEMENT, encode_agreement(agreement)?)?;
        }
        for attribute in &self.confidence_attributes {
            writer.record_field(tags::FED_CONFIDENCE, encode_confidence_attribute(attribute)?)?;
        }
        for query in &self.queries {
            writer.record_field(tags::FED_QUERY, encode_query_spec(query)?)?;
        }
        Ok(writer.into_bytes())
    }
}

fn decode_node(bytes: &[u8]) -> CodecResult<NodeRecord> {
    let mut reader = RecordReader::new(bytes, "node");
    let mut node = NodeRecord::default();

    while let Some((tag, value)) = reader.next_field()? {
        match tag {
            tags::NODE_NAME => node.name = Some(decode_str("node", "name", value)?.to_string()),
            tags::NODE_LOCATION => node.location = Some(decode_location(value)?),
            tags::NODE_CERTIFICATE => node.certificate = Some(value.to_vec()),
            _ => {}
        }
    }

    Ok(node)
}

fn encode_node(node: &NodeRecord) -> CodecResult<RecordWriter> {
    let mut writer = RecordWriter::new("node");
    if let Some(name) = &node.name {
        writer.str_field(tags::NODE_NAME, name)?;
    }
    if let Some(location) = &node.location {
        writer.record_field(tags::NODE_LOCATION, encode_location(location)?)?;
    }
    if let Some(certificate) = &node.certificate {
        writer.field(tags::NODE_CERTIFICATE, certificate)?;
    }
    Ok(writer)
}

fn decode_location(bytes: &[u8]) -> CodecResult<LocationRecord> {
    let mut reader = RecordReader::new(bytes, "location");
    let mut location = LocationRecord::default();

    while let Some((tag, value)) = reader.next_field()? {
        match tag {
            tags::LOC_HOSTNAME => {
                location.hostname = Some(decode_str("location", "hostname", value)?.to_string())
            }
            tags::LOC_PORT => location.port = Some(decode_u32("location", "port", value)?),
            _ => {}
        }
    }

    Ok(location)
}

fn encode_location(location: &LocationRecord) -> CodecResult<RecordWriter> {
    let mut writer = RecordWriter::new("location");
    if let Some(hostname) = &location.hostname {
        writer.str_field(tags::LOC_HOSTNAME, hostname)?;
    }
    if let Some(port) = location.port {
        writer.u32_field(tags::LOC_PORT, port)?;
    }
    Ok(writer)
}

fn decode_agreement(bytes: &[u8]) -> CodecResult<AgreementRecord> {
    let mut reader = RecordReader::new(bytes, "agreement");
    let mut agreement = AgreementRecord::default();

    while let Some((tag, value)) = reader.next_field()? {
        if tag == tags::DSA_JUSTIFICATION {
            agreement.justification =
                Some(decode_str("agreement", "justification", value)?.to_string());
        }
    }

    Ok(agreement)
}

fn encode_agreement(agreement: &AgreementRecord) -> CodecResult<RecordWriter> {
    let mut writer = RecordWriter::new("agreement");
    if let Some(justification) = &agreement.justification {
        writer.str_field(tags::DSA_JUSTIFICATION, justification)?;
    }
    Ok(writer)
}

fn decode_confidence_attribute(bytes: &[u8]) -> CodecResult<ConfidenceAttributeRecord> {
    let mut reader = RecordReader::new(bytes, "confidence attribute");
    let mut attribute = ConfidenceAttributeRecord::default();

    while let Some((tag, value)) = reader.next_field()? {
        match tag {
            tags::CA_NAME => {
                attribute.name =
                    Some(decode_str("confidence attribute", "name", value)?.to_string())
            }
            tags::CA_DESCRIPTION => {
                attribute.description =
                    Some(decode_str("confidence attribute", "description", value)?.to_string())
            }
            _ => {}
        }
    }

    Ok(attribute)
}

fn encode_confidence_attribute(
    attribute: &ConfidenceAttributeRecord,
) -> CodecResult<RecordWriter> {
    let mut writer = RecordWriter::new("confidence attribute");
    if let Some(name) = &attribute.name {
        writer.str_field(tags::CA_NAME, name)?;
    }
    if let Some(description) = &attribute.description {
        writer.str_field(tags::CA_DESCRIPTION, description)?;
    }
    Ok(writer)
}

fn decode_query_spec(bytes: &[u8]) -> CodecResult<QuerySpecRecord> {
    let mut reader = RecordReader::new(bytes, "query");
    let mut query = QuerySpecRecord::default();

    while let Some((tag, value)) = reader.next_field()? {
        match tag {
            tags::QS_NAME => query.name = Some(decode_str("query", "name", value)?.to_string()),
            tags::QS_IMPLEMENTOR => query.implementors.push(decode_implementing_node(value)?),
            tags::QS_CHOICE => query.choices.push(decode_choice(value)?),
            _ => {}
        }
    }

    Ok(query)
}

fn encode_query_spec(query: &QuerySpecRecord) -> CodecResult<RecordWriter> {
    let mut writer = RecordWriter::new("query");
    if let Some(name) = &query.name {
        writer.str_field(tags::QS_NAME, name)?;
    }
    for implementor in &query.implementors {
        writer.record_field(tags::QS_IMPLEMENTOR, encode_implementing_node(implementor)?)?;
    }
    for choice in &query.choices {
        writer.record_field(tags::QS_CHOICE, encode_choice(choice)?)?;
    }
    Ok(writer)
}

fn decode_implementing_node(bytes: &[u8]) -> CodecResult<ImplementingNodeRecord> {
    let mut reader = RecordReader::new(bytes, "implementing node");
    let mut implementor = ImplementingNodeRecord::default();

    while let Some((tag, value)) = reader.next_field()? {
        match tag {
            tags::IN_NODE_ID => {
                implementor.node_id =
                    Some(decode_str("implementing node", "node id", value)?.to_string())
            }
            tags::IN_MATCHING => implementor.matching = Some(decode_matching_spec(value)?),
            _ => {}
        }
    }

    Ok(implementor)
}

fn encode_implementing_node(implementor: &ImplementingNodeRecord) -> CodecResult<RecordWriter> {
    let mut writer = RecordWriter::new("implementing node");
    if let Some(node_id) = &implementor.node_id {
        writer.str_field(tags::IN_NODE_ID, node_id)?;
    }
    if let Some(matching) = &implementor.matching {
        writer.record_field(tags::IN_MATCHING, encode_matching_spec(matching)?)?;
    }
    Ok(writer)
}

fn decode_matching_spec(bytes: &[u8]) -> CodecResult<MatchingSpecRecord> {
    let mut reader = RecordReader::new(bytes, "matching spec");
    let mut matching = MatchingSpecRecord::default();

    while let Some((tag, value)) = reader.next_field()? {
        match tag {
            tags::MS_REQUIRED => {
                let raw = decode_u8("matching spec", "required", value)?;
                matching.required.push(IdentityAttribute::try_from(raw)?);
            }
            tags::MS_DISAMBIGUATOR => {
                let raw = decode_u8("matching spec", "disambiguator", value)?;
                matching
                    .disambiguators
                    .push(IdentityAttribute::try_from(raw)?);
            }
            tags::MS_CONFIDENCE_BUILDER => matching
                .confidence_builders
                .push(decode_str("matching spec", "confidence builder", value)?.to_string()),
            _ => {}
        }
    }

    Ok(matching)
}

fn encode_matching_spec(matching: &MatchingSpecRecord) -> CodecResult<RecordWriter> {
    let mut writer = RecordWriter::new("matching spec");
    for attribute in &matching.required {
        writer.u8_field(tags::MS_REQUIRED, (*attribute).into())?;
    }
    for attribute in &matching.disambiguators {
        writer.u8_field(tags::MS_DISAMBIGUATOR, (*attribute).into())?;
    }
    for name in &matching.confidence_builders {
        writer.str_field(tags::MS_CONFIDENCE_BUILDER, name)?;
    }
    Ok(writer)
}

fn decode_choice(bytes: &[u8]) -> CodecResult<ChoiceRecord> {
    let mut reader = RecordReader::new(bytes, "choice");
    let mut choice = ChoiceRecord::default();

    while let Some((tag, value)) = reader.next_field()? {
        if tag == tags::CH_REQUIRED_QUERY {
            choice
                .required_queries
                .push(decode_str("choice", "required query", value)?.to_string());
        }
    }

    Ok(choice)
}

fn encode_choice(choice: &ChoiceRecord) -> CodecResult<RecordWriter> {
    let mut writer = RecordWriter::new("choice");
    for name in &choice.required_queries {
        writer.str_field(tags::CH_REQUIRED_QUERY, name)?;
    }
    Ok(writer)
}
