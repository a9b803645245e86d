//! Binary wire codecs for the request and result topics
//!
//! Requests travel as plain protobuf; results as length-prefixed protobuf
//! so the reporter can frame them off a byte stream. The JSON alternative
//! for results lives in the engine crate; the choice is configuration.

use crate::convert::{
    rule_request_from_proto, rule_request_to_proto, rule_result_from_proto, rule_result_to_proto,
    ConvertError,
};
use crate::pb;
use fraudguard_core::{RuleRequest, RuleResult};
use prost::Message;

pub fn encode_rule_request(request: &RuleRequest) -> Vec<u8> {
    rule_request_to_proto(request).encode_to_vec()
}

pub fn decode_rule_request(payload: &[u8]) -> Result<RuleRequest, ConvertError> {
    let pb = pb::RuleRequest::decode(payload).map_err(|e| ConvertError::Decode(e.to_string()))?;
    rule_request_from_proto(pb)
}

pub fn encode_rule_result(result: &RuleResult) -> Vec<u8> {
    rule_result_to_proto(result).encode_length_delimited_to_vec()
}

pub fn decode_rule_result(payload: &[u8]) -> Result<RuleResult, ConvertError> {
    let pb = pb::RuleResult::decode_length_delimited(payload)
        .map_err(|e| ConvertError::Decode(e.to_string()))?;
    rule_result_from_proto(pb)
}
