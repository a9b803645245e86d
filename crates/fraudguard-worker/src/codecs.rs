//! Protobuf codecs for the worker's topics

use fraudguard_core::{RuleRequest, RuleResult};
use fraudguard_engine::{EngineError, RequestCodec, ResultCodec};
use fraudguard_proto::wire;

/// Decodes rule requests as plain protobuf, the format the director emits.
pub struct ProtoRequestCodec;

impl RequestCodec for ProtoRequestCodec {
    fn decode(&self, payload: &[u8]) -> fraudguard_engine::Result<RuleRequest> {
        wire::decode_rule_request(payload).map_err(|e| EngineError::Decode(e.to_string()))
    }
}

/// Encodes rule results as length-prefixed protobuf.
pub struct ProtoResultCodec;

impl ResultCodec for ProtoResultCodec {
    fn encode(&self, result: &RuleResult) -> fraudguard_engine::Result<Vec<u8>> {
        Ok(wire::encode_rule_result(result))
    }
}
