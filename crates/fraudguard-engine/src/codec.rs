//! Wire codecs for the request and result topics
//!
//! The engine only fixes the seams: how bytes become a [`RuleRequest`] and
//! how a [`RuleResult`] becomes bytes. JSON codecs live here; the
//! length-prefixed binary codecs come from the proto crate so the encoding
//! choice stays configuration-driven.

use crate::error::{EngineError, Result};
use fraudguard_core::{RuleRequest, RuleResult};

/// Decodes rule requests off the request topic.
pub trait RequestCodec: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<RuleRequest>;
}

/// Encodes rule results for the results topic.
pub trait ResultCodec: Send + Sync {
    fn encode(&self, result: &RuleResult) -> Result<Vec<u8>>;
}

/// JSON request decoding.
pub struct JsonRequestCodec;

impl RequestCodec for JsonRequestCodec {
    fn decode(&self, payload: &[u8]) -> Result<RuleRequest> {
        serde_json::from_slice(payload).map_err(|e| EngineError::Decode(e.to_string()))
    }
}

/// JSON result encoding.
pub struct JsonResultCodec;

impl ResultCodec for JsonResultCodec {
    fn encode(&self, result: &RuleResult) -> Result<Vec<u8>> {
        serde_json::to_vec(result).map_err(|e| EngineError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fraudguard_core::RuleStatus;

    #[test]
    fn test_json_result_uses_wire_status_names() {
        let result = RuleResult {
            profile_uuid: "p-1".to_string(),
            profile_name: "retail".to_string(),
            config_uuid: "r-1".to_string(),
            config_name: "big".to_string(),
            transaction_id: "T1".to_string(),
            status: RuleStatus::NotFraud,
            description: "ok".to_string(),
        };

        let bytes = JsonResultCodec.encode(&result).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("\"NOT_FRAUD\""));
        assert!(text.contains("\"transaction_id\":\"T1\""));
    }

    #[test]
    fn test_json_request_decode_failure() {
        assert!(JsonRequestCodec.decode(b"not json").is_err());
    }
}
