//! FraudGuard Proto - wire schema and gRPC stubs
//!
//! The `fraudguard.v1` protobuf package, generated service stubs for the
//! profile and transaction services, conversions between the wire types
//! and the domain model, and the binary codecs for the request and result
//! topics.

pub mod convert;
pub mod wire;

pub use convert::ConvertError;

/// Generated protobuf types for `fraudguard.v1`.
pub mod pb {
    tonic::include_proto!("fraudguard.v1");
}
