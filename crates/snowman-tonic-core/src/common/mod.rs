pub mod client;
pub mod error;
pub mod types;

pub use client::{ClientConfig, SnowmanClient, SnowmanCursor};
pub use error::{Error, Result};

/// gRPC service and message definitions generated from
/// `proto/snowman.proto`.
///
/// ## Service
///
/// - `NextId` - returns one identifier.
/// - `BatchNextId` - streams `length` identifiers, one message per id.
///
/// ## Message Format
///
/// - [`Snowflake`](proto::Snowflake) - `id` carries the identifier as 8
///   big-endian bytes.
/// - [`BatchIdsRequest`](proto::BatchIdsRequest) - `length` is a signed
///   32-bit count; zero or negative is rejected.
pub mod proto {
    tonic::include_proto!("snowman.v1");

    /// Encoded descriptor set, registered with the reflection service.
    pub const FILE_DESCRIPTOR_SET: &[u8] =
        tonic::include_file_descriptor_set!("snowman_descriptor");
}
