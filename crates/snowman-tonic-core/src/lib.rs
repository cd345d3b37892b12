//! # snowman-tonic-core
//!
//! Everything a snowman gRPC server and its clients share: the generated
//! `snowman.v1` protocol, the concrete generator type, conversions between
//! [`SnowflakeId`](snowman::SnowflakeId) and wire messages, the service
//! [`Error`] type, and a small [`SnowmanClient`].

mod common;
pub use common::*;
// Public re-export so downstream crates can reach `snowman` via
// `snowman_tonic_core::snowman`
pub use snowman;
