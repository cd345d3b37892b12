//! Delivery of batch requests as gRPC streams.
//!
//! - [`coordinator`] - feeds generated IDs into a stream's response channel.

pub mod coordinator;
