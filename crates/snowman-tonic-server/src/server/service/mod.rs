//! gRPC service implementation and shutdown coordination.
//!
//! ## Structure
//!
//! - [`handler`] - gRPC service entry point (`IdService`).

pub mod handler;
