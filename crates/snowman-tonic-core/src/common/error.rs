//! Error types for the ID service and its client.
//!
//! [`Error`] covers every recoverable failure around the generator: bad
//! requests, streams whose consumer went away, shutdown, malformed ids on the
//! wire, and client-side transport problems. `From<Error> for Status` maps
//! each case onto a gRPC status code so handlers can use `?`.
//!
//! There is no generation error: producing an id cannot fail.

use tonic::Status;

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the ID service.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The client request was invalid (e.g. a non-positive batch length).
    #[error("Invalid request: {reason}")]
    InvalidRequest { reason: String },

    /// Delivering a generated id to the caller failed, usually because the
    /// client disconnected mid-stream.
    #[error("Channel error: {context}")]
    ChannelError { context: String },

    /// The service is draining and refuses new streams.
    #[error("Service is shutting down")]
    ServiceShutdown,

    /// An id on the wire or in text could not be decoded.
    #[error("Invalid id: {0}")]
    InvalidId(#[from] snowman::Error),

    /// The client could not connect or configure its channel.
    #[error("Transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The server answered a client call with a non-OK status.
    #[error("Request failed: {0}")]
    Status(#[from] Status),

    /// Reading certificates or keys from disk failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<Error> for Status {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidRequest { reason } => Status::invalid_argument(reason),
            Error::ChannelError { context } => {
                Status::internal(format!("Channel error: {context}"))
            }
            Error::ServiceShutdown => Status::unavailable("Service is shutting down"),
            Error::InvalidId(e) => Status::invalid_argument(format!("Invalid id: {e}")),
            Error::Transport(e) => Status::unavailable(format!("Transport error: {e}")),
            Error::Status(status) => status,
            Error::Io(e) => Status::internal(format!("I/O error: {e}")),
        }
    }
}
