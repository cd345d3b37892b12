//! # Shared Snowflake ID Types and Constants
//!
//! Type aliases and constants that fix the client/server contract at compile
//! time, plus the conversions between [`SnowflakeId`] and the wire message.
//!
//! ## Wire format
//!
//! Each [`Snowflake`] message carries exactly one identifier in `id` as
//! [`SNOWFLAKE_ID_SIZE`] big-endian bytes. Decoding rejects any other length.

use crate::{Error, proto::Snowflake};
use bytes::Bytes;
use snowman::{AtomicSnowflakeGenerator, SNOWMAN_EPOCH, WallClock};

pub use snowman::SnowflakeId;

/// The number of bytes in the binary encoding of a [`SnowflakeId`].
pub const SNOWFLAKE_ID_SIZE: usize = snowman::ID_SIZE;

/// The system clock used by the server's generator.
pub type Clock = WallClock;

/// The epoch subtracted from wall-clock time before packing timestamps.
pub const EPOCH: core::time::Duration = SNOWMAN_EPOCH;

/// The generator shared by every request on a server.
pub type Generator = AtomicSnowflakeGenerator<Clock>;

impl From<SnowflakeId> for Snowflake {
    fn from(id: SnowflakeId) -> Self {
        Self {
            id: Bytes::copy_from_slice(&id.to_be_bytes()),
        }
    }
}

impl TryFrom<Snowflake> for SnowflakeId {
    type Error = Error;

    fn try_from(msg: Snowflake) -> Result<Self, Self::Error> {
        Ok(Self::try_from(&msg.id[..])?)
    }
}
