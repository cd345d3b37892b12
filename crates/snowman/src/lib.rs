//! # snowman
//!
//! Compact, roughly time-ordered 64-bit identifiers in the Snowflake
//! tradition. Each [`SnowflakeId`] packs, from most to least significant bit:
//!
//! ```text
//!  timestamp (42 bits) | machine id (10 bits) | sequence (12 bits)
//! ```
//!
//! The [`AtomicSnowflakeGenerator`] issues identifiers from a single packed
//! state word using compare-and-exchange, so any number of threads may call
//! [`AtomicSnowflakeGenerator::next_id`] concurrently without locking.
//!
//! ```
//! use snowman::{AtomicSnowflakeGenerator, SNOWMAN_EPOCH, WallClock};
//!
//! let generator = AtomicSnowflakeGenerator::new(5, WallClock::with_epoch(SNOWMAN_EPOCH))?;
//! let id = generator.next_id();
//! assert_eq!(id.machine_id(), 5);
//!
//! let text = id.to_string();
//! assert_eq!(text.parse::<snowman::SnowflakeId>()?, id);
//! # Ok::<(), snowman::Error>(())
//! ```

mod error;
mod generator;
mod id;
#[cfg(feature = "serde")]
mod serde;
mod time;

pub use crate::error::*;
pub use crate::generator::*;
pub use crate::id::*;
pub use crate::time::*;
