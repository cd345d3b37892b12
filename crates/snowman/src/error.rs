use core::num::ParseIntError;

/// A result type defaulting to this crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors `snowman` can produce.
///
/// Generation itself is infallible; errors only arise when building a
/// generator from bad configuration or when decoding an identifier from
/// external input.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The machine id does not fit the 10-bit machine field.
    #[error("invalid machine id {machine_id}; must be 0 <= id <= {max}")]
    InvalidMachineId { machine_id: i64, max: u64 },

    /// Hex input longer than the 16 characters a `u64` can occupy.
    #[error("id string is {len} characters long; at most 16 hex characters are allowed")]
    TooLong { len: usize },

    /// Hex input containing a character outside `[0-9a-fA-F]`.
    #[error("invalid hex character {ch:?} at index {index}")]
    InvalidHex { ch: char, index: usize },

    /// Hex input rejected by the unsigned integer parser (e.g. empty input).
    #[error("cannot parse id: {0}")]
    ParseInt(#[from] ParseIntError),

    /// Binary input that is not exactly 8 bytes.
    #[error("binary id must be exactly 8 bytes, got {len}")]
    InvalidByteLength { len: usize },

    /// Legacy base64 input that failed to decode.
    #[error("invalid base64 id: {reason}")]
    InvalidBase64 { reason: String },
}
