use core::{fmt, str::FromStr};

use crate::{Error, Result};

/// Width of the timestamp field, in bits.
pub const TIMESTAMP_BITS: u32 = 42;
/// Width of the machine id field, in bits.
pub const MACHINE_ID_BITS: u32 = 10;
/// Width of the sequence field, in bits.
pub const SEQUENCE_BITS: u32 = 12;

/// Bit offset of the machine id field.
pub const MACHINE_ID_SHIFT: u32 = SEQUENCE_BITS;
/// Bit offset of the timestamp field.
pub const TIMESTAMP_SHIFT: u32 = SEQUENCE_BITS + MACHINE_ID_BITS;

/// Unshifted mask of the timestamp field.
pub const TIMESTAMP_MASK: u64 = (1 << TIMESTAMP_BITS) - 1;
/// Unshifted mask of the machine id field.
pub const MACHINE_ID_MASK: u64 = (1 << MACHINE_ID_BITS) - 1;
/// Unshifted mask of the sequence field.
pub const SEQUENCE_MASK: u64 = (1 << SEQUENCE_BITS) - 1;

/// Number of bytes in the fixed-width binary encoding.
pub const ID_SIZE: usize = core::mem::size_of::<u64>();

/// Maximum number of hex characters accepted by [`SnowflakeId::from_str`].
const MAX_HEX_LEN: usize = 16;

/// A 64-bit Snowflake identifier.
///
/// Layout, most significant bit first:
///
/// ```text
///  Bit Index:  63           22 21        12 11           0
///              +--------------+------------+-------------+
///  Field:      | timestamp    | machine ID | sequence    |
///              +--------------+------------+-------------+
///              |<- 42 bits  ->|<- 10 bits->|<- 12 bits ->|
/// ```
///
/// Identifiers compare by their raw value, so ordering follows timestamp
/// first, then machine id, then sequence.
///
/// # Encodings
///
/// - Text: lowercase hex without prefix or padding (`Display`, `FromStr`)
/// - Binary: 8 bytes, big-endian ([`Self::to_be_bytes`])
/// - JSON (feature `serde`): the text form as a JSON string
///
/// ```
/// use snowman::SnowflakeId;
///
/// let id = SnowflakeId::from_components(1000, 2, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.machine_id(), 2);
/// assert_eq!(id.sequence(), 1);
/// assert_eq!(id.to_string(), "fa002001");
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Packs the three fields into an identifier. Each component is masked to
    /// its field width.
    #[must_use]
    pub const fn from_components(timestamp: u64, machine_id: u64, sequence: u64) -> Self {
        let t = (timestamp & TIMESTAMP_MASK) << TIMESTAMP_SHIFT;
        let m = (machine_id & MACHINE_ID_MASK) << MACHINE_ID_SHIFT;
        let s = sequence & SEQUENCE_MASK;
        Self { id: t | m | s }
    }

    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    #[must_use]
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Milliseconds since the generator's epoch.
    #[must_use]
    pub const fn timestamp(&self) -> u64 {
        (self.id >> TIMESTAMP_SHIFT) & TIMESTAMP_MASK
    }

    #[must_use]
    pub const fn machine_id(&self) -> u64 {
        (self.id >> MACHINE_ID_SHIFT) & MACHINE_ID_MASK
    }

    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.id & SEQUENCE_MASK
    }

    #[must_use]
    pub const fn max_timestamp() -> u64 {
        TIMESTAMP_MASK
    }

    #[must_use]
    pub const fn max_machine_id() -> u64 {
        MACHINE_ID_MASK
    }

    #[must_use]
    pub const fn max_sequence() -> u64 {
        SEQUENCE_MASK
    }

    /// Big-endian fixed-width binary encoding.
    #[must_use]
    pub const fn to_be_bytes(&self) -> [u8; ID_SIZE] {
        self.id.to_be_bytes()
    }

    #[must_use]
    pub const fn from_be_bytes(bytes: [u8; ID_SIZE]) -> Self {
        Self::from_raw(u64::from_be_bytes(bytes))
    }
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.to_raw()
    }
}

impl TryFrom<&[u8]> for SnowflakeId {
    type Error = Error;

    /// Decodes the 8-byte big-endian binary form.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidByteLength`] unless `bytes` is exactly 8 bytes
    /// long.
    fn try_from(bytes: &[u8]) -> Result<Self> {
        let buf: [u8; ID_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::InvalidByteLength { len: bytes.len() })?;
        Ok(Self::from_be_bytes(buf))
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.id, f)
    }
}

impl fmt::LowerHex for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.id, f)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("id", &format_args!("{:x}", self.id))
            .field("timestamp", &self.timestamp())
            .field("machine_id", &self.machine_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

impl FromStr for SnowflakeId {
    type Err = Error;

    /// Parses the hex text form. Upper and lower case digits are accepted; no
    /// prefix or sign is allowed.
    ///
    /// # Errors
    ///
    /// - [`Error::TooLong`] for more than 16 characters
    /// - [`Error::InvalidHex`] for any non-hex character
    /// - [`Error::ParseInt`] for anything else the integer parser rejects
    ///   (i.e. empty input)
    fn from_str(s: &str) -> Result<Self> {
        if s.len() > MAX_HEX_LEN {
            return Err(Error::TooLong { len: s.len() });
        }
        if let Some((index, ch)) = s.char_indices().find(|(_, c)| !c.is_ascii_hexdigit()) {
            return Err(Error::InvalidHex { ch, index });
        }
        let raw = u64::from_str_radix(s, 16)?;
        Ok(Self::from_raw(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_roundtrip() {
        let id = SnowflakeId::from_components(
            SnowflakeId::max_timestamp(),
            SnowflakeId::max_machine_id(),
            SnowflakeId::max_sequence(),
        );
        assert_eq!(id.to_raw(), u64::MAX);
        assert_eq!(id.timestamp(), TIMESTAMP_MASK);
        assert_eq!(id.machine_id(), 1023);
        assert_eq!(id.sequence(), 4095);

        let id = SnowflakeId::from_components(42, 5, 7);
        assert_eq!(id.to_raw(), (42 << 22) | (5 << 12) | 7);
    }

    #[test]
    fn components_are_masked() {
        let id = SnowflakeId::from_components(0, 1024 + 3, 4096 + 9);
        assert_eq!(id.machine_id(), 3);
        assert_eq!(id.sequence(), 9);
        assert_eq!(id.timestamp(), 0);
    }

    #[test]
    fn hex_is_lowercase_and_unpadded() {
        assert_eq!(SnowflakeId::from_raw(0).to_string(), "0");
        assert_eq!(SnowflakeId::from_raw(0xABCDEF).to_string(), "abcdef");
        assert_eq!(SnowflakeId::from_raw(u64::MAX).to_string(), "ffffffffffffffff");
    }

    #[test]
    fn hex_roundtrip_random() {
        let samples = [0, 1, 0xf, 0x10, u64::MAX, u64::MAX - 1, 1 << 63];
        let random = (0..10_000).map(|_| rand::random::<u64>());
        for raw in samples.into_iter().chain(random) {
            let id = SnowflakeId::from_raw(raw);
            assert_eq!(id.to_string().parse::<SnowflakeId>(), Ok(id));
        }
    }

    #[test]
    fn parse_accepts_uppercase_and_leading_zeros() {
        assert_eq!("00000000000000FF".parse(), Ok(SnowflakeId::from_raw(0xff)));
        assert_eq!("DeadBeef".parse(), Ok(SnowflakeId::from_raw(0xdead_beef)));
    }

    #[test]
    fn parse_rejects_seventeen_chars() {
        let err = "0".repeat(17).parse::<SnowflakeId>().unwrap_err();
        assert_eq!(err, Error::TooLong { len: 17 });
    }

    #[test]
    fn parse_rejects_non_hex() {
        assert_eq!(
            "12g4".parse::<SnowflakeId>(),
            Err(Error::InvalidHex { ch: 'g', index: 2 })
        );
        assert_eq!(
            "+1".parse::<SnowflakeId>(),
            Err(Error::InvalidHex { ch: '+', index: 0 })
        );
        assert!(matches!(
            "0x12".parse::<SnowflakeId>(),
            Err(Error::InvalidHex { ch: 'x', index: 1 })
        ));
    }

    #[test]
    fn parse_rejects_empty() {
        assert!(matches!(
            "".parse::<SnowflakeId>(),
            Err(Error::ParseInt(_))
        ));
    }

    #[test]
    fn binary_is_big_endian() {
        let id = SnowflakeId::from_raw(0x0102_0304_0506_0708);
        assert_eq!(id.to_be_bytes(), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(SnowflakeId::try_from(&id.to_be_bytes()[..]), Ok(id));
    }

    #[test]
    fn binary_rejects_wrong_length() {
        assert_eq!(
            SnowflakeId::try_from(&[0_u8; 7][..]),
            Err(Error::InvalidByteLength { len: 7 })
        );
        assert_eq!(
            SnowflakeId::try_from(&[0_u8; 9][..]),
            Err(Error::InvalidByteLength { len: 9 })
        );
    }

    #[test]
    fn debug_shows_fields() {
        let id = SnowflakeId::from_components(3, 5, 7);
        let dbg = format!("{id:?}");
        assert!(dbg.contains("timestamp: 3"));
        assert!(dbg.contains("machine_id: 5"));
        assert!(dbg.contains("sequence: 7"));
    }
}
