//! JSON/document encoding for [`SnowflakeId`].
//!
//! The canonical form is the lowercase hex text wrapped in a string, e.g.
//! `"5a1f3c0000c005"`; it is the only form ever emitted. Deserialization
//! also takes the legacy encoding older deployments produced: standard,
//! padded base64 of the 8-byte big-endian binary form (`"AAAAAAAAAAE="`).
//! The two cannot be confused, since a padded 8-byte base64 string is always
//! 12 characters ending in `=`.

use ::serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use base64::{Engine, engine::general_purpose::STANDARD};
use core::fmt;

use crate::{Error, SnowflakeId, id::ID_SIZE};

const LEGACY_BASE64_LEN: usize = 12;

impl Serialize for SnowflakeId {
    fn serialize<S>(&self, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SnowflakeId {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_str(IdVisitor)
    }
}

struct IdVisitor;

impl de::Visitor<'_> for IdVisitor {
    type Value = SnowflakeId;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a hex encoded id string")
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
    where
        E: de::Error,
    {
        let decoded = if is_legacy_base64(v) {
            decode_legacy_base64(v)
        } else {
            v.parse()
        };
        decoded.map_err(E::custom)
    }
}

fn is_legacy_base64(v: &str) -> bool {
    v.len() == LEGACY_BASE64_LEN && v.ends_with('=')
}

fn decode_legacy_base64(v: &str) -> Result<SnowflakeId, Error> {
    let bytes = STANDARD.decode(v).map_err(|e| Error::InvalidBase64 {
        reason: e.to_string(),
    })?;
    if bytes.len() != ID_SIZE {
        return Err(Error::InvalidByteLength { len: bytes.len() });
    }
    SnowflakeId::try_from(bytes.as_slice())
}

#[cfg(test)]
mod tests {
    use crate::SnowflakeId;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(PartialEq, Eq, Debug, Serialize, Deserialize)]
    struct Row {
        event_id: SnowflakeId,
    }

    #[test]
    fn serializes_as_quoted_hex() {
        let row = Row {
            event_id: SnowflakeId::from_raw(0xabc),
        };
        let json = serde_json::to_string(&row).expect("serialize");
        assert_eq!(json, r#"{"event_id":"abc"}"#);

        let back: Row = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, row);
    }

    #[test]
    fn bare_id_is_a_json_string() {
        let id = SnowflakeId::from_raw(u64::MAX);
        assert_eq!(serde_json::to_value(id).unwrap(), json!("ffffffffffffffff"));
    }

    #[test]
    fn accepts_legacy_base64() {
        let row: Row = serde_json::from_value(json!({"event_id": "AAAAAAAAAAE="})).unwrap();
        assert_eq!(row.event_id, SnowflakeId::from_raw(1));

        let row: Row = serde_json::from_value(json!({"event_id": "AQIDBAUGBwg="})).unwrap();
        assert_eq!(row.event_id, SnowflakeId::from_raw(0x0102_0304_0506_0708));
    }

    #[test]
    fn rejects_malformed_strings() {
        for bad in ["", "xyz", "00000000000000000", "AAAAAAAAAA*="] {
            let res = serde_json::from_value::<Row>(json!({ "event_id": bad }));
            assert!(res.is_err(), "{bad:?} should not decode");
        }
    }

    #[test]
    fn rejects_numbers() {
        let res = serde_json::from_value::<Row>(json!({"event_id": 42}));
        assert!(res.is_err());
    }

    #[test]
    fn error_message_names_the_problem() {
        let err = serde_json::from_str::<Row>(r#"{"event_id":"12g4"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid hex character 'g'"));
    }
}
