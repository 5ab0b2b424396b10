//! Data policies
//!
//! A [`DataPolicy`] decides how a [`Value`] crosses the byte boundary into
//! the file and credential backends. `Raw` passes bytes through untouched;
//! `Archived` wraps values in a self-describing tagged blob whose decode
//! side is restricted to the closed [`Value`] variant set.

use crate::error::{Result, StorageError};
use crate::value::Value;

/// Encoding contract applied before a value reaches a byte-oriented backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataPolicy {
    /// Save and load byte payloads as is
    #[default]
    Raw,
    /// Archive values into a tagged, self-describing blob before save and
    /// restore them through the safelisted decoder on load
    Archived,
}

impl DataPolicy {
    /// Encode a value into the byte payload written to the backend
    ///
    /// Under `Raw`, only `Bytes` passes through; `String` is transcoded to
    /// its UTF-8 bytes. Any other variant has no raw byte form and the
    /// write fails instead of being silently dropped.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        match self {
            DataPolicy::Raw => match value {
                Value::Bytes(bytes) => Ok(bytes.clone()),
                Value::String(s) => Ok(s.as_bytes().to_vec()),
                other => Err(StorageError::UnexpectedValueType(format!(
                    "{} value has no raw byte form",
                    other.kind()
                ))),
            },
            DataPolicy::Archived => Ok(serde_json::to_vec(value)?),
        }
    }

    /// Decode a byte payload read from the backend
    ///
    /// Under `Archived`, a blob tagged with a type outside the [`Value`]
    /// variant set fails to decode; no unlisted type is ever materialized.
    pub fn decode(&self, bytes: &[u8]) -> Result<Value> {
        match self {
            DataPolicy::Raw => Ok(Value::Bytes(bytes.to_vec())),
            DataPolicy::Archived => Ok(serde_json::from_slice(bytes)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;

    #[test]
    fn test_raw_bytes_pass_through() {
        let value = Value::Bytes(b"hello".to_vec());
        let encoded = DataPolicy::Raw.encode(&value).unwrap();
        assert_eq!(encoded, b"hello");
        assert_eq!(DataPolicy::Raw.decode(&encoded).unwrap(), value);
    }

    #[test]
    fn test_raw_strings_transcode_to_utf8() {
        let encoded = DataPolicy::Raw.encode(&Value::String("héllo".into())).unwrap();
        assert_eq!(encoded, "héllo".as_bytes());
    }

    #[test]
    fn test_raw_rejects_non_byte_values() {
        let err = DataPolicy::Raw.encode(&Value::Int(7)).unwrap_err();
        assert!(matches!(err, StorageError::UnexpectedValueType(_)));
    }

    #[test]
    fn test_archived_round_trips_every_shape() {
        let mut map = BTreeMap::new();
        map.insert("flag".to_string(), Value::Bool(true));

        let values = vec![
            Value::Int(-3),
            Value::UInt(9),
            Value::Float(2.5),
            Value::Bool(false),
            Value::String("text".into()),
            Value::Bytes(vec![0, 159, 146, 150]),
            Value::Timestamp(Utc::now()),
            Value::Array(vec![Value::Int(1), Value::String("two".into())]),
            Value::Map(map),
        ];

        for value in values {
            let encoded = DataPolicy::Archived.encode(&value).unwrap();
            let decoded = DataPolicy::Archived.decode(&encoded).unwrap();
            assert_eq!(decoded, value);
        }
    }

    #[test]
    fn test_archived_blob_is_self_describing() {
        let encoded = DataPolicy::Archived.encode(&Value::Int(5)).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(json["type"], "int");
        assert_eq!(json["value"], 5);
    }

    #[test]
    fn test_archived_bytes_are_base64_in_the_blob() {
        let encoded = DataPolicy::Archived
            .encode(&Value::Bytes(b"hi".to_vec()))
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&encoded).unwrap();
        assert_eq!(json["value"], "aGk=");
    }

    #[test]
    fn test_decode_rejects_types_outside_the_allow_list() {
        let blob = br#"{"type":"closure","value":"exec"}"#;
        let err = DataPolicy::Archived.decode(blob).unwrap_err();
        assert!(matches!(err, StorageError::Archive(_)));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(DataPolicy::Archived.decode(b"\x00\x01\x02").is_err());
    }
}
