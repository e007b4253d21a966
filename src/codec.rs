//! Payload codec - values to opaque bytes and back
//!
//! Values are encoded with bincode via their serde impls. A zero-length
//! payload is reserved for the absent value: `encode(None)` produces it and
//! `decode` maps it back to `None`, so "no data" is always distinguishable
//! from a payload that fails to decode.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{Error, Result};

/// Encode a value to an opaque payload. None encodes to zero bytes.
pub fn encode<T: Serialize>(value: Option<&T>) -> Result<Vec<u8>> {
    match value {
        Some(v) => bincode::serialize(v).map_err(Error::Encode),
        None => Ok(Vec::new()),
    }
}

/// Decode a payload produced by `encode`.
///
/// Zero bytes decode to None; anything else either decodes to the value or
/// fails with [`Error::Decode`] (truncated or foreign bytes).
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<Option<T>> {
    if bytes.is_empty() {
        return Ok(None);
    }

    bincode::deserialize(bytes).map(Some).map_err(Error::Decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    enum Grade {
        Fresh,
        Aged { years: u8 },
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Cheese {
        name: String,
        grade: Grade,
        tags: Vec<String>,
        stock: Option<u32>,
    }

    fn sample() -> Cheese {
        Cheese {
            name: "Comté".to_string(),
            grade: Grade::Aged { years: 3 },
            tags: vec!["hard".to_string(), "raw milk".to_string()],
            stock: Some(12),
        }
    }

    #[test]
    fn test_round_trip() {
        let value = sample();
        let bytes = encode(Some(&value)).unwrap();
        assert!(!bytes.is_empty());

        let back: Cheese = decode(&bytes).unwrap().unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_none_round_trips_through_empty_payload() {
        let bytes = encode::<Cheese>(None).unwrap();
        assert!(bytes.is_empty());

        let back: Option<Cheese> = decode(&bytes).unwrap();
        assert!(back.is_none());
    }

    #[test]
    fn test_malformed_payload_is_a_decode_error() {
        // non-empty garbage must fail loudly, never read as "no data"
        let result: Result<Option<Cheese>> = decode(&[0xFF, 0x01, 0x02]);
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_truncated_payload_is_a_decode_error() {
        let bytes = encode(Some(&sample())).unwrap();
        let result: Result<Option<Cheese>> = decode(&bytes[..bytes.len() / 2]);
        assert!(matches!(result, Err(Error::Decode(_))));
    }
}
