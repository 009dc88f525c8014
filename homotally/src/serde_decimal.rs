//! Big integers travel as decimal strings so that any JSON consumer can read them
//! without precision loss.

use num_bigint::BigUint;
use serde::{de, Deserialize, Deserializer, Serializer};
use std::str::FromStr;

/// `#[serde(with = "decimal")]` for a single `BigUint`
pub mod decimal {
    use super::*;

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_decimal(&s).map_err(de::Error::custom)
    }
}

/// `#[serde(with = "decimal_vec")]` for a `Vec<BigUint>`
pub mod decimal_vec {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(values: &[BigUint], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(values.len()))?;
        for value in values {
            seq.serialize_element(&value.to_string())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<BigUint>, D::Error> {
        let strings = Vec::<String>::deserialize(deserializer)?;
        strings
            .iter()
            .map(|s| parse_decimal(s).map_err(de::Error::custom))
            .collect()
    }
}

/// Parse a non-negative decimal integer, tolerating surrounding whitespace.
pub fn parse_decimal(s: &str) -> Result<BigUint, String> {
    let trimmed = s.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("invalid decimal integer: {:?}", s));
    }
    BigUint::from_str(trimmed).map_err(|e| format!("{}", e))
}
