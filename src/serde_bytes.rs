//! Serde helpers for byte arrays
//!
//! Fixed-size keys, digests and signatures travel as hex strings in session
//! and output files.

use serde::{Deserialize, Deserializer, Serializer};

fn serialize_hex<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&hex::encode(bytes))
}

fn deserialize_hex<'de, D, const N: usize>(deserializer: D) -> Result<[u8; N], D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| serde::de::Error::custom(format!("expected {} bytes, got {}", N, len)))
}

/// Serialize/deserialize [u8; 32] as hex string
pub mod hex32 {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serialize_hex(bytes, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        deserialize_hex(deserializer)
    }
}

/// Serialize/deserialize [u8; 64] as hex string
pub mod hex64 {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8; 64], serializer: S) -> Result<S::Ok, S::Error> {
        serialize_hex(bytes, serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 64], D::Error> {
        deserialize_hex(deserializer)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Sample {
        #[serde(with = "super::hex32")]
        digest: [u8; 32],
        #[serde(with = "super::hex64")]
        signature: [u8; 64],
    }

    #[test]
    fn test_hex_fields() {
        let sample = Sample {
            digest: [0x11; 32],
            signature: [0x22; 64],
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains(&"11".repeat(32)));
        assert_eq!(serde_json::from_str::<Sample>(&json).unwrap(), sample);
    }

    #[test]
    fn test_accepts_prefix_and_rejects_length() {
        let json = format!(
            r#"{{"digest":"0x{}","signature":"{}"}}"#,
            "ab".repeat(32),
            "cd".repeat(64)
        );
        assert_eq!(serde_json::from_str::<Sample>(&json).unwrap().digest, [0xab; 32]);

        let short = format!(r#"{{"digest":"abcd","signature":"{}"}}"#, "cd".repeat(64));
        assert!(serde_json::from_str::<Sample>(&short).is_err());
    }
}
