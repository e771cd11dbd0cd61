//! Payload serialization.
//!
//! A frame's payload is one serde message in the channel's [`WireFormat`].
//! Both ends of a link must agree on the format; nothing on the wire says
//! which one is in use.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{FrameError, Result};

/// Serialization used for frame payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireFormat {
    /// Compact binary, not self-describing.
    #[default]
    Postcard,
    /// JSON text, for debugging and tooling.
    Json,
}

impl WireFormat {
    /// Serialize `value` into a payload.
    pub fn encode<T: Serialize + ?Sized>(self, value: &T) -> Result<Vec<u8>> {
        let encoded = match self {
            WireFormat::Postcard => postcard::to_allocvec(value).map_err(|e| e.to_string()),
            WireFormat::Json => serde_json::to_vec(value).map_err(|e| e.to_string()),
        };
        encoded.map_err(|message| FrameError::Encode {
            format: self,
            message,
        })
    }

    /// Deserialize a payload. Trailing bytes after a postcard value are ignored.
    pub fn decode<T: DeserializeOwned>(self, payload: &[u8]) -> Result<T> {
        let decoded = match self {
            WireFormat::Postcard => postcard::from_bytes(payload).map_err(|e| e.to_string()),
            WireFormat::Json => serde_json::from_slice(payload).map_err(|e| e.to_string()),
        };
        decoded.map_err(|message| FrameError::Decode {
            format: self,
            message,
        })
    }

    /// Re-express a decoded value as JSON for display.
    pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<serde_json::Value> {
        serde_json::to_value(value).map_err(|e| FrameError::Encode {
            format: WireFormat::Json,
            message: e.to_string(),
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WireFormat::Postcard => "postcard",
            WireFormat::Json => "json",
        }
    }
}

impl fmt::Display for WireFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WireFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postcard" => Ok(WireFormat::Postcard),
            "json" => Ok(WireFormat::Json),
            other => Err(format!("unknown wire format '{other}' (expected postcard or json)")),
        }
    }
}

/// A payload type that can live in a telemetry buffer.
pub trait Message: Serialize + DeserializeOwned + Clone + Send + 'static {}

impl<T> Message for T where T: Serialize + DeserializeOwned + Clone + Send + 'static {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Reading {
        id: u32,
        value: Vec<f32>,
    }

    #[test]
    fn postcard_is_default() {
        assert_eq!(WireFormat::default(), WireFormat::Postcard);
    }

    #[test]
    fn both_formats_carry_messages() {
        let reading = Reading {
            id: 7,
            value: vec![0.5, 1.5],
        };
        for format in [WireFormat::Postcard, WireFormat::Json] {
            let payload = format.encode(&reading).unwrap();
            assert_eq!(format.decode::<Reading>(&payload).unwrap(), reading);
        }
    }

    #[test]
    fn postcard_is_smaller_than_json() {
        let reading = Reading {
            id: 1,
            value: vec![1.0; 8],
        };
        let binary = WireFormat::Postcard.encode(&reading).unwrap();
        let text = WireFormat::Json.encode(&reading).unwrap();
        assert!(binary.len() < text.len());
    }

    #[test]
    fn invalid_payloads_report_format() {
        let err = WireFormat::Postcard
            .decode::<u32>(&[0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF])
            .unwrap_err();
        assert!(matches!(
            err,
            FrameError::Decode {
                format: WireFormat::Postcard,
                ..
            }
        ));

        let err = WireFormat::Json.decode::<Reading>(b"{not json").unwrap_err();
        assert!(err.to_string().starts_with("failed to decode json payload"));
    }

    #[test]
    fn empty_payload_does_not_decode_as_struct() {
        assert!(WireFormat::Postcard.decode::<Reading>(&[]).is_err());
        assert!(WireFormat::Json.decode::<Reading>(&[]).is_err());
    }

    #[test]
    fn parse_and_display() {
        assert_eq!("JSON".parse::<WireFormat>().unwrap(), WireFormat::Json);
        assert_eq!("postcard".parse::<WireFormat>().unwrap(), WireFormat::Postcard);
        assert!("cbor".parse::<WireFormat>().is_err());
        assert_eq!(WireFormat::Json.to_string(), "json");
    }

    #[test]
    fn serde_names_are_lowercase() {
        let json = serde_json::to_string(&WireFormat::Postcard).unwrap();
        assert_eq!(json, "\"postcard\"");
        let parsed: WireFormat = serde_json::from_str("\"json\"").unwrap();
        assert_eq!(parsed, WireFormat::Json);
    }
}
