//! Versioned wire codec for queue messages.
//!
//! Every message is framed as `{"v": <version>, "body": {...}}`. Decoding
//! ignores unknown fields in the body, so version N code reads version N
//! frames produced by newer writers that only added fields. A frame whose
//! version is higher than [`WIRE_VERSION`] is rejected outright; such a
//! frame may carry semantics this code cannot honor.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current wire format version.
pub const WIRE_VERSION: u16 = 1;

/// Codec failures.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The frame or body was not valid JSON of the expected shape.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The frame was produced by a newer writer.
    #[error("unsupported wire version {found} (supported up to {supported})")]
    UnsupportedVersion {
        /// Version found in the frame.
        found: u16,
        /// Highest version this code understands.
        supported: u16,
    },
}

#[derive(Serialize)]
struct FrameRef<'a, T> {
    v: u16,
    body: &'a T,
}

#[derive(Deserialize)]
struct RawFrame {
    v: u16,
    body: serde_json::Value,
}

/// Encode a message into a versioned frame.
pub fn encode<T: Serialize>(body: &T) -> Result<Vec<u8>, CodecError> {
    let frame = FrameRef {
        v: WIRE_VERSION,
        body,
    };
    Ok(serde_json::to_vec(&frame)?)
}

/// Encode a message into a versioned frame as a JSON value.
///
/// Used by backends that store frames in JSON columns.
pub fn encode_value<T: Serialize>(body: &T) -> Result<serde_json::Value, CodecError> {
    let frame = FrameRef {
        v: WIRE_VERSION,
        body,
    };
    Ok(serde_json::to_value(&frame)?)
}

/// Decode a versioned frame.
///
/// Accepts any version up to [`WIRE_VERSION`]; unknown body fields are
/// ignored.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    let frame: RawFrame = serde_json::from_slice(bytes)?;
    decode_frame(frame)
}

/// Decode a versioned frame from a JSON value.
pub fn decode_value<T: DeserializeOwned>(value: serde_json::Value) -> Result<T, CodecError> {
    let frame: RawFrame = serde_json::from_value(value)?;
    decode_frame(frame)
}

fn decode_frame<T: DeserializeOwned>(frame: RawFrame) -> Result<T, CodecError> {
    if frame.v > WIRE_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: frame.v,
            supported: WIRE_VERSION,
        });
    }
    Ok(serde_json::from_value(frame.body)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{LogAction, LogSubmission};
    use crate::envelope::Envelope;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_envelope() -> Envelope {
        let entry = LogSubmission::builder(
            "client_a",
            "user-1",
            LogAction::Create,
            "order",
            "ord-1",
            "Order created",
        )
        .build()
        .into_entry(Uuid::new_v4(), Utc::now());
        Envelope::new(entry)
    }

    #[test]
    fn test_round_trip() {
        let envelope = sample_envelope();
        let bytes = encode(&envelope).unwrap();
        let decoded: Envelope = decode(&bytes).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_frame_carries_current_version() {
        let bytes = encode(&sample_envelope()).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["v"], WIRE_VERSION);
        assert!(value["body"].is_object());
    }

    #[test]
    fn test_unknown_body_fields_are_ignored() {
        let envelope = sample_envelope();
        let mut value: serde_json::Value =
            serde_json::from_slice(&encode(&envelope).unwrap()).unwrap();
        value["body"]["added_in_a_future_release"] = serde_json::json!({"nested": true});
        value["body"]["entry"]["another_new_field"] = serde_json::json!(42);

        let bytes = serde_json::to_vec(&value).unwrap();
        let decoded: Envelope = decode(&bytes).unwrap();
        assert_eq!(decoded, envelope);
    }

    #[test]
    fn test_future_version_is_rejected() {
        let mut value: serde_json::Value =
            serde_json::from_slice(&encode(&sample_envelope()).unwrap()).unwrap();
        value["v"] = serde_json::json!(WIRE_VERSION + 1);

        let bytes = serde_json::to_vec(&value).unwrap();
        let err = decode::<Envelope>(&bytes).unwrap_err();
        match err {
            CodecError::UnsupportedVersion { found, supported } => {
                assert_eq!(found, WIRE_VERSION + 1);
                assert_eq!(supported, WIRE_VERSION);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_garbage_is_malformed() {
        let err = decode::<Envelope>(b"not json").unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn test_value_round_trip_matches_bytes() {
        let envelope = sample_envelope();
        let value = encode_value(&envelope).unwrap();
        let from_bytes: serde_json::Value =
            serde_json::from_slice(&encode(&envelope).unwrap()).unwrap();
        assert_eq!(value, from_bytes);

        let decoded: Envelope = decode_value(value).unwrap();
        assert_eq!(decoded, envelope);
    }
}
