//! Codec trait and implementations for serializing/deserializing messages.
//!
//! A codec converts between Rust types and raw bytes. The rest of the stack
//! doesn't care HOW messages are serialized — it just needs something that
//! implements the [`Codec`] trait, so a compact binary codec can be swapped
//! in later without touching any other code.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because codecs are shared across long-lived
/// async tasks. The methods are generic over the message type; any
/// `Serialize`/`DeserializeOwned` type works.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Human-readable and inspectable in browser DevTools. Behind the `json`
/// feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use liveroom_protocol::{Codec, EmoteType, JsonCodec, MessagePayload};
///
/// let codec = JsonCodec;
/// let payload = MessagePayload::emote(EmoteType::Clap);
///
/// let bytes = codec.encode(&payload).unwrap();
/// let decoded: MessagePayload = codec.decode(&bytes).unwrap();
/// assert_eq!(payload, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
