//! Unified error type for the Liveroom coordinator.

use liveroom_channel::ChannelError;
use liveroom_protocol::ProtocolError;
use liveroom_session::SessionError;

/// Top-level error that wraps all layer-specific errors.
///
/// Consumers of the `liveroom` meta-crate deal with this single type; the
/// `#[from]` attributes auto-generate the conversions so `?` works across
/// layers. Transport errors are boxed because the coordinator is generic
/// over the transport implementation.
#[derive(Debug, thiserror::Error)]
pub enum LiveroomError {
    /// A transport-level failure (connect, send, channel op rejected).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A protocol-level failure (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level failure (credential issuance, login).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A channel-registry failure (not joined, primary protection).
    #[error(transparent)]
    Channel(#[from] ChannelError),
}

impl LiveroomError {
    /// Boxes a transport implementation's error.
    pub fn transport<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Transport(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveroom_protocol::ChannelId;

    #[test]
    fn test_from_channel_error() {
        let err = ChannelError::PrimaryProtected(ChannelId::new("room-1"));
        let top: LiveroomError = err.into();
        assert!(matches!(top, LiveroomError::Channel(_)));
        assert!(top.to_string().contains("room-1"));
    }

    #[test]
    fn test_from_session_error() {
        let err = SessionError::LoginFailed("nope".into());
        let top: LiveroomError = err.into();
        assert!(matches!(top, LiveroomError::Session(_)));
    }

    #[test]
    fn test_boxed_transport_error_keeps_message() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let top = LiveroomError::transport(io);
        assert!(top.to_string().contains("gone"));
    }
}
