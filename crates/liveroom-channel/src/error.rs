//! Error types for the channel layer.

use liveroom_protocol::ChannelId;

/// Errors that can occur during registry operations.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The channel is not in the set.
    #[error("channel {0} not joined")]
    NotJoined(ChannelId),

    /// The channel is already in the set.
    #[error("channel {0} already joined")]
    AlreadyJoined(ChannelId),

    /// A generic leave was aimed at the primary channel. Only teardown
    /// may remove the primary entry.
    #[error("channel {0} is the primary channel and cannot be left")]
    PrimaryProtected(ChannelId),

    /// An operation required the primary channel but none is joined yet.
    #[error("primary channel not joined")]
    PrimaryMissing,

    /// The operation resolved after teardown had begun.
    #[error("coordinator is torn down")]
    Closed,
}
