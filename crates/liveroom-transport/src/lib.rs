//! Transport abstraction layer for Liveroom.
//!
//! Provides the [`Transport`] trait that abstracts over the client's one
//! logical connection to the messaging backend, plus the default WebSocket
//! implementation.
//!
//! The coordinator issues commands (`login`, `join`, `publish`, …) and
//! consumes [`TransportEvent`]s through [`Transport::recv`]. Commands and
//! events run on separate execution contexts: events arrive whenever the
//! backend pushes them, regardless of what the consumer is doing.
//!
//! No retry happens at this layer. A failed login or join is surfaced to
//! the caller; retry policy belongs to the consumer.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::WebSocketTransport;

use std::collections::HashMap;

use liveroom_protocol::{ChannelId, MemberId};

/// An asynchronous event pushed by the messaging backend.
///
/// Delivery order within one channel follows the backend's order; there is
/// no ordering guarantee across distinct channels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The connection is established (initial login or recovery after an
    /// interruption).
    Connected,

    /// The connection is gone for good: logout or backend-initiated drop.
    Disconnected { reason: String },

    /// A transient interruption; the transport is recovering on its own.
    ReconnectingInterrupted { reason: String },

    /// A message published on a joined channel. `payload` is the raw
    /// JSON string as published; decoding it is the dispatcher's job.
    Message {
        channel: ChannelId,
        sender: MemberId,
        payload: String,
    },

    /// A member joined a joined channel.
    MemberJoined {
        channel: ChannelId,
        member: MemberId,
    },

    /// A member left a joined channel.
    MemberLeft {
        channel: ChannelId,
        member: MemberId,
    },

    /// The backend's member count for a joined channel changed.
    MemberCount { channel: ChannelId, count: usize },
}

/// One logical connection to the messaging backend.
///
/// Login must complete before any channel operation; the window between
/// construction and a successful `login` is invalid for channel access.
/// All operations may suspend and fail independently.
pub trait Transport: Send + Sync + 'static {
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Authenticates this client with the backend.
    async fn login(&self, user: &MemberId, token: &str)
    -> Result<(), Self::Error>;

    /// Ends the session. Channel memberships are dropped by the backend.
    async fn logout(&self) -> Result<(), Self::Error>;

    /// Joins a channel.
    async fn join(&self, channel: &ChannelId) -> Result<(), Self::Error>;

    /// Leaves a channel.
    async fn leave(&self, channel: &ChannelId) -> Result<(), Self::Error>;

    /// Publishes a raw payload string on a channel (best-effort relay).
    async fn publish(
        &self,
        channel: &ChannelId,
        payload: &str,
    ) -> Result<(), Self::Error>;

    /// Fetches the member roster of a channel.
    async fn members(
        &self,
        channel: &ChannelId,
    ) -> Result<Vec<MemberId>, Self::Error>;

    /// Fetches member counts for a set of channels.
    async fn member_counts(
        &self,
        channels: &[ChannelId],
    ) -> Result<HashMap<ChannelId, usize>, Self::Error>;

    /// Receives the next event from the backend.
    ///
    /// Returns `Ok(None)` when the connection is cleanly closed.
    fn recv(
        &self,
    ) -> impl std::future::Future<Output = Result<Option<TransportEvent>, Self::Error>>
    + Send;
}
