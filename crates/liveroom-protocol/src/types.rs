//! Core protocol types for Liveroom's wire format.
//!
//! Everything here is serialized as JSON and exchanged with the messaging
//! backend. Channel payloads (the content of [`ServerFrame::ChannelMessage`])
//! are a nested layer: the frame carries the payload as an opaque string,
//! and [`MessagePayload`] describes what that string parses to.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a channel (a room in a live session).
///
/// Channel ids are opaque strings assigned by the hosting platform —
/// `"room-1"`, a document id, etc. The newtype keeps them from being mixed
/// up with member ids in function signatures.
///
/// `#[serde(transparent)]` serializes this as a plain string, not as a
/// wrapper object, so `ChannelId("room-1")` becomes `"room-1"` in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(String);

impl ChannelId {
    /// Creates a new `ChannelId` from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChannelId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A unique identifier for a member (a user present in a channel).
///
/// Same newtype pattern as [`ChannelId`]: opaque, string-valued,
/// `#[serde(transparent)]` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberId(String);

impl MemberId {
    /// Creates a new `MemberId` from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MemberId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Channel payloads
// ---------------------------------------------------------------------------

/// The application-level emote vocabulary.
///
/// Rendered as an ephemeral reaction burst by the consumer. Serialized
/// SCREAMING_SNAKE to match the payload discriminator convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmoteType {
    Clap,
    Heart,
    Laugh,
    Wow,
    Party,
}

/// The decoded content of a channel message.
///
/// `#[serde(tag = "kind")]` makes this internally tagged:
///   `{ "kind": "EMOTE", "emote": "CLAP" }`
///
/// Only the emote kind is currently interpreted. Every other tag — including
/// kinds added by future backend versions — deserializes to [`Unknown`]
/// instead of failing, so an old client never chokes on a new message kind.
/// The dispatcher drops `Unknown` without raising an error.
///
/// [`Unknown`]: MessagePayload::Unknown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessagePayload {
    /// An ephemeral reaction broadcast. Fire-and-forget, no persisted state.
    Emote { emote: EmoteType },

    /// Any message kind this client doesn't understand.
    ///
    /// `#[serde(other)]` is the catch-all for unrecognized tags.
    #[serde(other)]
    Unknown,
}

impl MessagePayload {
    /// Builds the outbound payload for an emote broadcast.
    pub fn emote(emote: EmoteType) -> Self {
        Self::Emote { emote }
    }
}

// ---------------------------------------------------------------------------
// Command — client → backend
// ---------------------------------------------------------------------------

/// A request from the client to the messaging backend.
///
/// Every command carries a `seq` so the backend's reply
/// ([`ServerFrame::Ack`] etc.) can be correlated with the request that
/// caused it. Each client maintains its own monotonically increasing
/// counter.
///
/// `#[serde(tag = "type")]` produces internally tagged JSON:
///   `{ "type": "Join", "seq": 3, "channel": "room-2" }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Authenticate this client. Must succeed before any channel command.
    Login {
        seq: u64,
        user: MemberId,
        token: String,
    },

    /// End the session. The backend drops all channel memberships.
    Logout { seq: u64 },

    /// Join a channel.
    Join { seq: u64, channel: ChannelId },

    /// Leave a channel.
    Leave { seq: u64, channel: ChannelId },

    /// Publish an ephemeral payload on a channel.
    ///
    /// `payload` is the JSON-encoded [`MessagePayload`] as a string — the
    /// backend relays it verbatim, it never inspects the content.
    Publish {
        seq: u64,
        channel: ChannelId,
        payload: String,
    },

    /// Request the member roster of a channel.
    Members { seq: u64, channel: ChannelId },

    /// Request member counts for a set of channels.
    MemberCounts {
        seq: u64,
        channels: Vec<ChannelId>,
    },
}

impl Command {
    /// Returns the correlation sequence number of this command.
    pub fn seq(&self) -> u64 {
        match self {
            Self::Login { seq, .. }
            | Self::Logout { seq }
            | Self::Join { seq, .. }
            | Self::Leave { seq, .. }
            | Self::Publish { seq, .. }
            | Self::Members { seq, .. }
            | Self::MemberCounts { seq, .. } => *seq,
        }
    }
}

// ---------------------------------------------------------------------------
// ServerFrame — backend → client
// ---------------------------------------------------------------------------

/// A frame from the messaging backend to the client.
///
/// Two families share this enum:
///
/// - **Replies** (`Ack`, `Nack`, `MemberList`, `Counts`) carry the `seq` of
///   the [`Command`] they answer.
/// - **Events** (everything else) are unsolicited: connection lifecycle,
///   channel messages, and membership changes arrive whenever the backend
///   decides, on its own execution context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerFrame {
    // -- Replies --
    /// The command identified by `seq` succeeded.
    Ack { seq: u64 },

    /// The command identified by `seq` was rejected.
    Nack { seq: u64, message: String },

    /// Reply to [`Command::Members`].
    MemberList { seq: u64, members: Vec<MemberId> },

    /// Reply to [`Command::MemberCounts`].
    Counts {
        seq: u64,
        counts: HashMap<ChannelId, usize>,
    },

    // -- Connection lifecycle events --
    /// The connection to the backend is established (also emitted on
    /// recovery after an interruption).
    Connected,

    /// The connection is gone: explicit logout or backend-initiated drop.
    Disconnected { reason: String },

    /// The connection blipped; the backend is re-establishing it while the
    /// session stays logically active.
    Reconnecting { reason: String },

    // -- Channel events --
    /// A message published on a joined channel. `payload` is the raw
    /// JSON-encoded [`MessagePayload`] string, exactly as published.
    ChannelMessage {
        channel: ChannelId,
        sender: MemberId,
        payload: String,
    },

    /// A member joined a channel this client is in.
    MemberJoined {
        channel: ChannelId,
        member: MemberId,
    },

    /// A member left a channel this client is in.
    MemberLeft {
        channel: ChannelId,
        member: MemberId,
    },

    /// The backend's authoritative member count for a channel changed.
    MemberCountUpdated { channel: ChannelId, count: usize },
}

impl ServerFrame {
    /// Returns the correlation `seq` if this frame is a reply, `None` for
    /// unsolicited events.
    pub fn reply_seq(&self) -> Option<u64> {
        match self {
            Self::Ack { seq }
            | Self::Nack { seq, .. }
            | Self::MemberList { seq, .. }
            | Self::Counts { seq, .. } => Some(*seq),
            _ => None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
