//! Owned subscription values returned from channel joins.
//!
//! Listener lifetime is always tied to a concrete owned value: dropping a
//! subscription is the unsubscribe step, and teardown drops every sender
//! so no listener can fire for a released channel.

use liveroom_channel::{ChannelHandle, MembershipEvent};
use liveroom_protocol::{ChannelId, EmoteType, MemberId};
use tokio::sync::mpsc;

/// A decoded reaction received on the primary channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmoteEvent {
    /// Which emote was broadcast.
    pub emote: EmoteType,
    /// Who broadcast it.
    pub sender: MemberId,
}

/// An owned membership subscription on an observed channel.
///
/// Returned by [`Coordinator::join_auxiliary`]. Count events are already
/// spy-adjusted (the observer's own presence subtracted). When the target
/// was the session's own room, [`handle`] reports the primary channel —
/// the registry redirected instead of joining twice.
///
/// [`Coordinator::join_auxiliary`]: crate::Coordinator::join_auxiliary
/// [`handle`]: SpySubscription::handle
#[derive(Debug)]
pub struct SpySubscription {
    handle: ChannelHandle,
    events: mpsc::UnboundedReceiver<MembershipEvent>,
}

impl SpySubscription {
    pub(crate) fn new(
        handle: ChannelHandle,
        events: mpsc::UnboundedReceiver<MembershipEvent>,
    ) -> Self {
        Self { handle, events }
    }

    /// Snapshot of the observed channel at join time.
    pub fn handle(&self) -> &ChannelHandle {
        &self.handle
    }

    /// The observed channel's id.
    pub fn channel_id(&self) -> &ChannelId {
        self.handle.channel_id()
    }

    /// Receives the next membership event, or `None` once the channel has
    /// been left or torn down.
    pub async fn recv(&mut self) -> Option<MembershipEvent> {
        self.events.recv().await
    }

    /// Non-blocking variant of [`recv`](Self::recv).
    pub fn try_recv(&mut self) -> Option<MembershipEvent> {
        self.events.try_recv().ok()
    }
}
