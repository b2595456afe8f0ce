//! The event pump: routes transport events into the coordinator's state.
//!
//! Runs as one task per coordinator, consuming [`Transport::recv`] until
//! the connection closes. Connection frames feed the state tracker,
//! membership frames feed the channel set, and primary-channel messages go
//! through the payload dispatcher. Teardown aborts this task as its
//! "remove transport listeners" step.

use std::sync::Arc;

use liveroom_channel::ChannelRole;
use liveroom_protocol::{ChannelId, Codec, MemberId, MessagePayload};
use liveroom_session::ConnectionSignal;
use liveroom_transport::{Transport, TransportEvent};

use crate::EmoteEvent;
use crate::coordinator::Inner;

/// Consumes transport events until the connection ends.
pub(crate) async fn run_pump<T: Transport>(inner: Arc<Inner<T>>) {
    tracing::debug!("event pump started");
    loop {
        match inner.transport.recv().await {
            Ok(Some(event)) => handle_event(&inner, event).await,
            Ok(None) => {
                tracing::info!("transport closed cleanly");
                inner
                    .tracker
                    .signal(ConnectionSignal::TransportDisconnected);
                break;
            }
            Err(e) => {
                tracing::debug!(error = %e, "transport receive error");
                inner
                    .tracker
                    .signal(ConnectionSignal::TransportDisconnected);
                break;
            }
        }
    }
    tracing::debug!("event pump stopped");
}

async fn handle_event<T: Transport>(inner: &Arc<Inner<T>>, event: TransportEvent) {
    match event {
        TransportEvent::Connected => {
            inner.tracker.signal(ConnectionSignal::TransportConnected);
        }
        TransportEvent::Disconnected { reason } => {
            tracing::info!(reason, "transport disconnected");
            inner
                .tracker
                .signal(ConnectionSignal::TransportDisconnected);
        }
        TransportEvent::ReconnectingInterrupted { reason } => {
            tracing::info!(reason, "transport interrupted, recovering");
            inner
                .tracker
                .signal(ConnectionSignal::TransportInterrupted);
        }
        TransportEvent::Message {
            channel,
            sender,
            payload,
        } => {
            dispatch_message(inner, &channel, sender, &payload).await;
        }
        TransportEvent::MemberJoined { channel, member } => {
            let delivered = inner
                .channels
                .lock()
                .await
                .record_joined(&channel, member);
            if !delivered {
                tracing::debug!(channel = %channel, "join event for unknown channel");
            }
        }
        TransportEvent::MemberLeft { channel, member } => {
            let delivered =
                inner.channels.lock().await.record_left(&channel, member);
            if !delivered {
                tracing::debug!(channel = %channel, "leave event for unknown channel");
            }
        }
        TransportEvent::MemberCount { channel, count } => {
            let role = inner
                .channels
                .lock()
                .await
                .record_count(&channel, count);
            // The primary's raw count (self included) is the viewer-count
            // display; spy subscriptions got the adjusted value in the
            // fan-out above.
            if role == Some(ChannelRole::Primary) {
                inner.viewer_count.send_replace(count);
            }
        }
    }
}

/// Decodes a channel message and routes recognized kinds.
///
/// Only the primary channel has a message listener — auxiliary channels
/// are presence-only. Undecodable payloads and unknown kinds are dropped
/// with a debug log, never an error: an old client must survive message
/// kinds added after it shipped.
async fn dispatch_message<T: Transport>(
    inner: &Arc<Inner<T>>,
    channel: &ChannelId,
    sender: MemberId,
    payload: &str,
) {
    let is_primary = {
        let channels = inner.channels.lock().await;
        channels.is_room(channel) && channels.contains(channel)
    };
    if !is_primary {
        tracing::debug!(channel = %channel, "dropping message on non-primary channel");
        return;
    }

    let decoded: MessagePayload =
        match inner.codec.decode(payload.as_bytes()) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::debug!(error = %e, "dropping undecodable payload");
                return;
            }
        };

    match decoded {
        MessagePayload::Emote { emote } => {
            tracing::debug!(%sender, ?emote, "emote received");
            let _ = inner.emote_tx.send(EmoteEvent { emote, sender });
        }
        MessagePayload::Unknown => {
            tracing::debug!(%sender, "dropping unrecognized message kind");
        }
    }
}
