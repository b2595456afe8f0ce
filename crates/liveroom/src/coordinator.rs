//! The coordinator: one owned instance per live session.
//!
//! Owns the transport, the connection tracker, and the channel set. The
//! consumer constructs it with a [`SessionIdentity`], connects once, and
//! passes the coordinator by reference into whatever views need it — there
//! is no ambient/global instance.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};

use liveroom_channel::{ChannelError, ChannelHandle, ChannelSet};
use liveroom_protocol::{
    ChannelId, Codec, EmoteType, JsonCodec, MemberId, MessagePayload,
};
use liveroom_session::{
    ConnectionSignal, ConnectionState, ConnectionTracker, CredentialProvider,
    SessionError, SessionIdentity,
};
use liveroom_transport::Transport;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;

use crate::{
    CoordinatorConfig, CoordinatorWarning, EmoteEvent, LiveroomError,
    SpySubscription,
};

/// Coordinates the real-time channels of one live session.
///
/// Cheap to clone; clones share the same underlying instance. All
/// operations are async and may fail independently. Operations against the
/// *same* channel must be serialized by the caller (don't leave a channel
/// whose join hasn't resolved); operations against different channels have
/// no ordering relationship.
pub struct Coordinator<T: Transport> {
    inner: Arc<Inner<T>>,
}

impl<T: Transport> Clone for Coordinator<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

pub(crate) struct Inner<T: Transport> {
    pub(crate) identity: SessionIdentity,
    pub(crate) transport: Arc<T>,
    pub(crate) config: CoordinatorConfig,
    pub(crate) codec: JsonCodec,
    pub(crate) tracker: ConnectionTracker,
    pub(crate) channels: Mutex<ChannelSet>,
    pub(crate) viewer_count: watch::Sender<usize>,
    pub(crate) emote_tx: mpsc::UnboundedSender<EmoteEvent>,
    emote_rx: StdMutex<Option<mpsc::UnboundedReceiver<EmoteEvent>>>,
    pub(crate) warning_tx: mpsc::UnboundedSender<CoordinatorWarning>,
    warning_rx: StdMutex<Option<mpsc::UnboundedReceiver<CoordinatorWarning>>>,
    torn_down: AtomicBool,
    pump: StdMutex<Option<JoinHandle<()>>>,
}

impl<T: Transport> Coordinator<T> {
    /// Creates a coordinator for one session.
    ///
    /// Nothing happens on the wire until [`connect`](Self::connect).
    pub fn new(
        identity: SessionIdentity,
        transport: T,
        config: CoordinatorConfig,
    ) -> Self {
        let (viewer_count, _) = watch::channel(0);
        let (emote_tx, emote_rx) = mpsc::unbounded_channel();
        let (warning_tx, warning_rx) = mpsc::unbounded_channel();
        let room_id = identity.room_id().clone();
        Self {
            inner: Arc::new(Inner {
                identity,
                transport: Arc::new(transport),
                config,
                codec: JsonCodec,
                tracker: ConnectionTracker::new(),
                channels: Mutex::new(ChannelSet::new(room_id)),
                viewer_count,
                emote_tx,
                emote_rx: StdMutex::new(Some(emote_rx)),
                warning_tx,
                warning_rx: StdMutex::new(Some(warning_rx)),
                torn_down: AtomicBool::new(false),
                pump: StdMutex::new(None),
            }),
        }
    }

    /// The identity this coordinator is bound to.
    pub fn identity(&self) -> &SessionIdentity {
        &self.inner.identity
    }

    /// The current connection state (read-only).
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.tracker.state()
    }

    /// A watch on connection-state changes, for rendering status.
    pub fn connection_states(&self) -> watch::Receiver<ConnectionState> {
        self.inner.tracker.subscribe()
    }

    /// A watch on the primary channel's raw member count (includes self).
    pub fn viewer_counts(&self) -> watch::Receiver<usize> {
        self.inner.viewer_count.subscribe()
    }

    /// Takes the stream of decoded emotes from the primary channel.
    ///
    /// The receiver exists exactly once — the message listener is attached
    /// a single time per session. Returns `None` on every call after the
    /// first.
    pub fn emote_events(&self) -> Option<mpsc::UnboundedReceiver<EmoteEvent>> {
        self.inner
            .emote_rx
            .lock()
            .expect("emote receiver lock poisoned")
            .take()
    }

    /// Takes the stream of background warnings.
    ///
    /// Only populated when [`CoordinatorConfig::surface_warnings`] is set;
    /// warnings are always logged either way. Take-once like
    /// [`emote_events`](Self::emote_events).
    pub fn warnings(&self) -> Option<mpsc::UnboundedReceiver<CoordinatorWarning>> {
        self.inner
            .warning_rx
            .lock()
            .expect("warning receiver lock poisoned")
            .take()
    }

    /// Number of currently joined channels (primary included).
    pub async fn channel_count(&self) -> usize {
        self.inner.channels.lock().await.len()
    }

    /// Logs in and joins the primary channel.
    ///
    /// Issues a credential through `provider`, authenticates the
    /// transport, starts the event pump, and ensures the primary channel
    /// is joined. On login failure the state machine returns to
    /// `Uninitialized` and no retry is attempted — retry policy belongs to
    /// the caller.
    pub async fn connect<P: CredentialProvider>(
        &self,
        provider: &P,
    ) -> Result<ChannelHandle, LiveroomError> {
        if self.inner.is_torn_down() {
            return Err(ChannelError::Closed.into());
        }

        self.inner.tracker.signal(ConnectionSignal::LoginStarted);

        let credential = match provider
            .issue(self.inner.identity.user_id(), self.inner.identity.room_id())
            .await
        {
            Ok(credential) => credential,
            Err(e) => {
                self.inner.tracker.signal(ConnectionSignal::LoginFailed);
                return Err(e.into());
            }
        };

        if let Err(e) = self
            .inner
            .transport
            .login(&credential.user_id, &credential.token)
            .await
        {
            self.inner.tracker.signal(ConnectionSignal::LoginFailed);
            return Err(SessionError::LoginFailed(e.to_string()).into());
        }
        tracing::info!(identity = %self.inner.identity, "logged in");

        self.spawn_pump();
        self.ensure_primary_joined().await
    }

    /// Idempotently joins the primary (room) channel.
    ///
    /// If the primary handle exists it is returned as-is; otherwise one
    /// join request goes to the transport and the entry is registered.
    /// Must run after a successful login.
    pub async fn ensure_primary_joined(
        &self,
    ) -> Result<ChannelHandle, LiveroomError> {
        if self.inner.is_torn_down() {
            return Err(ChannelError::Closed.into());
        }

        // The lock is held across the join so concurrent callers can't
        // race a second join for the same channel.
        let mut channels = self.inner.channels.lock().await;
        if let Some(handle) = channels.primary() {
            return Ok(handle);
        }

        let room_id = channels.room_id().clone();
        self.inner
            .transport
            .join(&room_id)
            .await
            .map_err(LiveroomError::transport)?;

        if self.inner.is_torn_down() {
            // Teardown won the race while the join was in flight: leave
            // best-effort rather than keep a subscription nobody owns.
            self.inner.cleanup_leave(&room_id).await;
            return Err(ChannelError::Closed.into());
        }

        let handle = channels.insert_primary()?;
        tracing::info!(channel = %room_id, "primary channel joined");
        Ok(handle)
    }

    /// Joins a channel for observation and returns the owned subscription.
    ///
    /// When `target` is the session's own room, no second join happens:
    /// the subscription attaches to the existing primary entry and the
    /// returned handle reports `is_primary() == true`. Auxiliary channels
    /// are presence-only — channel messages are only dispatched for the
    /// primary.
    pub async fn join_auxiliary(
        &self,
        target: ChannelId,
    ) -> Result<SpySubscription, LiveroomError> {
        if self.inner.is_torn_down() {
            return Err(ChannelError::Closed.into());
        }

        let mut channels = self.inner.channels.lock().await;

        if channels.is_room(&target) && !channels.contains(&target) {
            return Err(ChannelError::PrimaryMissing.into());
        }

        // Already joined (the primary, or an auxiliary someone else is
        // observing): attach another subscriber, never a duplicate entry.
        if let Some(handle) = channels.handle(&target) {
            let events = channels.subscribe(&target)?;
            tracing::debug!(
                channel = %target,
                "join target already joined, attaching observer"
            );
            return Ok(SpySubscription::new(handle, events));
        }

        self.inner
            .transport
            .join(&target)
            .await
            .map_err(LiveroomError::transport)?;

        if self.inner.is_torn_down() {
            self.inner.cleanup_leave(&target).await;
            return Err(ChannelError::Closed.into());
        }

        let handle = channels.insert_auxiliary(target.clone())?;
        let events = channels.subscribe(&target)?;
        tracing::info!(channel = %target, "auxiliary channel joined");
        Ok(SpySubscription::new(handle, events))
    }

    /// Leaves an observed channel.
    ///
    /// A no-op `Ok` when `channel` is the primary — a generic leave must
    /// never remove the room channel; only teardown does. Listeners are
    /// removed before the transport leave, so nothing fires for a channel
    /// that has begun leaving.
    pub async fn leave_auxiliary(
        &self,
        channel: &ChannelId,
    ) -> Result<(), LiveroomError> {
        let mut channels = self.inner.channels.lock().await;

        if channels.is_room(channel) {
            tracing::debug!(channel = %channel, "refusing to leave primary channel");
            return Ok(());
        }

        channels.remove_auxiliary(channel)?;
        drop(channels);

        self.inner
            .transport
            .leave(channel)
            .await
            .map_err(LiveroomError::transport)?;
        tracing::info!(channel = %channel, "auxiliary channel left");
        Ok(())
    }

    /// Broadcasts an emote on the primary channel, fire-and-forget.
    ///
    /// Every failure is swallowed (logged, optionally surfaced as a
    /// warning): an emote is a best-effort ambient signal, and a retried
    /// send would risk a duplicate burst.
    pub async fn send_emote(&self, emote: EmoteType) {
        if self.inner.is_torn_down() {
            tracing::debug!("dropping emote after teardown");
            return;
        }

        let room_id = {
            let channels = self.inner.channels.lock().await;
            match channels.primary() {
                Some(_) => channels.room_id().clone(),
                None => {
                    self.inner.warn(CoordinatorWarning::EmoteSendFailed {
                        detail: "primary channel not joined".into(),
                    });
                    return;
                }
            }
        };

        let payload = MessagePayload::emote(emote);
        let text = match self
            .inner
            .codec
            .encode(&payload)
            .map(String::from_utf8)
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                self.inner.warn(CoordinatorWarning::EmoteSendFailed {
                    detail: e.to_string(),
                });
                return;
            }
            Err(e) => {
                self.inner.warn(CoordinatorWarning::EmoteSendFailed {
                    detail: e.to_string(),
                });
                return;
            }
        };

        if let Err(e) = self.inner.transport.publish(&room_id, &text).await {
            self.inner.warn(CoordinatorWarning::EmoteSendFailed {
                detail: e.to_string(),
            });
        }
    }

    /// Fetches the member roster of a joined channel.
    pub async fn channel_members(
        &self,
        channel: &ChannelId,
    ) -> Result<Vec<MemberId>, LiveroomError> {
        if !self.inner.channels.lock().await.contains(channel) {
            return Err(ChannelError::NotJoined(channel.clone()).into());
        }
        self.inner
            .transport
            .members(channel)
            .await
            .map_err(LiveroomError::transport)
    }

    /// Fetches member counts for a set of channels (joined or not).
    pub async fn channel_member_counts(
        &self,
        channels: &[ChannelId],
    ) -> Result<std::collections::HashMap<ChannelId, usize>, LiveroomError>
    {
        self.inner
            .transport
            .member_counts(channels)
            .await
            .map_err(LiveroomError::transport)
    }

    /// Releases everything, in order: every auxiliary channel, then the
    /// primary channel, then the transport listeners and the login.
    ///
    /// Idempotent — the second and every later call is a no-op. All
    /// failures on this path are best-effort (logged/warned, never
    /// returned): teardown must always complete.
    pub async fn teardown(&self) {
        if self.inner.torn_down.swap(true, Ordering::SeqCst) {
            tracing::debug!("teardown already performed");
            return;
        }
        tracing::info!(identity = %self.inner.identity, "tearing down session");

        // (1) + (2) Auxiliaries first, primary last. Draining drops every
        // membership subscriber before the first leave goes out.
        let order = self.inner.channels.lock().await.drain_for_teardown();
        for handle in order {
            self.inner.cleanup_leave(handle.channel_id()).await;
        }

        // (3) Transport listeners go away before the logout, so no event
        // fires into a dead registry; the transport is the last resource
        // released.
        if let Some(pump) = self
            .inner
            .pump
            .lock()
            .expect("pump lock poisoned")
            .take()
        {
            pump.abort();
        }

        if let Err(e) = self.inner.transport.logout().await {
            self.inner.warn(CoordinatorWarning::LogoutFailed {
                detail: e.to_string(),
            });
        }

        self.inner
            .tracker
            .signal(ConnectionSignal::TransportDisconnected);
    }

    fn spawn_pump(&self) {
        let mut pump = self.inner.pump.lock().expect("pump lock poisoned");
        if pump.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        *pump = Some(tokio::spawn(crate::dispatch::run_pump(inner)));
    }
}

impl<T: Transport> Inner<T> {
    pub(crate) fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::SeqCst)
    }

    /// Logs a best-effort failure and surfaces it when configured to.
    pub(crate) fn warn(&self, warning: CoordinatorWarning) {
        tracing::warn!(?warning, "best-effort operation failed");
        if self.config.surface_warnings {
            let _ = self.warning_tx.send(warning);
        }
    }

    /// Best-effort transport leave used by cleanup paths.
    pub(crate) async fn cleanup_leave(&self, channel: &ChannelId) {
        if let Err(e) = self.transport.leave(channel).await {
            self.warn(CoordinatorWarning::LeaveFailed {
                channel: channel.clone(),
                detail: e.to_string(),
            });
        }
    }
}
