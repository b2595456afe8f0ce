//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! The client side of the wire protocol: commands are encoded as JSON
//! frames, replies are matched back to their command by `seq` through a
//! pending map of oneshot senders, and unsolicited frames are queued as
//! [`TransportEvent`]s for [`Transport::recv`].

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use liveroom_protocol::{
    ChannelId, Codec, Command, JsonCodec, MemberId, ServerFrame,
};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::{Transport, TransportError, TransportEvent};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type PendingMap = HashMap<u64, oneshot::Sender<ServerFrame>>;

/// A WebSocket-based [`Transport`] connected to a backend URL.
pub struct WebSocketTransport {
    seq: AtomicU64,
    codec: JsonCodec,
    sink: Mutex<SplitSink<WsStream, Message>>,
    pending: Arc<Mutex<PendingMap>>,
    events: Mutex<mpsc::UnboundedReceiver<TransportEvent>>,
    reader: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Opens a connection to the backend at `url` (`ws://` or `wss://`)
    /// and starts the frame reader.
    pub async fn connect(url: &str) -> Result<Self, TransportError> {
        use futures_util::StreamExt;

        let (ws, _response) =
            tokio_tungstenite::connect_async(url).await.map_err(|e| {
                TransportError::ConnectFailed(io::Error::new(
                    io::ErrorKind::ConnectionRefused,
                    e,
                ))
            })?;
        tracing::info!(url, "WebSocket transport connected");

        let (sink, stream) = ws.split();
        let pending: Arc<Mutex<PendingMap>> =
            Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let reader =
            tokio::spawn(read_loop(stream, Arc::clone(&pending), event_tx));

        Ok(Self {
            seq: AtomicU64::new(1),
            codec: JsonCodec,
            sink: Mutex::new(sink),
            pending,
            events: Mutex::new(event_rx),
            reader,
        })
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends a command and awaits its correlated reply.
    ///
    /// A `Nack` reply becomes [`TransportError::Rejected`]; a connection
    /// that closes while the reply is pending becomes
    /// [`TransportError::Closed`].
    async fn request(&self, cmd: Command) -> Result<ServerFrame, TransportError> {
        use futures_util::SinkExt;

        let seq = cmd.seq();
        let (reply_tx, reply_rx) = oneshot::channel();
        self.pending.lock().await.insert(seq, reply_tx);

        let bytes = self.codec.encode(&cmd).map_err(|e| {
            TransportError::SendFailed(io::Error::new(
                io::ErrorKind::InvalidData,
                e,
            ))
        })?;

        let send_result = self
            .sink
            .lock()
            .await
            .send(Message::Binary(bytes.into()))
            .await;
        if let Err(e) = send_result {
            self.pending.lock().await.remove(&seq);
            return Err(TransportError::SendFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                e,
            )));
        }

        match reply_rx.await {
            Ok(ServerFrame::Nack { message, .. }) => {
                Err(TransportError::Rejected(message))
            }
            Ok(frame) => Ok(frame),
            Err(_) => Err(TransportError::Closed),
        }
    }
}

impl Transport for WebSocketTransport {
    type Error = TransportError;

    async fn login(
        &self,
        user: &MemberId,
        token: &str,
    ) -> Result<(), Self::Error> {
        self.request(Command::Login {
            seq: self.next_seq(),
            user: user.clone(),
            token: token.to_owned(),
        })
        .await?;
        Ok(())
    }

    async fn logout(&self) -> Result<(), Self::Error> {
        use futures_util::SinkExt;

        self.request(Command::Logout {
            seq: self.next_seq(),
        })
        .await?;
        // Best-effort close; the backend already dropped the session.
        let _ = self.sink.lock().await.close().await;
        Ok(())
    }

    async fn join(&self, channel: &ChannelId) -> Result<(), Self::Error> {
        self.request(Command::Join {
            seq: self.next_seq(),
            channel: channel.clone(),
        })
        .await?;
        Ok(())
    }

    async fn leave(&self, channel: &ChannelId) -> Result<(), Self::Error> {
        self.request(Command::Leave {
            seq: self.next_seq(),
            channel: channel.clone(),
        })
        .await?;
        Ok(())
    }

    async fn publish(
        &self,
        channel: &ChannelId,
        payload: &str,
    ) -> Result<(), Self::Error> {
        self.request(Command::Publish {
            seq: self.next_seq(),
            channel: channel.clone(),
            payload: payload.to_owned(),
        })
        .await?;
        Ok(())
    }

    async fn members(
        &self,
        channel: &ChannelId,
    ) -> Result<Vec<MemberId>, Self::Error> {
        match self
            .request(Command::Members {
                seq: self.next_seq(),
                channel: channel.clone(),
            })
            .await?
        {
            ServerFrame::MemberList { members, .. } => Ok(members),
            other => Err(unexpected_reply("MemberList", &other)),
        }
    }

    async fn member_counts(
        &self,
        channels: &[ChannelId],
    ) -> Result<HashMap<ChannelId, usize>, Self::Error> {
        match self
            .request(Command::MemberCounts {
                seq: self.next_seq(),
                channels: channels.to_vec(),
            })
            .await?
        {
            ServerFrame::Counts { counts, .. } => Ok(counts),
            other => Err(unexpected_reply("Counts", &other)),
        }
    }

    async fn recv(&self) -> Result<Option<TransportEvent>, Self::Error> {
        Ok(self.events.lock().await.recv().await)
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn unexpected_reply(expected: &str, got: &ServerFrame) -> TransportError {
    TransportError::ReceiveFailed(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("expected {expected} reply, got {got:?}"),
    ))
}

/// Reads frames until the socket closes, resolving replies through the
/// pending map and queueing events for `recv`.
///
/// Dropping `events` on exit is what makes `recv` return `Ok(None)`.
async fn read_loop(
    mut stream: SplitStream<WsStream>,
    pending: Arc<Mutex<PendingMap>>,
    events: mpsc::UnboundedSender<TransportEvent>,
) {
    use futures_util::StreamExt;

    let codec = JsonCodec;
    while let Some(msg) = stream.next().await {
        let data: Vec<u8> = match msg {
            Ok(Message::Binary(data)) => data.into(),
            Ok(Message::Text(text)) => text.as_bytes().to_vec(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue, // ping/pong/frame
            Err(e) => {
                tracing::debug!(error = %e, "read error, closing transport");
                break;
            }
        };

        let frame: ServerFrame = match codec.decode(&data) {
            Ok(frame) => frame,
            Err(e) => {
                // Malformed frames are dropped, never fatal.
                tracing::debug!(error = %e, "dropping undecodable frame");
                continue;
            }
        };

        if let Some(seq) = frame.reply_seq() {
            match pending.lock().await.remove(&seq) {
                Some(reply_tx) => {
                    let _ = reply_tx.send(frame);
                }
                None => {
                    tracing::debug!(seq, "dropping reply with unknown seq");
                }
            }
            continue;
        }

        let event = match frame {
            ServerFrame::Connected => TransportEvent::Connected,
            ServerFrame::Disconnected { reason } => {
                TransportEvent::Disconnected { reason }
            }
            ServerFrame::Reconnecting { reason } => {
                TransportEvent::ReconnectingInterrupted { reason }
            }
            ServerFrame::ChannelMessage {
                channel,
                sender,
                payload,
            } => TransportEvent::Message {
                channel,
                sender,
                payload,
            },
            ServerFrame::MemberJoined { channel, member } => {
                TransportEvent::MemberJoined { channel, member }
            }
            ServerFrame::MemberLeft { channel, member } => {
                TransportEvent::MemberLeft { channel, member }
            }
            ServerFrame::MemberCountUpdated { channel, count } => {
                TransportEvent::MemberCount { channel, count }
            }
            // Reply frames were consumed above.
            ServerFrame::Ack { .. }
            | ServerFrame::Nack { .. }
            | ServerFrame::MemberList { .. }
            | ServerFrame::Counts { .. } => continue,
        };

        if events.send(event).is_err() {
            // Receiver gone: the transport was dropped.
            break;
        }
    }

    // Drop the senders for any replies still in flight so their waiting
    // `request()` calls resolve with `TransportError::Closed` instead of
    // hanging on a connection that will never answer.
    pending.lock().await.clear();

    tracing::debug!("transport reader stopped");
}
