//! Integration tests for the WebSocket transport.
//!
//! Each test spins up a minimal in-process backend (a raw
//! tokio-tungstenite server) that decodes [`Command`]s and answers with
//! scripted [`ServerFrame`]s, then drives the client transport against it.

#![cfg(feature = "websocket")]

use liveroom_protocol::{ChannelId, Command, MemberId, ServerFrame};
use liveroom_transport::{Transport, TransportError, TransportEvent, WebSocketTransport};

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

type ServerWs = WebSocketStream<tokio::net::TcpStream>;

/// Binds a listener on an OS-assigned port and returns it with its URL.
async fn bind_backend() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = listener.local_addr().expect("should have local addr");
    (listener, format!("ws://{addr}"))
}

/// Accepts one WebSocket connection on the listener.
async fn accept_ws(listener: &TcpListener) -> ServerWs {
    let (stream, _) = listener.accept().await.expect("should accept");
    tokio_tungstenite::accept_async(stream)
        .await
        .expect("should upgrade")
}

/// Reads the next command the client sent.
async fn next_command(ws: &mut ServerWs) -> Command {
    loop {
        let msg = ws
            .next()
            .await
            .expect("stream should stay open")
            .expect("frame should decode");
        match msg {
            Message::Binary(data) => {
                return serde_json::from_slice(&data).expect("valid command");
            }
            Message::Text(text) => {
                return serde_json::from_str(text.as_str())
                    .expect("valid command");
            }
            _ => continue,
        }
    }
}

/// Sends a frame to the client.
async fn send_frame(ws: &mut ServerWs, frame: &ServerFrame) {
    let json = serde_json::to_string(frame).expect("frame serializes");
    ws.send(Message::text(json)).await.expect("send should work");
}

#[tokio::test]
async fn test_login_and_join_are_acked() {
    let (listener, url) = bind_backend().await;

    let backend = tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;

        let login = next_command(&mut ws).await;
        assert!(matches!(login, Command::Login { .. }));
        send_frame(&mut ws, &ServerFrame::Ack { seq: login.seq() }).await;

        let join = next_command(&mut ws).await;
        let Command::Join { seq, channel } = join else {
            panic!("expected Join, got {join:?}");
        };
        assert_eq!(channel.as_str(), "room-1");
        send_frame(&mut ws, &ServerFrame::Ack { seq }).await;
    });

    let transport = WebSocketTransport::connect(&url)
        .await
        .expect("should connect");

    transport
        .login(&MemberId::new("u1"), "token-abc")
        .await
        .expect("login should be acked");
    transport
        .join(&ChannelId::new("room-1"))
        .await
        .expect("join should be acked");

    backend.await.unwrap();
}

#[tokio::test]
async fn test_nack_surfaces_as_rejected() {
    let (listener, url) = bind_backend().await;

    tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        let cmd = next_command(&mut ws).await;
        send_frame(
            &mut ws,
            &ServerFrame::Nack {
                seq: cmd.seq(),
                message: "bad token".into(),
            },
        )
        .await;
    });

    let transport = WebSocketTransport::connect(&url)
        .await
        .expect("should connect");

    let err = transport
        .login(&MemberId::new("u1"), "expired")
        .await
        .expect_err("login should be rejected");
    assert!(matches!(err, TransportError::Rejected(msg) if msg == "bad token"));
}

#[tokio::test]
async fn test_unsolicited_frames_arrive_as_events() {
    let (listener, url) = bind_backend().await;

    tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        send_frame(&mut ws, &ServerFrame::Connected).await;
        send_frame(
            &mut ws,
            &ServerFrame::MemberCountUpdated {
                channel: ChannelId::new("room-1"),
                count: 4,
            },
        )
        .await;
        send_frame(
            &mut ws,
            &ServerFrame::ChannelMessage {
                channel: ChannelId::new("room-1"),
                sender: MemberId::new("u2"),
                payload: r#"{"kind":"EMOTE","emote":"CLAP"}"#.into(),
            },
        )
        .await;
        // Keep the socket open until the client has read everything.
        let _ = ws.next().await;
    });

    let transport = WebSocketTransport::connect(&url)
        .await
        .expect("should connect");

    assert_eq!(
        transport.recv().await.unwrap(),
        Some(TransportEvent::Connected)
    );
    assert_eq!(
        transport.recv().await.unwrap(),
        Some(TransportEvent::MemberCount {
            channel: ChannelId::new("room-1"),
            count: 4,
        })
    );
    match transport.recv().await.unwrap() {
        Some(TransportEvent::Message {
            channel,
            sender,
            payload,
        }) => {
            assert_eq!(channel.as_str(), "room-1");
            assert_eq!(sender.as_str(), "u2");
            assert!(payload.contains("EMOTE"));
        }
        other => panic!("expected Message event, got {other:?}"),
    }
}

#[tokio::test]
async fn test_members_query_returns_roster() {
    let (listener, url) = bind_backend().await;

    tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        let cmd = next_command(&mut ws).await;
        let Command::Members { seq, channel } = cmd else {
            panic!("expected Members, got {cmd:?}");
        };
        assert_eq!(channel.as_str(), "room-2");
        send_frame(
            &mut ws,
            &ServerFrame::MemberList {
                seq,
                members: vec![MemberId::new("u2"), MemberId::new("u3")],
            },
        )
        .await;
    });

    let transport = WebSocketTransport::connect(&url)
        .await
        .expect("should connect");

    let members = transport
        .members(&ChannelId::new("room-2"))
        .await
        .expect("roster should arrive");
    assert_eq!(members, vec![MemberId::new("u2"), MemberId::new("u3")]);
}

#[tokio::test]
async fn test_recv_returns_none_on_backend_close() {
    let (listener, url) = bind_backend().await;

    tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::Close(None)).await.unwrap();
    });

    let transport = WebSocketTransport::connect(&url)
        .await
        .expect("should connect");

    let event = transport.recv().await.expect("recv should not error");
    assert!(event.is_none(), "should return None on clean close");
}

#[tokio::test]
async fn test_pending_request_resolves_as_closed_when_socket_drops() {
    let (listener, url) = bind_backend().await;

    tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        // Read the command but drop the connection instead of replying.
        let cmd = next_command(&mut ws).await;
        assert!(matches!(cmd, Command::Join { .. }));
        ws.send(Message::Close(None)).await.unwrap();
    });

    let transport = WebSocketTransport::connect(&url)
        .await
        .expect("should connect");

    // The reply can never arrive; the call must resolve, not hang.
    let result = tokio::time::timeout(
        std::time::Duration::from_secs(2),
        transport.join(&ChannelId::new("room-1")),
    )
    .await
    .expect("request should resolve after socket close");
    assert!(matches!(result, Err(TransportError::Closed)));
}

#[tokio::test]
async fn test_undecodable_frames_are_dropped_not_fatal() {
    let (listener, url) = bind_backend().await;

    tokio::spawn(async move {
        let mut ws = accept_ws(&listener).await;
        ws.send(Message::text("this is not a frame")).await.unwrap();
        send_frame(&mut ws, &ServerFrame::Connected).await;
        let _ = ws.next().await;
    });

    let transport = WebSocketTransport::connect(&url)
        .await
        .expect("should connect");

    // The garbage frame is skipped; the next real frame comes through.
    assert_eq!(
        transport.recv().await.unwrap(),
        Some(TransportEvent::Connected)
    );
}
