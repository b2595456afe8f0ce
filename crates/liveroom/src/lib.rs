//! # Liveroom
//!
//! Real-time channel coordinator for live-event sessions.
//!
//! A [`Coordinator`] owns one logical connection to a messaging backend
//! and the bounded set of channels a viewer participates in: one
//! **primary** channel (the session's room, used for viewer counts and
//! ephemeral emote broadcast) plus any number of **auxiliary** channels
//! joined transiently to observe membership in concurrent sessions.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use liveroom::{Coordinator, CoordinatorConfig};
//! use liveroom_protocol::{ChannelId, EmoteType, MemberId};
//! use liveroom_session::SessionIdentity;
//! use liveroom_transport::WebSocketTransport;
//!
//! # async fn run(provider: impl liveroom_session::CredentialProvider) -> Result<(), liveroom::LiveroomError> {
//! let identity = SessionIdentity::new(
//!     ChannelId::new("room-1"),
//!     MemberId::new("u1"),
//! );
//! let transport = WebSocketTransport::connect("wss://rt.example.com").await
//!     .map_err(liveroom::LiveroomError::transport)?;
//! let coordinator = Coordinator::new(identity, transport, CoordinatorConfig::default());
//!
//! coordinator.connect(&provider).await?;
//! coordinator.send_emote(EmoteType::Clap).await;
//!
//! // Spy on a concurrent session.
//! let mut spy = coordinator.join_auxiliary(ChannelId::new("room-2")).await?;
//! while let Some(event) = spy.recv().await {
//!     println!("room-2: {event:?}");
//! }
//!
//! coordinator.teardown().await;
//! # Ok(())
//! # }
//! ```

mod config;
mod coordinator;
mod dispatch;
mod error;
mod subscription;

pub use config::{CoordinatorConfig, CoordinatorWarning};
pub use coordinator::Coordinator;
pub use error::LiveroomError;
pub use subscription::{EmoteEvent, SpySubscription};

// Re-export the types a consumer needs without importing every layer crate.
pub use liveroom_channel::{
    ChannelError, ChannelHandle, ChannelRole, MembershipEvent,
};
pub use liveroom_protocol::{ChannelId, EmoteType, MemberId, MessagePayload};
pub use liveroom_session::{
    ConnectionState, Credential, CredentialProvider, SessionError,
    SessionIdentity,
};
pub use liveroom_transport::{Transport, TransportEvent};
