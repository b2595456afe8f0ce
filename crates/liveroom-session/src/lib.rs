//! Session identity and connection state tracking for Liveroom.
//!
//! This crate covers everything about "who is connected and in what state":
//!
//! 1. **Identity** — which room and which user this coordinator instance
//!    serves ([`SessionIdentity`]). Immutable for the instance's lifetime.
//! 2. **Credentials** — the seam to the external token-issuance service
//!    ([`CredentialProvider`] trait).
//! 3. **Connection state** — a small state machine fed by transport
//!    signals ([`ConnectionState`], [`ConnectionTracker`]).
//!
//! # How it fits in the stack
//!
//! ```text
//! Coordinator (above)  ← maps transport events to ConnectionSignals
//!     ↕
//! Session Layer (this crate)  ← identity + read-only status
//!     ↕
//! Protocol Layer (below)  ← provides ChannelId, MemberId
//! ```

#![allow(async_fn_in_trait)]

mod credential;
mod error;
mod identity;
mod state;

pub use credential::{Credential, CredentialProvider};
pub use error::SessionError;
pub use identity::SessionIdentity;
pub use state::{ConnectionSignal, ConnectionState, ConnectionTracker};
