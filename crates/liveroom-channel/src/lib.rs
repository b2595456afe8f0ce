//! Channel registry and membership tracking for Liveroom.
//!
//! A coordinator instance owns a bounded set of joined channels: exactly one
//! **primary** channel (the room the session lives in) plus any number of
//! **auxiliary** channels joined transiently to observe other sessions.
//!
//! # Key types
//!
//! - [`ChannelRole`] — the `Primary | Auxiliary` tag every protection rule
//!   branches on
//! - [`ChannelHandle`] — cheap snapshot of one joined channel
//! - [`ChannelSet`] — the registry's data structure and its invariants
//! - [`MembershipEvent`] — per-subscription roster and count stream
//!
//! The set enforces the structural invariants (unique keys, one primary,
//! primary never removed except by teardown); the coordinator above it owns
//! the transport calls.

mod error;
mod handle;
mod membership;
mod set;

pub use error::ChannelError;
pub use handle::{ChannelHandle, ChannelRole};
pub use membership::{MembershipEvent, spy_count};
pub use set::ChannelSet;
