//! Wire protocol for Liveroom.
//!
//! This crate defines the "language" spoken between the coordinator and the
//! messaging backend:
//!
//! - **Types** ([`Command`], [`ServerFrame`], [`MessagePayload`], etc.) —
//!   the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those structures are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits below everything else. It doesn't know about
//! connections, channels, or sessions — it only knows how messages are
//! shaped and serialized.
//!
//! ```text
//! Transport (frames) → Coordinator (channels, membership, emotes)
//!        ↑
//!   this crate (shapes + codec)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    ChannelId, Command, EmoteType, MemberId, MessagePayload, ServerFrame,
};
