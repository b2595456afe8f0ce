//! Channel roles and handles.

use liveroom_protocol::ChannelId;
use serde::{Deserialize, Serialize};

/// Whether a channel is the session's room or a transient observation.
///
/// Every mutating registry operation branches on this tag rather than
/// comparing ids against the room id. A renamed or re-derived room id can't
/// silently break the primary protection when the role travels with the
/// entry itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelRole {
    /// The channel the client actively participates in. Created once per
    /// session, privileged against removal: only teardown may drop it.
    Primary,

    /// Any other channel, joined to observe membership in a concurrent
    /// session. Created on demand, destroyed on leave or teardown.
    Auxiliary,
}

/// A snapshot of one joined channel.
///
/// Handles are values, not live references — the registry hands them out
/// and consumers keep them as identifiers. `member_count` is the raw count
/// at the time the snapshot was taken.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    channel_id: ChannelId,
    role: ChannelRole,
    member_count: usize,
}

impl ChannelHandle {
    pub(crate) fn new(
        channel_id: ChannelId,
        role: ChannelRole,
        member_count: usize,
    ) -> Self {
        Self {
            channel_id,
            role,
            member_count,
        }
    }

    /// The channel this handle refers to.
    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// The channel's role tag.
    pub fn role(&self) -> ChannelRole {
        self.role
    }

    /// `true` if this is the session's room channel.
    pub fn is_primary(&self) -> bool {
        self.role == ChannelRole::Primary
    }

    /// The raw member count when this snapshot was taken (includes self).
    pub fn member_count(&self) -> usize {
        self.member_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_role_tag() {
        let h = ChannelHandle::new(
            ChannelId::new("room-1"),
            ChannelRole::Primary,
            0,
        );
        assert!(h.is_primary());
        assert_eq!(h.role(), ChannelRole::Primary);

        let h = ChannelHandle::new(
            ChannelId::new("room-2"),
            ChannelRole::Auxiliary,
            3,
        );
        assert!(!h.is_primary());
        assert_eq!(h.member_count(), 3);
    }
}
