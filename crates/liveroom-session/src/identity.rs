//! Session identity: which room, which user.

use liveroom_protocol::{ChannelId, MemberId};

/// The `(room, user)` pair a coordinator instance is bound to.
///
/// The room id names the primary channel to join; the user id is the
/// principal joining it. The pair is fixed at construction — switching to a
/// different room or user means creating a new coordinator, never mutating
/// this one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    room_id: ChannelId,
    user_id: MemberId,
}

impl SessionIdentity {
    /// Creates a new identity for one live session.
    pub fn new(room_id: ChannelId, user_id: MemberId) -> Self {
        Self { room_id, user_id }
    }

    /// The primary channel id for this session.
    pub fn room_id(&self) -> &ChannelId {
        &self.room_id
    }

    /// The principal this coordinator acts as.
    pub fn user_id(&self) -> &MemberId {
        &self.user_id
    }
}

impl std::fmt::Display for SessionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.user_id, self.room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_accessors() {
        let id = SessionIdentity::new(
            ChannelId::new("room-1"),
            MemberId::new("u1"),
        );
        assert_eq!(id.room_id().as_str(), "room-1");
        assert_eq!(id.user_id().as_str(), "u1");
        assert_eq!(id.to_string(), "u1@room-1");
    }
}
