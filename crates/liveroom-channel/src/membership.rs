//! Membership events and the spy-count adjustment.

use liveroom_protocol::MemberId;

/// A roster or count update delivered on a channel subscription.
///
/// Count values on subscriptions are already adjusted by [`spy_count`]:
/// the subscriber is observing covertly and wants the number of *other*
/// members. The primary viewer-count path (which includes self) does not
/// go through subscriptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MembershipEvent {
    /// A member joined the observed channel.
    Joined(MemberId),
    /// A member left the observed channel.
    Left(MemberId),
    /// The observed channel's member count changed (self excluded).
    Count(usize),
}

/// Adjusts a raw member count for a spying observer.
///
/// The observer's own covert presence is subtracted. A raw count of zero
/// (possible when the count event races the observer's own join) surfaces
/// as zero, never a negative value.
pub fn spy_count(raw: usize) -> usize {
    raw.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spy_count_subtracts_self() {
        assert_eq!(spy_count(3), 2);
        assert_eq!(spy_count(1), 0);
    }

    #[test]
    fn test_spy_count_zero_never_negative() {
        assert_eq!(spy_count(0), 0);
    }
}
