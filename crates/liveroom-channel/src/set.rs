//! The channel set: joined channels, keyed by id, with primary protection.
//!
//! This is pure bookkeeping — no transport calls happen here. The
//! coordinator issues joins/leaves against the backend and mirrors the
//! outcome into this structure, which enforces the invariants:
//!
//! - keys are unique; at most one entry is `Primary`;
//! - the primary entry's key always equals the session's room id;
//! - the primary entry is never removed except by [`drain_for_teardown`].
//!
//! [`drain_for_teardown`]: ChannelSet::drain_for_teardown

use std::collections::HashMap;

use liveroom_protocol::{ChannelId, MemberId};
use tokio::sync::mpsc;

use crate::{
    ChannelError, ChannelHandle, ChannelRole, MembershipEvent, spy_count,
};

/// One joined channel: its role, last raw count, and membership listeners.
struct ChannelEntry {
    role: ChannelRole,
    member_count: usize,
    /// Fan-out list for membership subscriptions. Senders whose receiver
    /// was dropped are pruned on the next delivery.
    subscribers: Vec<mpsc::UnboundedSender<MembershipEvent>>,
}

impl ChannelEntry {
    fn new(role: ChannelRole) -> Self {
        Self {
            role,
            member_count: 0,
            subscribers: Vec::new(),
        }
    }

    fn fan_out(&mut self, event: MembershipEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// The registry's channel bookkeeping.
pub struct ChannelSet {
    room_id: ChannelId,
    entries: HashMap<ChannelId, ChannelEntry>,
}

impl ChannelSet {
    /// Creates an empty set bound to the session's room id.
    pub fn new(room_id: ChannelId) -> Self {
        Self {
            room_id,
            entries: HashMap::new(),
        }
    }

    /// The room id the primary entry is keyed by.
    pub fn room_id(&self) -> &ChannelId {
        &self.room_id
    }

    /// `true` if `target` names the session's own room — the case every
    /// auxiliary operation must redirect or refuse.
    pub fn is_room(&self, target: &ChannelId) -> bool {
        *target == self.room_id
    }

    /// Number of joined channels (primary included).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if no channel is joined.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `true` if `id` is currently joined.
    pub fn contains(&self, id: &ChannelId) -> bool {
        self.entries.contains_key(id)
    }

    /// Snapshot of the primary entry, if joined.
    pub fn primary(&self) -> Option<ChannelHandle> {
        self.handle(&self.room_id)
    }

    /// Snapshot of any entry.
    pub fn handle(&self, id: &ChannelId) -> Option<ChannelHandle> {
        self.entries.get(id).map(|entry| {
            ChannelHandle::new(id.clone(), entry.role, entry.member_count)
        })
    }

    /// Registers the primary entry under the room id.
    ///
    /// # Errors
    /// [`ChannelError::AlreadyJoined`] if a primary entry exists —
    /// idempotent "ensure joined" semantics live in the coordinator, which
    /// checks [`primary`](Self::primary) before issuing a transport join.
    pub fn insert_primary(&mut self) -> Result<ChannelHandle, ChannelError> {
        if self.entries.contains_key(&self.room_id) {
            return Err(ChannelError::AlreadyJoined(self.room_id.clone()));
        }
        self.entries
            .insert(self.room_id.clone(), ChannelEntry::new(ChannelRole::Primary));
        tracing::info!(channel = %self.room_id, "primary channel registered");
        Ok(ChannelHandle::new(
            self.room_id.clone(),
            ChannelRole::Primary,
            0,
        ))
    }

    /// Registers an auxiliary entry.
    ///
    /// # Errors
    /// - [`ChannelError::AlreadyJoined`] if `id` is already in the set
    ///   (including the primary's key).
    /// - [`ChannelError::PrimaryMissing`] if `id` is the room id and no
    ///   primary exists yet — the room key is reserved for the primary
    ///   entry and never joined as an auxiliary.
    pub fn insert_auxiliary(
        &mut self,
        id: ChannelId,
    ) -> Result<ChannelHandle, ChannelError> {
        if self.entries.contains_key(&id) {
            return Err(ChannelError::AlreadyJoined(id));
        }
        if self.is_room(&id) {
            return Err(ChannelError::PrimaryMissing);
        }
        self.entries
            .insert(id.clone(), ChannelEntry::new(ChannelRole::Auxiliary));
        tracing::info!(channel = %id, "auxiliary channel registered");
        Ok(ChannelHandle::new(id, ChannelRole::Auxiliary, 0))
    }

    /// Attaches a membership subscriber to a joined channel and returns
    /// the receiving end.
    ///
    /// # Errors
    /// [`ChannelError::NotJoined`] if `id` is not in the set.
    pub fn subscribe(
        &mut self,
        id: &ChannelId,
    ) -> Result<mpsc::UnboundedReceiver<MembershipEvent>, ChannelError> {
        let entry = self
            .entries
            .get_mut(id)
            .ok_or_else(|| ChannelError::NotJoined(id.clone()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        entry.subscribers.push(tx);
        Ok(rx)
    }

    /// Records a member joining `id` and fans the event out.
    ///
    /// Returns `false` (and does nothing) if the channel is unknown —
    /// events for channels already left are dropped, not errors.
    pub fn record_joined(&mut self, id: &ChannelId, member: MemberId) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.fan_out(MembershipEvent::Joined(member));
                true
            }
            None => false,
        }
    }

    /// Records a member leaving `id` and fans the event out.
    pub fn record_left(&mut self, id: &ChannelId, member: MemberId) -> bool {
        match self.entries.get_mut(id) {
            Some(entry) => {
                entry.fan_out(MembershipEvent::Left(member));
                true
            }
            None => false,
        }
    }

    /// Records a raw count update for `id`.
    ///
    /// Subscribers receive the spy-adjusted value ([`spy_count`]); the raw
    /// value is stored on the entry. Returns the entry's role so the
    /// caller can route the raw count (primary → viewer-count display),
    /// or `None` if the channel is unknown.
    pub fn record_count(
        &mut self,
        id: &ChannelId,
        raw: usize,
    ) -> Option<ChannelRole> {
        let entry = self.entries.get_mut(id)?;
        entry.member_count = raw;
        entry.fan_out(MembershipEvent::Count(spy_count(raw)));
        Some(entry.role)
    }

    /// Removes an auxiliary entry, dropping all its subscribers.
    ///
    /// # Errors
    /// - [`ChannelError::PrimaryProtected`] if `id` is the primary entry —
    ///   this call must never remove the primary channel.
    /// - [`ChannelError::NotJoined`] if `id` is not in the set.
    pub fn remove_auxiliary(&mut self, id: &ChannelId) -> Result<(), ChannelError> {
        match self.entries.get(id) {
            Some(entry) if entry.role == ChannelRole::Primary => {
                Err(ChannelError::PrimaryProtected(id.clone()))
            }
            Some(_) => {
                self.entries.remove(id);
                tracing::info!(channel = %id, "auxiliary channel removed");
                Ok(())
            }
            None => Err(ChannelError::NotJoined(id.clone())),
        }
    }

    /// Empties the set, returning handles in teardown order: every
    /// auxiliary entry first, the primary entry last.
    ///
    /// Dropping the entries drops their subscriber senders, which is the
    /// unsubscribe step — no listener can fire for a drained channel.
    pub fn drain_for_teardown(&mut self) -> Vec<ChannelHandle> {
        let mut auxiliary = Vec::new();
        let mut primary = None;
        for (id, entry) in self.entries.drain() {
            let handle = ChannelHandle::new(id, entry.role, entry.member_count);
            match entry.role {
                ChannelRole::Primary => primary = Some(handle),
                ChannelRole::Auxiliary => auxiliary.push(handle),
            }
        }
        auxiliary.extend(primary);
        auxiliary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> ChannelSet {
        ChannelSet::new(ChannelId::new("room-1"))
    }

    #[test]
    fn test_insert_primary_once() {
        let mut channels = set();
        let handle = channels.insert_primary().unwrap();
        assert!(handle.is_primary());
        assert_eq!(handle.channel_id().as_str(), "room-1");
        assert_eq!(channels.len(), 1);

        // A second insert is refused — the registry checks before joining.
        assert!(matches!(
            channels.insert_primary(),
            Err(ChannelError::AlreadyJoined(_))
        ));
        assert_eq!(channels.len(), 1);
    }

    #[test]
    fn test_room_key_reserved_for_primary() {
        let mut channels = set();
        assert!(matches!(
            channels.insert_auxiliary(ChannelId::new("room-1")),
            Err(ChannelError::PrimaryMissing)
        ));

        channels.insert_primary().unwrap();
        assert!(matches!(
            channels.insert_auxiliary(ChannelId::new("room-1")),
            Err(ChannelError::AlreadyJoined(_))
        ));
        // Still exactly one entry, and it's the primary.
        assert_eq!(channels.len(), 1);
        assert!(channels.primary().unwrap().is_primary());
    }

    #[test]
    fn test_remove_auxiliary_never_touches_primary() {
        let mut channels = set();
        channels.insert_primary().unwrap();
        channels.insert_auxiliary(ChannelId::new("room-2")).unwrap();

        assert!(matches!(
            channels.remove_auxiliary(&ChannelId::new("room-1")),
            Err(ChannelError::PrimaryProtected(_))
        ));
        // Primary remains present and joined afterwards.
        assert!(channels.contains(&ChannelId::new("room-1")));

        channels.remove_auxiliary(&ChannelId::new("room-2")).unwrap();
        assert!(!channels.contains(&ChannelId::new("room-2")));
        assert!(matches!(
            channels.remove_auxiliary(&ChannelId::new("room-2")),
            Err(ChannelError::NotJoined(_))
        ));
    }

    #[test]
    fn test_subscribers_get_spy_adjusted_counts() {
        let mut channels = set();
        channels.insert_primary().unwrap();
        let aux = ChannelId::new("room-2");
        channels.insert_auxiliary(aux.clone()).unwrap();
        let mut rx = channels.subscribe(&aux).unwrap();

        assert_eq!(
            channels.record_count(&aux, 3),
            Some(ChannelRole::Auxiliary)
        );
        assert_eq!(rx.try_recv().unwrap(), MembershipEvent::Count(2));

        // Member leaves: raw 2 → surfaced 1.
        channels.record_count(&aux, 2);
        assert_eq!(rx.try_recv().unwrap(), MembershipEvent::Count(1));

        // Raw zero never surfaces negative.
        channels.record_count(&aux, 0);
        assert_eq!(rx.try_recv().unwrap(), MembershipEvent::Count(0));
    }

    #[test]
    fn test_primary_count_reports_role_for_raw_routing() {
        let mut channels = set();
        channels.insert_primary().unwrap();
        assert_eq!(
            channels.record_count(&ChannelId::new("room-1"), 5),
            Some(ChannelRole::Primary)
        );
        // Raw value stored unadjusted on the entry.
        assert_eq!(channels.primary().unwrap().member_count(), 5);
    }

    #[test]
    fn test_roster_events_fan_out() {
        let mut channels = set();
        channels.insert_primary().unwrap();
        let aux = ChannelId::new("room-2");
        channels.insert_auxiliary(aux.clone()).unwrap();
        let mut rx = channels.subscribe(&aux).unwrap();

        assert!(channels.record_joined(&aux, MemberId::new("u9")));
        assert!(channels.record_left(&aux, MemberId::new("u9")));
        assert_eq!(
            rx.try_recv().unwrap(),
            MembershipEvent::Joined(MemberId::new("u9"))
        );
        assert_eq!(
            rx.try_recv().unwrap(),
            MembershipEvent::Left(MemberId::new("u9"))
        );
    }

    #[test]
    fn test_events_for_unknown_channels_are_dropped() {
        let mut channels = set();
        channels.insert_primary().unwrap();
        let gone = ChannelId::new("room-9");
        assert!(!channels.record_joined(&gone, MemberId::new("u1")));
        assert!(channels.record_count(&gone, 4).is_none());
    }

    #[test]
    fn test_closed_subscribers_are_pruned() {
        let mut channels = set();
        channels.insert_primary().unwrap();
        let aux = ChannelId::new("room-2");
        channels.insert_auxiliary(aux.clone()).unwrap();

        let rx = channels.subscribe(&aux).unwrap();
        drop(rx);
        let mut live = channels.subscribe(&aux).unwrap();

        // Delivery prunes the dead sender and reaches the live one.
        channels.record_count(&aux, 2);
        assert_eq!(live.try_recv().unwrap(), MembershipEvent::Count(1));
    }

    #[test]
    fn test_drain_yields_auxiliaries_first_primary_last() {
        let mut channels = set();
        channels.insert_primary().unwrap();
        channels.insert_auxiliary(ChannelId::new("room-2")).unwrap();
        channels.insert_auxiliary(ChannelId::new("room-3")).unwrap();

        let order = channels.drain_for_teardown();
        assert_eq!(order.len(), 3);
        assert!(order[..2].iter().all(|h| !h.is_primary()));
        assert!(order[2].is_primary());
        assert!(channels.is_empty());
    }

    #[test]
    fn test_drain_on_empty_set_is_empty() {
        let mut channels = set();
        assert!(channels.drain_for_teardown().is_empty());
    }
}
