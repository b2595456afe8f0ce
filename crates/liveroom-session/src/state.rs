//! Connection state machine: a live status indicator, not a retry controller.
//!
//! The tracker consumes transport signals and exposes the resulting state
//! read-only through a `tokio::sync::watch` channel. Consumers render the
//! state (a wifi indicator, a "reconnecting…" banner); they never drive it.

use tokio::sync::watch;

/// The observable status of the backend connection.
///
/// ```text
/// Uninitialized ──(login start)──→ Connecting ──(connected)──→ Connected
///       ↑                              │                         │    ↑
///       └──────(login failed)──────────┘        (interrupted) ──→│    │
///                                                                ▼    │
///                                             ReconnectingInterrupted ┘
///                                                                │
///                        Connected ──(disconnected)──→ Disconnected
/// ```
///
/// There is deliberately no terminal "failed" state: repeated interruption
/// is treated as transient, and a login failure returns to
/// `Uninitialized` so the consumer can offer an explicit retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No login has been attempted on this instance yet.
    #[default]
    Uninitialized,

    /// Login is in flight. Channel operations are invalid in this window.
    Connecting,

    /// Logged in; channel operations are valid.
    Connected,

    /// The session ended: explicit logout or backend-initiated drop.
    Disconnected,

    /// A network blip while the session stays logically active. The
    /// transport recovers on its own; the next `Connected` signal restores
    /// normal state.
    ReconnectingInterrupted,
}

impl ConnectionState {
    /// Returns `true` if channel operations may be issued in this state.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Applies a signal, returning the resulting state.
    ///
    /// Signals that don't match a legal transition leave the state
    /// unchanged — the tracker reports what the transport tells it and
    /// never invents intermediate states.
    pub fn apply(self, signal: ConnectionSignal) -> Self {
        use ConnectionSignal::*;
        match (self, signal) {
            (Self::Uninitialized, LoginStarted) => Self::Connecting,
            (Self::Connecting, TransportConnected) => Self::Connected,
            (Self::Connecting, LoginFailed) => Self::Uninitialized,
            (Self::Connected, TransportDisconnected) => Self::Disconnected,
            (Self::Connected, TransportInterrupted) => {
                Self::ReconnectingInterrupted
            }
            (Self::ReconnectingInterrupted, TransportConnected) => {
                Self::Connected
            }
            // Interruption can end in a hard drop instead of recovery.
            (Self::ReconnectingInterrupted, TransportDisconnected) => {
                Self::Disconnected
            }
            (state, _) => state,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "Uninitialized"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Disconnected => write!(f, "Disconnected"),
            Self::ReconnectingInterrupted => {
                write!(f, "ReconnectingInterrupted")
            }
        }
    }
}

/// An input to the state machine.
///
/// The coordinator maps transport events onto these; login signals come
/// from the coordinator's own `connect` path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionSignal {
    /// `connect()` was called; login is in flight.
    LoginStarted,
    /// The login attempt was rejected or errored.
    LoginFailed,
    /// The transport reports an established connection.
    TransportConnected,
    /// The transport reports a clean or backend-initiated drop.
    TransportDisconnected,
    /// The transport reports a transient interruption.
    TransportInterrupted,
}

/// Owns the current [`ConnectionState`] and broadcasts changes.
///
/// Mutated only through [`signal`](Self::signal); everyone else observes
/// through the watch receiver. Unchanged states are not re-broadcast, so
/// observers see exactly the sequence of distinct states.
#[derive(Debug)]
pub struct ConnectionTracker {
    tx: watch::Sender<ConnectionState>,
}

impl ConnectionTracker {
    /// Creates a tracker in [`ConnectionState::Uninitialized`].
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::default());
        Self { tx }
    }

    /// The current state.
    pub fn state(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// A read-only view that observers can await changes on.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }

    /// Feeds a signal into the machine. Returns the new state if it
    /// changed, `None` if the signal had no effect.
    pub fn signal(&self, signal: ConnectionSignal) -> Option<ConnectionState> {
        let current = *self.tx.borrow();
        let next = current.apply(signal);
        if next == current {
            return None;
        }
        tracing::info!(from = %current, to = %next, "connection state changed");
        // send_replace never fails; a watch channel keeps the value even
        // with no receivers.
        self.tx.send_replace(next);
        Some(next)
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConnectionSignal::*;
    use ConnectionState::*;

    #[test]
    fn test_initial_state_is_uninitialized() {
        assert_eq!(ConnectionTracker::new().state(), Uninitialized);
    }

    #[test]
    fn test_happy_path_login_sequence() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.signal(LoginStarted), Some(Connecting));
        assert_eq!(tracker.signal(TransportConnected), Some(Connected));
        assert!(tracker.state().is_connected());
    }

    #[test]
    fn test_login_failure_returns_to_uninitialized() {
        let tracker = ConnectionTracker::new();
        tracker.signal(LoginStarted);
        assert_eq!(tracker.signal(LoginFailed), Some(Uninitialized));
    }

    #[test]
    fn test_interruption_recovers_to_connected() {
        // The exact three-value sequence a consumer must observe:
        // Connected → ReconnectingInterrupted → Connected.
        let tracker = ConnectionTracker::new();
        let mut rx = tracker.subscribe();
        tracker.signal(LoginStarted);
        tracker.signal(TransportConnected);
        rx.mark_unchanged();

        tracker.signal(TransportInterrupted);
        tracker.signal(TransportConnected);

        assert_eq!(tracker.state(), Connected);
        // The watch holds the latest value; the intermediate state was
        // a real broadcast (signal returned Some for both steps).
        assert_eq!(*rx.borrow_and_update(), Connected);
    }

    #[test]
    fn test_interruption_sequence_has_no_invented_states() {
        let tracker = ConnectionTracker::new();
        tracker.signal(LoginStarted);
        tracker.signal(TransportConnected);

        let mut observed = Vec::new();
        for signal in [TransportInterrupted, TransportConnected] {
            if let Some(state) = tracker.signal(signal) {
                observed.push(state);
            }
        }
        assert_eq!(observed, vec![ReconnectingInterrupted, Connected]);
    }

    #[test]
    fn test_disconnect_from_connected() {
        let tracker = ConnectionTracker::new();
        tracker.signal(LoginStarted);
        tracker.signal(TransportConnected);
        assert_eq!(tracker.signal(TransportDisconnected), Some(Disconnected));
    }

    #[test]
    fn test_interruption_can_end_in_disconnect() {
        let tracker = ConnectionTracker::new();
        tracker.signal(LoginStarted);
        tracker.signal(TransportConnected);
        tracker.signal(TransportInterrupted);
        assert_eq!(tracker.signal(TransportDisconnected), Some(Disconnected));
    }

    #[test]
    fn test_illegal_signals_leave_state_unchanged() {
        let tracker = ConnectionTracker::new();
        // Connected before any login attempt: not a legal transition.
        assert_eq!(tracker.signal(TransportConnected), None);
        assert_eq!(tracker.state(), Uninitialized);

        tracker.signal(LoginStarted);
        // Disconnects can't happen while still connecting.
        assert_eq!(tracker.signal(TransportDisconnected), None);
        assert_eq!(tracker.state(), Connecting);
    }

    #[test]
    fn test_duplicate_connected_signal_not_rebroadcast() {
        let tracker = ConnectionTracker::new();
        tracker.signal(LoginStarted);
        tracker.signal(TransportConnected);
        assert_eq!(tracker.signal(TransportConnected), None);
    }
}
