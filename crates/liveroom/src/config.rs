//! Coordinator configuration and background warnings.

use liveroom_protocol::ChannelId;

/// Tunables for a coordinator instance.
#[derive(Debug, Clone, Default)]
pub struct CoordinatorConfig {
    /// Whether best-effort failures (emote publish, cleanup leaves,
    /// teardown steps) are delivered on the [`warnings`] stream in
    /// addition to being logged.
    ///
    /// The default is `false`: swallowed-but-logged, which matches how the
    /// hosting platform historically treated these paths. Turn it on to
    /// surface them as recoverable notices in the UI.
    ///
    /// [`warnings`]: crate::Coordinator::warnings
    pub surface_warnings: bool,
}

/// A non-fatal failure on a best-effort path.
///
/// None of these affect the session's correctness; each degrades a single
/// presence/messaging feature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorWarning {
    /// An emote publish failed. The emote is dropped — a retried send
    /// would risk a duplicate burst, which is worse than the drop.
    EmoteSendFailed { detail: String },

    /// A best-effort channel leave failed during cleanup or teardown.
    LeaveFailed { channel: ChannelId, detail: String },

    /// The final logout failed during teardown.
    LogoutFailed { detail: String },
}
