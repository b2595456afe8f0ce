//! Credential issuance hook for logging in to the messaging backend.
//!
//! Liveroom doesn't mint tokens itself — that belongs to the hosting
//! platform (a cloud function, an auth service, a signed JWT endpoint).
//! The coordinator only defines the [`CredentialProvider`] trait: one async
//! method that produces a login credential for a `(user, room)` pair. The
//! platform implements it; the coordinator calls it exactly once per
//! `connect`.

use liveroom_protocol::{ChannelId, MemberId};

use crate::SessionError;

/// A login credential for the messaging backend.
///
/// The token is opaque to the coordinator — whatever the backend's auth
/// scheme needs. Tokens are typically short-lived; a coordinator never
/// refreshes one (an expired token surfaces as a login failure on the next
/// session, retry policy belongs to the consumer).
#[derive(Debug, Clone)]
pub struct Credential {
    /// The principal the token was issued for.
    pub user_id: MemberId,
    /// The opaque token string presented at login.
    pub token: String,
}

/// Issues login credentials for a user joining a room.
///
/// # Example
///
/// ```rust
/// use liveroom_session::{Credential, CredentialProvider, SessionError};
/// use liveroom_protocol::{ChannelId, MemberId};
///
/// /// Hands out the user id as its own token. Development only.
/// struct DevCredentials;
///
/// impl CredentialProvider for DevCredentials {
///     async fn issue(
///         &self,
///         user: &MemberId,
///         _room: &ChannelId,
///     ) -> Result<Credential, SessionError> {
///         Ok(Credential {
///             user_id: user.clone(),
///             token: user.as_str().to_owned(),
///         })
///     }
/// }
/// ```
pub trait CredentialProvider: Send + Sync {
    /// Produces a credential for `user` to join `room`.
    ///
    /// # Errors
    /// Returns [`SessionError::CredentialRejected`] if the issuer refuses
    /// (unknown user, room access denied, issuer unreachable).
    fn issue(
        &self,
        user: &MemberId,
        room: &ChannelId,
    ) -> impl std::future::Future<Output = Result<Credential, SessionError>> + Send;
}
