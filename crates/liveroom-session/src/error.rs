//! Error types for the session layer.

/// Errors that can occur while establishing a session.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The credential issuer refused to mint a token — unknown user,
    /// access to the room denied, or the issuer was unreachable.
    #[error("credential rejected: {0}")]
    CredentialRejected(String),

    /// The backend rejected the login. No automatic retry happens at this
    /// layer; the consumer stays disconnected until it explicitly retries.
    #[error("login failed: {0}")]
    LoginFailed(String),
}
