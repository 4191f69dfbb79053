use crate::types::OperationKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// The identity provider rejected the operation with a description.
    #[error("{operation} rejected by provider: {description}")]
    Provider {
        operation: OperationKind,
        description: String,
    },

    /// The provider answered but the body carried no access token and no
    /// error description.
    #[error("{operation} produced no access token")]
    MissingAccessToken { operation: OperationKind },

    /// The request never produced a parseable token response.
    #[error("{operation} transport failure: {reason}")]
    Transport {
        operation: OperationKind,
        reason: String,
    },

    /// The session cache could not be read or written.
    #[error("Session storage failed: {0}")]
    Storage(String),

    /// The session cache exists but does not deserialize.
    #[error("Cached session is corrupt: {0}")]
    CorruptSession(String),

    /// The expired session carries no refresh token.
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// A required interactive capability is unusable in this environment.
    #[error("Environment cannot complete authentication: {0}")]
    Environment(String),

    /// The user dismissed the credential prompt.
    #[error("Authentication cancelled by user")]
    Cancelled,

    /// The browser closed without reaching the redirect.
    #[error("Authorization flow ended before the redirect was reached")]
    FlowIncomplete,

    /// The captured code was handed to a relaunched invocation; this one is
    /// done.
    #[error("Authorization code handed off; awaiting relaunched invocation")]
    RelaunchPending,

    /// The redirect URL carried neither a code nor a provider error.
    #[error("Redirect carried no authorization code: {0}")]
    InvalidRedirect(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;

impl AuthError {
    /// Whether retrying the same call later could plausibly succeed.
    ///
    /// Transport and storage failures are transient; provider rejections and
    /// malformed state are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AuthError::Transport { .. } | AuthError::Storage(_)
        )
    }
}
