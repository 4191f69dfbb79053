use thiserror::Error;

#[derive(Error, Debug)]
pub enum UsageError {
    /// The GraphQL endpoint answered with an error.
    #[error("Usage query rejected: {0}")]
    Provider(String),

    /// The request never produced a parseable response.
    #[error("Usage query transport failure: {reason}")]
    Transport { reason: String },

    /// The response parsed but contained no usage quota.
    #[error("No usage quota in response")]
    MissingQuota,

    /// The quota exists but its initial amount is zero, so no percentage
    /// can be derived.
    #[error("Usage quota has no volume")]
    EmptyQuota,
}

pub type Result<T> = std::result::Result<T, UsageError>;
