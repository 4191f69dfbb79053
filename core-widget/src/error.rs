use core_auth::AuthError;
use core_usage::UsageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WidgetError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Usage(#[from] UsageError),

    #[error(transparent)]
    Runtime(#[from] core_runtime::Error),
}

pub type Result<T> = std::result::Result<T, WidgetError>;
