use shared::error::{ApiError, ErrorCode};
use thiserror::Error;

use crate::optimistic::ToggleError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("this action needs an admin account")]
    AdminRequired,
    #[error("invalid request: {0}")]
    Validation(String),
    #[error("server rejected request ({status}): {error}")]
    Api { status: u16, error: ApiError },
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Toggle(#[from] ToggleError),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn api_code(&self) -> Option<ErrorCode> {
        match self {
            Self::Api { error, .. } => Some(error.code),
            _ => None,
        }
    }

    /// The user has to sign in (again) before retrying.
    pub fn requires_reauth(&self) -> bool {
        match self {
            Self::NotLoggedIn => true,
            Self::Api { error, .. } => error.requires_reauth(),
            _ => false,
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
