use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    Transport,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("command token is empty")]
    Empty,
    #[error("unknown direction code '{0}'")]
    UnknownDirection(char),
    #[error("unknown speed suffix '{0}'")]
    UnknownSpeed(char),
    #[error("stop cannot carry a speed suffix")]
    SpeedOnStop,
    #[error("command token '{0}' is longer than two characters")]
    TooLong(String),
}

impl From<TokenError> for ApiError {
    fn from(value: TokenError) -> Self {
        Self::new(ErrorCode::Validation, value.to_string())
    }
}
