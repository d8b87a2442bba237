//! Error envelope returned by every gateway route.
//!
//! `{"error": {"message", "type", "code"}}`, with the code mirrored in the
//! [`ERROR_CODE_HEADER`] response header.

use serde::{Deserialize, Serialize};

pub const ERROR_CODE_HEADER: &str = "X-LMG-Error-Code";

/// OpenAI error class: caller mistakes vs. gateway or backend failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    InvalidRequestError,
    ServerError,
}

impl ErrorType {
    pub fn for_status(status: u16) -> Self {
        if status < 500 {
            Self::InvalidRequestError
        } else {
            Self::ServerError
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: ErrorType,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

impl ErrorResponse {
    pub fn new(error_type: ErrorType, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                message: message.into(),
                error_type,
                code: code.into(),
            },
        }
    }
}
