use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::vfs::Operation;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication cookie is missing.")]
    MissingCookie,
}

impl AuthError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::AuthError
    }
}

/// Failure of a single filesystem operation.
///
/// Every variant names the operation it came from, and its `Display` starts
/// with that operation's fixed label.
#[derive(Debug, Error)]
pub enum VfsError {
    /// The backend answered with a non-2xx status
    #[error("{}: {status_text}", .operation.label())]
    Status {
        operation: Operation,
        status_text: String,
    },
    /// The round trip itself did not complete
    #[error("{}: {source}", .operation.label())]
    Network {
        operation: Operation,
        #[source]
        source: anyhow::Error,
    },
    /// 2xx response whose body is not the expected shape
    #[error("{}: invalid response body: {source}", .operation.label())]
    Decode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
    #[error("{}: invalid URL {url}: {reason}", .operation.label())]
    InvalidUrl {
        operation: Operation,
        url: String,
        reason: String,
    },
    #[error("{}: failed to encode request: {source}", .operation.label())]
    Encode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },
}

impl VfsError {
    pub fn operation(&self) -> Operation {
        match self {
            VfsError::Status { operation, .. }
            | VfsError::Network { operation, .. }
            | VfsError::Decode { operation, .. }
            | VfsError::InvalidUrl { operation, .. }
            | VfsError::Encode { operation, .. } => *operation,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            VfsError::Status { .. } | VfsError::Network { .. } => ErrorCode::NetworkError,
            VfsError::InvalidUrl { .. } | VfsError::Encode { .. } => ErrorCode::ValidationError,
            VfsError::Decode { .. } => ErrorCode::UnknownError,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    AuthError,
    FileNotFound,
    NetworkError,
    ValidationError,
    PermissionDenied,
    UnknownError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::AuthError => "AUTH_ERROR",
            ErrorCode::FileNotFound => "FILE_NOT_FOUND",
            ErrorCode::NetworkError => "NETWORK_ERROR",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::PermissionDenied => "PERMISSION_DENIED",
            ErrorCode::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Serializable error record, suitable for posting to the host window
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct KdeError {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Map<String, serde_json::Value>>,
}

impl KdeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Map<String, serde_json::Value>) -> Self {
        self.details = Some(details);
        self
    }

    /// Recognize an untyped value carrying a known `code` and a `message`
    pub fn from_value(value: &serde_json::Value) -> Option<Self> {
        let obj = value.as_object()?;
        if !obj.contains_key("code") || !obj.contains_key("message") {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}

impl From<&VfsError> for KdeError {
    fn from(err: &VfsError) -> Self {
        let mut details = serde_json::Map::new();
        details.insert(
            "operation".into(),
            serde_json::Value::from(err.operation().name()),
        );
        KdeError::new(err.code(), err.to_string()).with_details(details)
    }
}

impl From<&AuthError> for KdeError {
    fn from(err: &AuthError) -> Self {
        KdeError::new(err.code(), err.to_string())
    }
}

/// `"<code>: <message>"` for anything shaped like a [`KdeError`], otherwise `Unknown error`
pub fn error_message(value: &serde_json::Value) -> String {
    let field = |key: &str| {
        value.get(key).map(|v| match v {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };
    match (field("code"), field("message")) {
        (Some(code), Some(message)) => format!("{}: {}", code, message),
        _ => "Unknown error".to_string(),
    }
}
