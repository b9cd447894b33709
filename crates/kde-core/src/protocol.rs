use serde::{Deserialize, Serialize};

// --- Filesystem payloads ---

/// Metadata for one entry in the remote filesystem
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub filename: String,
    pub path: String,
    pub is_directory: bool,
    pub is_file: bool,
    pub mime: Option<String>,
    /// Any JSON number the backend reports, kept exactly as written
    pub size: serde_json::Number,
    /// Backend-defined, passed through untouched
    pub stat: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    File,
    Directory,
    All,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recursive: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<SearchType>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct PathBody<'a> {
    pub path: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct TransferBody<'a> {
    pub source: &'a str,
    pub destination: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct WriteFileBody<'a> {
    pub path: &'a str,
    /// Standard base64 of the file bytes
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct SearchBody<'a> {
    pub query: &'a str,
    #[serde(flatten)]
    pub options: &'a SearchOptions,
}

// --- Window messages ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageType {
    OpenFile,
    FileOpened,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message_id: String,
    /// Unix milliseconds
    pub timestamp: u64,
}

/// A message exchanged with the parent window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KdeMessage {
    #[serde(rename = "type")]
    pub msg_type: MessageType,
    pub payload: MessagePayload,
}

impl KdeMessage {
    pub fn new(msg_type: MessageType, path: Option<String>, error: Option<String>) -> Self {
        Self {
            msg_type,
            payload: MessagePayload {
                path,
                error,
                message_id: uuid::Uuid::new_v4().to_string(),
                timestamp: now_millis(),
            },
        }
    }

    pub fn open_file(path: impl Into<String>) -> Self {
        Self::new(MessageType::OpenFile, Some(path.into()), None)
    }

    pub fn file_opened(path: impl Into<String>) -> Self {
        Self::new(MessageType::FileOpened, Some(path.into()), None)
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self::new(MessageType::Error, None, Some(error.into()))
    }
}

fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
