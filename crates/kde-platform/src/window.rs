use anyhow::Result;
use serde::{Deserialize, Serialize};

/// A message event delivered to the embedded application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Origin of the sending window, e.g. `https://host.example`
    pub origin: String,
    pub data: serde_json::Value,
}

/// The window that embeds the application
pub trait ParentWindow: Send + Sync {
    fn post_message(&self, message: &serde_json::Value, target_origin: &str) -> Result<()>;
}
