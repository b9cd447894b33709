use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use kde_platform::window::{InboundMessage, ParentWindow};

use crate::error::KdeError;
use crate::protocol::KdeMessage;

/// Outbound messages are posted to the parent with this target origin
pub const TARGET_ORIGIN_ANY: &str = "*";

/// Message relay between the embedded application and its parent window
pub struct KdeWindow {
    allowed_origins: Vec<String>,
    parent: Box<dyn ParentWindow>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl KdeWindow {
    pub fn new(allowed_origins: Vec<String>, parent: Box<dyn ParentWindow>) -> Self {
        Self {
            allowed_origins,
            parent,
            listener: Mutex::new(None),
        }
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn is_origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|o| o == origin)
    }

    /// Returns false (and logs) for a sender outside the allow-list
    pub fn handle_message(&self, event: &InboundMessage) -> bool {
        if !self.is_origin_allowed(&event.origin) {
            error!("Invalid origin: {}", event.origin);
            return false;
        }

        info!("Received message: {}", event.data);
        true
    }

    pub fn send_message(&self, message: &KdeMessage) -> Result<()> {
        let value = serde_json::to_value(message).context("failed to encode window message")?;
        debug!("posting {:?} message {}", message.msg_type, message.payload.message_id);
        self.parent
            .post_message(&value, TARGET_ORIGIN_ANY)
            .context("failed to post message to parent window")
    }

    /// Report an error record to the parent as an `ERROR` message
    pub fn send_error(&self, err: &KdeError) -> Result<()> {
        self.send_message(&KdeMessage::error(err.to_string()))
    }

    /// Feed every event from `rx` through [`handle_message`](Self::handle_message)
    /// until the sender side closes. Replaces any previous listener.
    ///
    /// Fails without touching the current listener when called outside a tokio runtime.
    pub fn listen(self: &Arc<Self>, mut rx: mpsc::Receiver<InboundMessage>) -> Result<()> {
        let runtime = tokio::runtime::Handle::try_current()
            .context("window listener needs a tokio runtime")?;
        let window = Arc::clone(self);
        let task = runtime.spawn(async move {
            while let Some(event) = rx.recv().await {
                window.handle_message(&event);
            }
            debug!("window message channel closed");
        });

        let previous = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
        Ok(())
    }

    /// Stop listening for inbound messages
    pub fn cleanup(&self) {
        let task = self
            .listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(task) = task {
            task.abort();
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }
}

impl Drop for KdeWindow {
    fn drop(&mut self) {
        self.cleanup();
    }
}
