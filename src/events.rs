use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::transport::TransportError;

/// Who authored a message in the transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    /// Role string used on the wire (the service speaks "user"/"model")
    pub fn wire_role(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Assistant => "model",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Sender::User => "You",
            Sender::Assistant => "Assistant",
        }
    }
}

/// A single message in the conversation. Immutable once created;
/// the transcript only ever grows.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Sender::Assistant, text)
    }
}

/// Outcome of one request to the chat service, delivered back to the UI
/// loop once the transport resolves.
///
/// `generation` is the controller's generation counter at the time the
/// request was issued; a reset bumps the counter, so completions from a
/// discarded conversation no longer match and are dropped.
#[derive(Debug)]
pub struct ReplyEvent {
    pub generation: u64,
    pub result: Result<String, TransportError>,
}
