/*!
 * Chat platform boundary types.
 *
 * Inbound messages arrive from an external event source; replies leave through
 * a `ReplySink`. The console implementations here back the command line
 * runner; a real platform adapter implements the same trait.
 */

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::errors::ChannelError;

/// Kind of an inbound chat event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Regular user message
    #[default]
    Normal,
    /// Platform-generated message (joins, topic changes, ...)
    System,
    /// A user edited an earlier message
    Edited,
}

/// A message delivered by the chat platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Channel or conversation the message was posted in
    pub conversation_id: String,

    /// Platform identifier of the message, unique within the conversation
    pub message_id: String,

    /// Author of the message
    #[serde(default)]
    pub author_id: String,

    /// Message body
    #[serde(default)]
    pub text: String,

    /// Whether a bot or integration posted the message
    #[serde(default)]
    pub is_from_automated_sender: bool,

    /// Event kind
    #[serde(default)]
    pub kind: MessageKind,
}

impl InboundMessage {
    /// Create a normal, human-authored message
    pub fn new(
        conversation_id: impl Into<String>,
        message_id: impl Into<String>,
        author_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            message_id: message_id.into(),
            author_id: author_id.into(),
            text: text.into(),
            is_from_automated_sender: false,
            kind: MessageKind::Normal,
        }
    }

    /// Mark the message as posted by a bot
    pub fn automated(mut self) -> Self {
        self.is_from_automated_sender = true;
        self
    }

    /// Set the event kind
    pub fn with_kind(mut self, kind: MessageKind) -> Self {
        self.kind = kind;
        self
    }

    /// Deduplication key of this message
    pub fn dedup_key(&self) -> DedupKey {
        DedupKey::new(&self.conversation_id, &self.message_id)
    }

    /// Decode one JSON event line
    pub fn from_json(line: &str) -> Result<Self, ChannelError> {
        serde_json::from_str(line).map_err(|e| ChannelError::MalformedEvent(e.to_string()))
    }
}

/// Identity of a logical chat event: (conversation, message)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    conversation_id: String,
    message_id: String,
}

impl DedupKey {
    pub fn new(conversation_id: &str, message_id: &str) -> Self {
        Self {
            conversation_id: conversation_id.to_string(),
            message_id: message_id.to_string(),
        }
    }
}

impl std::fmt::Display for DedupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.conversation_id, self.message_id)
    }
}

/// A reply to post back to the chat platform
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundReply {
    /// Conversation to post into
    pub conversation_id: String,

    /// Reply body
    pub text: String,

    /// Thread to reply in, or `None` to post at top level
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
}

/// Destination for formatted replies
#[async_trait]
pub trait ReplySink: Send + Sync {
    /// Post a single reply part
    async fn post(&self, reply: OutboundReply) -> Result<(), ChannelError>;
}

/// Reply sink writing one JSON object per line to stdout
#[derive(Debug, Default)]
pub struct ConsoleReplySink;

#[async_trait]
impl ReplySink for ConsoleReplySink {
    async fn post(&self, reply: OutboundReply) -> Result<(), ChannelError> {
        let line = serde_json::to_string(&reply)
            .map_err(|e| ChannelError::DeliveryFailed(e.to_string()))?;

        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}", line)
            .and_then(|_| stdout.flush())
            .map_err(|e| ChannelError::DeliveryFailed(e.to_string()))?;

        debug!("Posted reply to {} ({} chars)", reply.conversation_id, reply.text.chars().count());
        Ok(())
    }
}
