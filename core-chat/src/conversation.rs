//! Chat transcript.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::service::{QueryService, ReplyKind};

pub const WELCOME_MESSAGE: &str = "Hello! I'm your SharePoint assistant. How can I help you today?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Set on assistant replies to a query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_kind: Option<ReplyKind>,
}

impl ChatMessage {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            reply_kind: None,
        }
    }
}

pub struct Conversation {
    service: Arc<QueryService>,
    messages: Vec<ChatMessage>,
}

impl Conversation {
    pub fn new(service: Arc<QueryService>) -> Self {
        Self {
            service,
            messages: vec![ChatMessage::new(MessageRole::Assistant, WELCOME_MESSAGE)],
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Ask `input` and append both the question and the reply.
    ///
    /// Blank input is ignored and returns `None`.
    pub async fn send(&mut self, input: &str, display_name: &str) -> Option<&ChatMessage> {
        let query = input.trim();
        if query.is_empty() {
            debug!("Ignoring blank message");
            return None;
        }

        self.messages.push(ChatMessage::new(MessageRole::User, query));

        let reply = self.service.process_query(query, display_name).await;
        let mut message = ChatMessage::new(MessageRole::Assistant, reply.text);
        message.reply_kind = Some(reply.kind);
        self.messages.push(message);

        self.messages.last()
    }

    /// Start over with only the welcome message.
    pub fn reset(&mut self) {
        self.messages = vec![ChatMessage::new(MessageRole::Assistant, WELCOME_MESSAGE)];
    }
}
