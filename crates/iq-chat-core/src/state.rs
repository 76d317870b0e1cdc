//! UI-agnostic conversation types
//!
//! These are shared by every front end and double as the wire format for the
//! message list posted to the chat backend.

use serde::{Deserialize, Serialize};

/// Text appended as the assistant reply when an exchange fails
pub const ERROR_REPLY: &str = "Sorry, there was an error processing your request.";

/// A single message in the conversation transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citations: Option<Vec<Citation>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            citations: None,
        }
    }

    pub fn assistant(content: impl Into<String>, citations: Option<Vec<Citation>>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            citations,
        }
    }

    /// Citations to display, empty when the reply carried none
    pub fn sources(&self) -> &[Citation] {
        self.citations.as_deref().unwrap_or(&[])
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A source/quote pair backing an assistant reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    #[serde(default)]
    pub quote: String,
}
