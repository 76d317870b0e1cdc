//! The send action: one conversation, one exchange at a time.

use tracing::{info, warn};

use crate::api::{ChatBackend, ChatReply, ChatRequest};
use crate::error::RequestFailed;
use crate::state::{ChatMessage, ERROR_REPLY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Sending,
}

/// In-memory transcript plus the backend's conversation id.
///
/// Messages are only ever appended.
#[derive(Debug, Default)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
    conversation_id: Option<String>,
    phase: Phase,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resume a backend thread started elsewhere
    pub fn with_conversation_id(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: Some(conversation_id.into()),
            ..Self::default()
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Sending
    }

    /// Whether `input` would be accepted by [`Conversation::begin_send`]
    pub fn can_send(&self, input: &str) -> bool {
        !input.trim().is_empty() && !self.is_loading()
    }

    /// Append the user message and build the request to post.
    ///
    /// Returns `None` (and changes nothing) for blank input or while an
    /// exchange is already outstanding.
    pub fn begin_send(&mut self, input: &str) -> Option<ChatRequest> {
        if !self.can_send(input) {
            return None;
        }

        self.messages.push(ChatMessage::user(input));
        self.phase = Phase::Sending;

        info!(
            messages = self.messages.len(),
            threaded = self.conversation_id.is_some(),
            "sending chat message"
        );

        Some(ChatRequest {
            messages: self.messages.clone(),
            conversation_id: self.conversation_id.clone(),
        })
    }

    /// Apply the outcome of the outstanding exchange. Returns false if nothing
    /// was outstanding.
    pub fn complete(&mut self, outcome: Result<ChatReply, RequestFailed>) -> bool {
        if self.phase != Phase::Sending {
            warn!("chat reply arrived with no request outstanding");
            return false;
        }

        match outcome {
            Ok(reply) => {
                info!(
                    conversation_id = %reply.conversation_id,
                    citations = reply.citations.as_ref().map_or(0, Vec::len),
                    "chat reply received"
                );
                self.conversation_id = Some(reply.conversation_id);
                self.messages
                    .push(ChatMessage::assistant(reply.content, reply.citations));
            }
            Err(err) => {
                warn!(reason = %err.reason, "chat request failed");
                self.messages.push(ChatMessage::assistant(ERROR_REPLY, None));
            }
        }

        self.phase = Phase::Idle;
        true
    }

    /// Run a whole exchange inline. Returns the outcome, or `None` when the
    /// input was rejected.
    pub async fn send<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        input: &str,
    ) -> Option<Result<(), RequestFailed>> {
        let request = self.begin_send(input)?;
        let outcome = backend.chat(&request).await;
        let result = outcome.as_ref().map(|_| ()).map_err(Clone::clone);
        self.complete(outcome);
        Some(result)
    }
}
