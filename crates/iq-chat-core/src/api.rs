use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RequestFailed;
use crate::state::{ChatMessage, Citation};

/// Body posted to `/api/chat`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub conversation_id: Option<String>,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    conversation_id: String,
    message: ReplyMessage,
    #[serde(default)]
    citations: Option<Vec<Citation>>,
}

/// A decoded backend reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub conversation_id: String,
    pub content: String,
    pub citations: Option<Vec<Citation>>,
}

impl From<ChatResponse> for ChatReply {
    fn from(response: ChatResponse) -> Self {
        Self {
            conversation_id: response.conversation_id,
            content: response.message.content,
            citations: response.citations,
        }
    }
}

/// Anything that can answer one chat exchange
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, RequestFailed>;
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, RequestFailed> {
        let url = self.chat_url();
        debug!(%url, messages = request.messages.len(), "posting chat request");

        let response = self.client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(%status, body = %text, "chat backend returned an error status");
            return Err(RequestFailed::new(format!("backend error {}: {}", status, text)));
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_url_strips_trailing_slash() {
        let client = ApiClient::new("http://localhost:8000/");
        assert_eq!(client.chat_url(), "http://localhost:8000/api/chat");
    }

    #[test]
    fn test_first_request_sends_null_conversation_id() {
        let request = ChatRequest {
            messages: vec![ChatMessage::user("hello")],
            conversation_id: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value["conversation_id"].is_null());
        assert_eq!(value["messages"][0]["content"], "hello");
    }

    #[test]
    fn test_response_without_citations() {
        let json = r#"{"conversation_id":"t1","message":{"role":"assistant","content":"hey"}}"#;
        let reply: ChatReply = serde_json::from_str::<ChatResponse>(json).unwrap().into();
        assert_eq!(reply.conversation_id, "t1");
        assert_eq!(reply.content, "hey");
        assert!(reply.citations.is_none());
    }

    #[test]
    fn test_response_with_null_citations() {
        let json = r#"{"conversation_id":"t1","message":{"content":"hey"},"citations":null}"#;
        let reply: ChatReply = serde_json::from_str::<ChatResponse>(json).unwrap().into();
        assert!(reply.citations.is_none());
    }

    #[test]
    fn test_response_with_citations() {
        let json = r#"{
            "conversation_id": "t2",
            "message": {"content": "see doc"},
            "citations": [{"source": "assistant-file-9", "quote": "page 3"}]
        }"#;
        let reply: ChatReply = serde_json::from_str::<ChatResponse>(json).unwrap().into();
        let citations = reply.citations.unwrap();
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].source, "assistant-file-9");
        assert_eq!(citations[0].quote, "page 3");
    }
}
