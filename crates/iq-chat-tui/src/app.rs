use std::sync::Arc;
use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::error;
use iq_chat_core::{ChatBackend, ChatMessage, ChatReply, Conversation, RequestFailed};

type ReplyTask = JoinHandle<Result<ChatReply, RequestFailed>>;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub struct App {
    pub should_quit: bool,
    pub api_url: String,

    // Input box
    pub input: String,
    pub cursor: usize, // cursor position in input, in chars

    // Transcript
    pub conversation: Conversation,
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of chat area, set on render
    pub chat_width: u16,  // inner width of chat area, set on render
    pub transcript_rows: usize, // wrapped rows of the transcript, set on render
    pub follow_bottom: bool,
    pub chat_area: Option<Rect>,
    pub animation_frame: u8,

    backend: Arc<dyn ChatBackend>,
    reply_task: Option<ReplyTask>,
}

impl App {
    pub fn new(backend: Arc<dyn ChatBackend>, api_url: &str, conversation: Conversation) -> Self {
        Self {
            should_quit: false,
            api_url: api_url.to_string(),
            input: String::new(),
            cursor: 0,
            conversation,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            transcript_rows: 0,
            follow_bottom: true,
            chat_area: None,
            animation_frame: 0,
            backend,
            reply_task: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    pub fn is_loading(&self) -> bool {
        self.conversation.is_loading()
    }

    pub fn can_submit(&self) -> bool {
        self.conversation.can_send(&self.input)
    }

    /// Send the current input. Blank input or an outstanding exchange makes
    /// this a no-op and leaves the input untouched.
    pub fn submit(&mut self) {
        let Some(request) = self.conversation.begin_send(&self.input) else {
            return;
        };

        self.input.clear();
        self.cursor = 0;
        self.animation_frame = 0;
        self.follow_bottom = true;

        let backend = Arc::clone(&self.backend);
        self.reply_task = Some(tokio::spawn(async move { backend.chat(&request).await }));
    }

    /// Apply the reply if the background exchange has finished.
    /// Returns true when the transcript changed.
    pub async fn poll_reply(&mut self) -> bool {
        let finished = self.reply_task.as_ref().is_some_and(|task| task.is_finished());
        if finished {
            self.await_reply().await
        } else {
            false
        }
    }

    /// Wait for the outstanding exchange, if any, and apply it
    pub async fn await_reply(&mut self) -> bool {
        let Some(task) = self.reply_task.take() else {
            return false;
        };

        let outcome = match task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "chat request task did not complete");
                Err(RequestFailed::new(e.to_string()))
            }
        };

        self.follow_bottom = true;
        self.conversation.complete(outcome)
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_loading() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Input editing

    pub fn insert_char(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.input, self.cursor);
        self.input.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    // Scrolling

    fn max_scroll(&self) -> u16 {
        let visible = if self.chat_height > 0 { self.chat_height } else { 20 };
        let max = self.transcript_rows.saturating_sub(visible as usize);
        u16::try_from(max).unwrap_or(u16::MAX)
    }

    /// Pin the view to the latest entry
    pub fn scroll_to_bottom(&mut self) {
        self.chat_scroll = self.max_scroll();
        self.follow_bottom = true;
    }

    pub fn scroll_up(&mut self, rows: u16) {
        self.chat_scroll = self.chat_scroll.min(self.max_scroll()).saturating_sub(rows);
        self.follow_bottom = false;
    }

    pub fn scroll_down(&mut self, rows: u16) {
        let max = self.max_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(rows).min(max);
        self.follow_bottom = self.chat_scroll >= max;
    }

    pub fn page_rows(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use iq_chat_core::{ChatRequest, ChatRole, ERROR_REPLY};

    struct EchoBackend;

    #[async_trait]
    impl ChatBackend for EchoBackend {
        async fn chat(&self, request: &ChatRequest) -> Result<ChatReply, RequestFailed> {
            let last = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(ChatReply {
                conversation_id: "thread_echo".to_string(),
                content: format!("echo: {}", last),
                citations: None,
            })
        }
    }

    struct DownBackend;

    #[async_trait]
    impl ChatBackend for DownBackend {
        async fn chat(&self, _request: &ChatRequest) -> Result<ChatReply, RequestFailed> {
            Err(RequestFailed::new("connection refused"))
        }
    }

    fn app_with(backend: impl ChatBackend + 'static) -> App {
        App::new(Arc::new(backend), "http://localhost:8000", Conversation::new())
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.insert_char(c);
        }
    }

    #[test]
    fn test_utf8_editing() {
        let mut app = app_with(EchoBackend);
        type_text(&mut app, "héllo");
        app.cursor_left();
        app.cursor_left();
        app.insert_char('✓');
        assert_eq!(app.input, "hél✓lo");
        app.backspace();
        app.cursor_home();
        app.delete();
        assert_eq!(app.input, "éllo");
        app.cursor_end();
        assert_eq!(app.cursor, 4);
    }

    #[tokio::test]
    async fn test_submit_blank_is_noop() {
        let mut app = app_with(EchoBackend);
        type_text(&mut app, "   ");
        app.submit();
        assert!(app.messages().is_empty());
        assert!(!app.is_loading());
        assert_eq!(app.input, "   ");
        assert!(!app.await_reply().await);
    }

    #[tokio::test]
    async fn test_submit_then_reply() {
        let mut app = app_with(EchoBackend);
        type_text(&mut app, "hello");
        app.submit();

        assert!(app.input.is_empty());
        assert!(app.is_loading());
        assert_eq!(app.messages().len(), 1);

        assert!(app.await_reply().await);
        assert!(!app.is_loading());
        assert_eq!(app.messages().len(), 2);
        assert_eq!(app.messages()[1].role, ChatRole::Assistant);
        assert_eq!(app.messages()[1].content, "echo: hello");
        assert_eq!(app.conversation.conversation_id(), Some("thread_echo"));
    }

    #[tokio::test]
    async fn test_submit_while_loading_keeps_input() {
        let mut app = app_with(EchoBackend);
        type_text(&mut app, "one");
        app.submit();
        type_text(&mut app, "two");
        app.submit();

        assert_eq!(app.messages().len(), 1);
        assert_eq!(app.input, "two");

        app.await_reply().await;
        assert_eq!(app.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_reply_shows_apology() {
        let mut app = app_with(DownBackend);
        type_text(&mut app, "hi");
        app.submit();
        app.await_reply().await;

        assert_eq!(app.messages().len(), 2);
        assert_eq!(app.messages()[1].content, ERROR_REPLY);
    }

    #[test]
    fn test_scrolling_unpins_and_repins() {
        let mut app = app_with(EchoBackend);
        app.chat_height = 4;
        app.transcript_rows = 30;
        app.scroll_to_bottom();
        assert_eq!(app.chat_scroll, 26);

        app.scroll_up(3);
        assert!(!app.follow_bottom);
        assert_eq!(app.chat_scroll, 23);

        app.scroll_down(10);
        assert!(app.follow_bottom);
        assert_eq!(app.chat_scroll, 26);
    }

    #[test]
    fn test_scroll_clamps_past_u16_rows() {
        let mut app = app_with(EchoBackend);
        app.chat_height = 10;
        app.transcript_rows = 200_000;
        app.scroll_to_bottom();
        assert_eq!(app.chat_scroll, u16::MAX);

        app.scroll_down(u16::MAX);
        assert_eq!(app.chat_scroll, u16::MAX);
        assert!(app.follow_bottom);
    }
}
