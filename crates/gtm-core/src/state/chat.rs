use serde::{Deserialize, Serialize};

use crate::api::{AskResponse, GtmApi, KnowledgeStats, Source};
use crate::error::Result;

/// Shown in place of an answer when `/askgtm/ask` fails
pub const ASK_FALLBACK: &str = "Sorry, I encountered an error. Please try again.";

pub const EXAMPLE_QUESTIONS: [&str; 5] = [
    "What's our pricing for enterprise customers?",
    "How do we handle the 'too expensive' objection?",
    "What are our key differentiators vs Clari?",
    "What's included in the Professional plan?",
    "How long is implementation?",
];

/// A chat message in the knowledge-base conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub sources: Option<Vec<Source>>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            sources: None,
        }
    }

    pub fn assistant(content: impl Into<String>, sources: Option<Vec<Source>>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            sources,
        }
    }

    /// Citations to render under the message, empty when there are none
    pub fn citations(&self) -> &[Source] {
        self.sources.as_deref().unwrap_or(&[])
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChatRole {
    User,
    Assistant,
}

/// In-memory AskGTM conversation. Never persisted.
#[derive(Debug, Default)]
pub struct ChatSession {
    pub messages: Vec<ChatMessage>,
    pub loading: bool,
    pub stats: Option<KnowledgeStats>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the user's question and mark the session busy.
    ///
    /// Returns the question to send, or `None` when it is blank or a
    /// request is already in flight (nothing changes in that case).
    pub fn begin_ask(&mut self, question: &str) -> Option<String> {
        if question.trim().is_empty() || self.loading {
            return None;
        }

        self.messages.push(ChatMessage::user(question));
        self.loading = true;
        Some(question.to_string())
    }

    /// Append exactly one assistant message for the finished request.
    pub fn finish_ask(&mut self, result: Result<AskResponse>) {
        self.loading = false;
        match result {
            Ok(response) => {
                self.messages
                    .push(ChatMessage::assistant(response.answer, Some(response.sources)));
            }
            Err(e) => {
                tracing::error!("Error asking GTM knowledge base: {}", e);
                self.messages.push(ChatMessage::assistant(ASK_FALLBACK, None));
            }
        }
    }

    /// Begin, send, and finish in one step. Returns whether a request was issued.
    pub async fn ask(&mut self, api: &dyn GtmApi, question: &str) -> bool {
        let Some(question) = self.begin_ask(question) else {
            return false;
        };
        let result = api.ask(&question).await;
        self.finish_ask(result);
        true
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Reset server-side memory and the local transcript.
    ///
    /// The transcript is emptied even when the server call fails; the
    /// error is logged and returned so the caller can surface it.
    pub async fn reset(&mut self, api: &dyn GtmApi) -> Result<()> {
        let result = api.reset().await;
        self.clear();
        if let Err(e) = &result {
            tracing::error!("Error resetting conversation: {}", e);
        }
        result
    }

    pub async fn refresh_stats(&mut self, api: &dyn GtmApi) {
        match api.stats().await {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => tracing::error!("Error fetching stats: {}", e),
        }
    }

    pub fn last_reply(&self) -> Option<&ChatMessage> {
        self.messages
            .last()
            .filter(|message| message.role == ChatRole::Assistant)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::fake::FakeApi;

    fn sources() -> Vec<Source> {
        vec![
            Source {
                content: "Enterprise tier is priced per seat...".to_string(),
                source: "pricing_guide.pdf".to_string(),
                category: "sales".to_string(),
            },
            Source {
                content: "Volume discounts above 100 seats...".to_string(),
                source: "discount_policy.md".to_string(),
                category: "sales".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_successful_ask_keeps_sources() {
        let api = FakeApi::default();
        *api.ask_reply.lock().unwrap() = Some(AskResponse {
            answer: "Per-seat, with volume discounts.".to_string(),
            sources: sources(),
        });

        let mut chat = ChatSession::new();
        assert!(chat.ask(&api, "What's our pricing for enterprise customers?").await);

        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0].role, ChatRole::User);
        let reply = chat.last_reply().unwrap();
        assert_eq!(reply.content, "Per-seat, with volume discounts.");
        assert_eq!(reply.citations(), sources().as_slice());
        assert!(!chat.loading);
    }

    #[tokio::test]
    async fn test_failed_ask_appends_one_fallback() {
        let api = FakeApi::failing();
        let mut chat = ChatSession::new();

        for round in 1..=3 {
            assert!(chat.ask(&api, "How long is implementation?").await);
            assert_eq!(chat.messages.len(), round * 2);

            let fallbacks = chat
                .messages
                .iter()
                .filter(|m| m.role == ChatRole::Assistant && m.content == ASK_FALLBACK)
                .count();
            assert_eq!(fallbacks, round);
            assert!(chat.last_reply().unwrap().citations().is_empty());
        }
        assert!(!chat.loading);
    }

    #[tokio::test]
    async fn test_blank_question_sends_nothing() {
        let api = FakeApi::default();
        let mut chat = ChatSession::new();

        assert!(!chat.ask(&api, "   ").await);
        assert!(chat.messages.is_empty());
        assert_eq!(api.calls(), 0);
    }

    #[test]
    fn test_busy_session_rejects_second_question() {
        let mut chat = ChatSession::new();
        assert!(chat.begin_ask("first").is_some());
        assert!(chat.begin_ask("second").is_none());
        assert_eq!(chat.messages.len(), 1);
    }

    #[tokio::test]
    async fn test_reset_always_empties() {
        let api = FakeApi::default();
        let mut chat = ChatSession::new();
        chat.ask(&api, "What are our key differentiators vs Clari?").await;
        chat.finish_ask(Err(crate::error::ApiError::NoFileSelected));
        assert!(!chat.messages.is_empty());

        chat.reset(&api).await.unwrap();
        assert!(chat.messages.is_empty());

        chat.reset(&api).await.unwrap();
        assert!(chat.messages.is_empty());
    }

    #[tokio::test]
    async fn test_failed_reset_still_empties() {
        let api = FakeApi::failing();
        let mut chat = ChatSession::new();
        chat.begin_ask("hello");
        chat.finish_ask(Err(crate::error::ApiError::NoFileSelected));

        assert!(chat.reset(&api).await.is_err());
        assert!(chat.messages.is_empty());
        assert_eq!(api.calls(), 1);
    }

    #[tokio::test]
    async fn test_stats_refresh() {
        let mut chat = ChatSession::new();
        chat.refresh_stats(&FakeApi::failing()).await;
        assert!(chat.stats.is_none());

        chat.refresh_stats(&FakeApi::default()).await;
        assert_eq!(chat.stats.as_ref().unwrap().total_documents, 8);
    }
}
