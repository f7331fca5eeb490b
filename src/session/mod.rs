//! Conversation state for the coding chat.
//!
//! Messages live for the life of the process only. The log is append-only;
//! `/clear` is the one way to reset it.
//!
//! ## Usage
//!
//! ```ignore
//! use codepad::session::ChatSession;
//!
//! let mut chat = ChatSession::new();
//! chat.ask(&client, "What is a list comprehension?").await;
//! for message in chat.conversation().messages() {
//!     println!("{}: {}", message.role, message.content);
//! }
//! ```

use crate::completion::CompletionClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};
use uuid::Uuid;

/// Shown in place of an answer when the completion call fails.
pub const CHAT_ERROR_REPLY: &str = "Sorry, I encountered an error processing your request.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One chat entry. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Ordered, append-only message log.
#[derive(Debug, Default, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &Message {
        self.push(Message::user(content))
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) -> &Message {
        self.push(Message::assistant(content))
    }

    fn push(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop every message. Only used for a session reset.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

/// Drives question/answer turns against the completion client.
#[derive(Debug, Default)]
pub struct ChatSession {
    conversation: Conversation,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn clear(&mut self) {
        self.conversation.clear();
    }

    /// Ask a coding question.
    ///
    /// Blank input is ignored. Returns the assistant message appended for this
    /// turn, if any. With no API key the question is kept but no answer is
    /// added.
    pub async fn ask(&mut self, client: &CompletionClient<'_>, question: &str) -> Option<&Message> {
        let question = question.trim();
        if question.is_empty() {
            return None;
        }

        self.conversation.push_user(question);
        let prompt = format!("Answer this coding question: {}", question);

        match client.complete(&prompt, false).await {
            Ok(Some(result)) => {
                debug!(chars = result.full_response.len(), "Chat answer received");
                Some(self.conversation.push_assistant(result.full_response))
            }
            Ok(None) => None,
            Err(e) => {
                warn!("Chat request failed: {}", e);
                Some(self.conversation.push_assistant(CHAT_ERROR_REPLY))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::CredentialStore;
    use crate::completion::{
        ChatRequest, CompletionConfig, CompletionError, Transport, TransportResponse,
    };
    use crate::db::Database;
    use crate::messaging::NoticeBus;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct CannedTransport {
        status: u16,
        body: String,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: String) -> Arc<Self> {
            Arc::new(Self {
                status,
                body,
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn answering(content: &str) -> Arc<Self> {
            Self::new(
                200,
                serde_json::json!({"choices": [{"message": {"content": content}}]}).to_string(),
            )
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn post(
            &self,
            _api_key: &str,
            request: &ChatRequest,
        ) -> Result<TransportResponse, CompletionError> {
            let prompt = request.messages.last().map(|m| m.content.clone()).unwrap_or_default();
            self.prompts.lock().unwrap().push(prompt);
            Ok(TransportResponse {
                status: self.status,
                body: self.body.clone(),
            })
        }

        fn endpoint(&self) -> &str {
            "https://fake.test"
        }
    }

    fn setup_test_db() -> (TempDir, Database) {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::open_at(temp_dir.path().join("test.db")).unwrap();
        db.migrate().unwrap();
        (temp_dir, db)
    }

    #[test]
    fn test_messages_get_unique_ids() {
        let a = Message::user("same");
        let b = Message::user("same");
        assert_ne!(a.id, b.id);
        assert_eq!(a.role, Role::User);
    }

    #[test]
    fn test_conversation_is_ordered() {
        let mut conversation = Conversation::new();
        assert!(conversation.is_empty());

        conversation.push_user("q1");
        conversation.push_assistant("a1");
        conversation.push_user("q2");

        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User]);
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.last().unwrap().content, "q2");

        conversation.clear();
        assert!(conversation.is_empty());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[tokio::test]
    async fn test_ask_appends_question_and_answer() {
        let (_tmp, db) = setup_test_db();
        let bus = NoticeBus::new();
        let store = CredentialStore::open(&db, bus.sender()).unwrap();
        store.save("sk-test").unwrap();
        let transport = CannedTransport::answering("Use a dict.");
        let client = CompletionClient::new(&store, transport.clone(), CompletionConfig::default(), bus.sender());

        let mut chat = ChatSession::new();
        let reply = chat.ask(&client, "  How do I count words?  ").await.unwrap();
        assert_eq!(reply.role, Role::Assistant);
        assert_eq!(reply.content, "Use a dict.");

        let messages = chat.conversation().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].content, "How do I count words?");
        assert_eq!(
            transport.prompts.lock().unwrap().as_slice(),
            ["Answer this coding question: How do I count words?"]
        );
    }

    #[tokio::test]
    async fn test_blank_question_is_ignored() {
        let (_tmp, db) = setup_test_db();
        let bus = NoticeBus::new();
        let store = CredentialStore::open(&db, bus.sender()).unwrap();
        store.save("sk-test").unwrap();
        let transport = CannedTransport::answering("unused");
        let client = CompletionClient::new(&store, transport.clone(), CompletionConfig::default(), bus.sender());

        let mut chat = ChatSession::new();
        assert!(chat.ask(&client, "   ").await.is_none());
        assert!(chat.conversation().is_empty());
        assert!(transport.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_request_appends_apology() {
        let (_tmp, db) = setup_test_db();
        let bus = NoticeBus::new();
        let store = CredentialStore::open(&db, bus.sender()).unwrap();
        store.save("sk-test").unwrap();
        let transport = CannedTransport::new(500, "{\"error\":{\"message\":\"down\"}}".to_string());
        let client = CompletionClient::new(&store, transport, CompletionConfig::default(), bus.sender());

        let mut chat = ChatSession::new();
        let reply = chat.ask(&client, "Why?").await.unwrap();
        assert_eq!(reply.content, CHAT_ERROR_REPLY);
        assert_eq!(chat.conversation().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_key_keeps_question_only() {
        let (_tmp, db) = setup_test_db();
        let bus = NoticeBus::new();
        let store = CredentialStore::open(&db, bus.sender()).unwrap();
        let transport = CannedTransport::answering("unused");
        let client = CompletionClient::new(&store, transport.clone(), CompletionConfig::default(), bus.sender());

        let mut chat = ChatSession::new();
        assert!(chat.ask(&client, "Why?").await.is_none());
        assert_eq!(chat.conversation().len(), 1);
        assert!(transport.prompts.lock().unwrap().is_empty());
    }
}
