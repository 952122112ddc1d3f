//! Per-conversation session state.
//!
//! The store maps a [`ChatId`] to a [`Conversation`]. History and settings
//! live in the same value, so a conversation either has both or does not
//! exist at all. State is in-memory only and lasts as long as the process;
//! entries are never expired.

use std::collections::HashMap;

use relay_types::{ChatId, ChatMessage, MessageRef, SettingChange, Settings};
use thiserror::Error;

/// Fixed system instruction at the head of every history.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful, concise assistant. Answer the user's questions accurately.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("conversation {0} has not been initialized")]
    NotInitialized(ChatId),
}

/// State of one conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    history: Vec<ChatMessage>,
    settings: Settings,
    displayed_settings: Option<MessageRef>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            history: vec![ChatMessage::system(SYSTEM_PROMPT)],
            settings: Settings::default(),
            displayed_settings: None,
        }
    }
}

impl Conversation {
    #[must_use]
    pub fn history(&self) -> &[ChatMessage] {
        &self.history
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.settings
    }

    /// Change one settings field. History is not touched.
    pub fn apply(&mut self, change: SettingChange) {
        self.settings.apply(change);
    }

    /// Append a completed exchange: the user's raw text, then the answer.
    pub fn record_exchange(&mut self, user_text: impl Into<String>, answer: impl Into<String>) {
        self.history.push(ChatMessage::user(user_text));
        self.history.push(ChatMessage::assistant(answer));
    }

    #[must_use]
    pub fn displayed_settings(&self) -> Option<MessageRef> {
        self.displayed_settings
    }

    pub fn set_displayed_settings(&mut self, message: MessageRef) {
        self.displayed_settings = Some(message);
    }

    pub fn clear_displayed_settings(&mut self) {
        self.displayed_settings = None;
    }
}

/// In-memory conversation store.
///
/// Constructed once at startup and owned by the controller.
#[derive(Debug, Default)]
pub struct SessionStore {
    conversations: HashMap<ChatId, Conversation>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Existing conversation, or a fresh one with default state.
    pub fn ensure(&mut self, chat: ChatId) -> &mut Conversation {
        self.conversations.entry(chat).or_insert_with(|| {
            tracing::debug!(%chat, "Creating conversation");
            Conversation::default()
        })
    }

    /// Discard everything for `chat` and start over with defaults.
    pub fn reset(&mut self, chat: ChatId) -> &mut Conversation {
        tracing::debug!(%chat, "Resetting conversation");
        self.conversations.remove(&chat);
        self.conversations.entry(chat).or_default()
    }

    pub fn get(&self, chat: ChatId) -> Result<&Conversation, SessionError> {
        self.conversations
            .get(&chat)
            .ok_or(SessionError::NotInitialized(chat))
    }

    pub fn get_mut(&mut self, chat: ChatId) -> Result<&mut Conversation, SessionError> {
        self.conversations
            .get_mut(&chat)
            .ok_or(SessionError::NotInitialized(chat))
    }

    #[must_use]
    pub fn contains(&self, chat: ChatId) -> bool {
        self.conversations.contains_key(&chat)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}
