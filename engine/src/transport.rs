//! Seams to the outside world: the chat transport and the completion API.
//!
//! Both traits return boxed `Send` futures so implementations can be held
//! behind a shared lock and driven from any runtime worker.

use std::future::Future;
use std::pin::Pin;

use relay_providers::{ApiConfig, CompletionError};
use relay_types::{ChatId, ChatMessage, GenerationParams, Keyboard, MessageRef};
use thiserror::Error;

pub type TransportFut<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;
pub type CompletionFut<'a> =
    Pin<Box<dyn Future<Output = Result<String, CompletionError>> + Send + 'a>>;

/// A chat transport call was rejected or could not be delivered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("chat transport error: {message}")]
pub struct TransportError {
    pub message: String,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Outbound operations on the chat platform.
pub trait ChatTransport: Send + Sync {
    fn send_text<'a>(&'a self, chat: ChatId, text: &'a str) -> TransportFut<'a, MessageRef>;

    fn send_keyboard<'a>(
        &'a self,
        chat: ChatId,
        text: &'a str,
        keyboard: &'a Keyboard,
    ) -> TransportFut<'a, MessageRef>;

    /// Replace the text and keyboard of an existing message.
    fn edit_keyboard<'a>(
        &'a self,
        target: MessageRef,
        text: &'a str,
        keyboard: &'a Keyboard,
    ) -> TransportFut<'a, ()>;

    /// Acknowledge a button press so the client stops its spinner.
    fn answer_button<'a>(&'a self, callback_id: &'a str) -> TransportFut<'a, ()>;

    fn send_typing(&self, chat: ChatId) -> TransportFut<'_, ()>;
}

/// Text generation backend.
pub trait CompletionGateway: Send + Sync {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        params: &'a GenerationParams,
    ) -> CompletionFut<'a>;
}

/// Completion gateway backed by the OpenAI Chat Completions API.
#[derive(Debug, Clone)]
pub struct OpenAIGateway {
    config: ApiConfig,
}

impl OpenAIGateway {
    #[must_use]
    pub fn new(config: ApiConfig) -> Self {
        Self { config }
    }
}

impl CompletionGateway for OpenAIGateway {
    fn complete<'a>(
        &'a self,
        messages: &'a [ChatMessage],
        params: &'a GenerationParams,
    ) -> CompletionFut<'a> {
        Box::pin(relay_providers::complete(&self.config, messages, params))
    }
}
