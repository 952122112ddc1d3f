//! Shared test utilities and fixtures
//!
//! Common infrastructure for integration tests.

#![allow(dead_code)]

use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use relay_engine::{
    ApiConfig, ChatId, ChatTransport, Controller, Keyboard, MessageRef, OpenAIGateway,
    TransportError, TransportFut, UNRESTRICTED_MAX_TOKENS,
};
use relay_types::ApiKey;
use serde_json::json;
use wiremock::matchers::{bearer_token, body_partial_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "sk-test";

/// Chat Completions response carrying `content` as the first choice.
pub fn completion_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1_234_567_890,
        "model": "gpt-4o-mini",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 10, "completion_tokens": 20, "total_tokens": 30 }
    })
}

fn chat_completions() -> wiremock::MockBuilder {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(bearer_token(TEST_API_KEY))
}

/// Answer constrained requests, recognised by their requirements block.
pub async fn mount_constrained(server: &MockServer, content: &str) {
    chat_completions()
        .and(body_string_contains("Requirements:"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
        .mount(server)
        .await;
}

/// Answer unrestricted requests, recognised by their fixed token budget.
pub async fn mount_unrestricted(server: &MockServer, content: &str) {
    chat_completions()
        .and(body_partial_json(json!({ "max_tokens": UNRESTRICTED_MAX_TOKENS })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(content)))
        .mount(server)
        .await;
}

/// Fail unrestricted requests with `status`.
pub async fn mount_unrestricted_failure(server: &MockServer, status: u16) {
    chat_completions()
        .and(body_partial_json(json!({ "max_tokens": UNRESTRICTED_MAX_TOKENS })))
        .respond_with(ResponseTemplate::new(status).set_body_string("upstream unavailable"))
        .mount(server)
        .await;
}

pub fn api_config(server: &MockServer) -> ApiConfig {
    let api_key = ApiKey::new(TEST_API_KEY).expect("test key is non-empty");
    ApiConfig::new(api_key, "gpt-4o-mini")
        .expect("model is non-empty")
        .with_base_url(format!("{}/v1", server.uri()))
}

/// Outbound message observed by [`FakeTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Screen { message: MessageRef, text: String },
    Edit { target: MessageRef, text: String },
}

/// In-memory transport that records what the bot would have shown.
#[derive(Default)]
pub struct FakeTransport {
    outbound: Mutex<Vec<Outbound>>,
    last_id: AtomicI32,
}

impl FakeTransport {
    pub fn take(&self) -> Vec<Outbound> {
        std::mem::take(&mut *self.outbound.lock().unwrap())
    }

    /// Plain-text messages only, in send order.
    pub fn take_texts(&self) -> Vec<String> {
        self.take()
            .into_iter()
            .filter_map(|outbound| match outbound {
                Outbound::Text(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, outbound: Outbound) {
        self.outbound.lock().unwrap().push(outbound);
    }

    fn next_message(&self, chat: ChatId) -> MessageRef {
        MessageRef::new(chat, self.last_id.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

fn ready<T: Send + 'static>(value: Result<T, TransportError>) -> TransportFut<'static, T> {
    Box::pin(std::future::ready(value))
}

impl ChatTransport for FakeTransport {
    fn send_text<'a>(&'a self, chat: ChatId, text: &'a str) -> TransportFut<'a, MessageRef> {
        let message = self.next_message(chat);
        self.record(Outbound::Text(text.to_string()));
        ready(Ok(message))
    }

    fn send_keyboard<'a>(
        &'a self,
        chat: ChatId,
        text: &'a str,
        _keyboard: &'a Keyboard,
    ) -> TransportFut<'a, MessageRef> {
        let message = self.next_message(chat);
        self.record(Outbound::Screen {
            message,
            text: text.to_string(),
        });
        ready(Ok(message))
    }

    fn edit_keyboard<'a>(
        &'a self,
        target: MessageRef,
        text: &'a str,
        _keyboard: &'a Keyboard,
    ) -> TransportFut<'a, ()> {
        self.record(Outbound::Edit {
            target,
            text: text.to_string(),
        });
        ready(Ok(()))
    }

    fn answer_button<'a>(&'a self, _callback_id: &'a str) -> TransportFut<'a, ()> {
        ready(Ok(()))
    }

    fn send_typing(&self, _chat: ChatId) -> TransportFut<'_, ()> {
        ready(Ok(()))
    }
}

pub type LiveController = Controller<FakeTransport, OpenAIGateway>;

/// Controller wired to the mock completion API.
pub fn controller(server: &MockServer) -> LiveController {
    Controller::new(
        FakeTransport::default(),
        OpenAIGateway::new(api_config(server)),
    )
}
