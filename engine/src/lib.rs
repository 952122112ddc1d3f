//! Core engine for Relay - conversation state and interaction flow.
//!
//! This crate knows nothing about Telegram or HTTP. The binary supplies a
//! [`ChatTransport`] and a [`CompletionGateway`]; the [`Controller`] drives
//! both from inbound events.

mod controller;
mod prompt;
mod reply;
mod screens;
mod session_state;
mod transport;

pub use controller::{ButtonPress, Controller, InboundEvent};
pub use prompt::{
    MAX_WORD_LIMIT, STOP_MARKER, UNRESTRICTED_MAX_TOKENS, UNRESTRICTED_TEMPERATURE,
    build_constrained_params, build_constrained_prompt, build_messages, unrestricted_params,
    word_limit,
};
pub use reply::{
    MAX_REPLY_CHARS, TRUNCATION_MARKER, constrained_reply, truncate_reply, unrestricted_reply,
};
pub use screens::{
    APOLOGY_TEXT, CONSTRAINED_LABEL, PROMPT_TEXT, RESET_TEXT, START_TEXT, UNRESTRICTED_LABEL,
    WELCOME_TEXT, help_text, prompt_keyboard, settings_keyboard, settings_text, start_keyboard,
};
pub use session_state::{Conversation, SYSTEM_PROMPT, SessionError, SessionStore};
pub use transport::{
    ChatTransport, CompletionFut, CompletionGateway, OpenAIGateway, TransportError, TransportFut,
};

pub use relay_providers::{ApiConfig, CompletionError};
pub use relay_types::{
    ButtonAction, ChatId, ChatMessage, Command, GenerationParams, Keyboard, MessageRef,
    Navigation, Role, SettingChange, Settings,
};
