//! Interaction controller.
//!
//! Turns inbound chat events into session updates, completion requests and
//! outbound screens. One event is handled to completion before the next; the
//! caller is responsible for that serialization (the binary keeps the
//! controller behind a mutex).

use relay_providers::CompletionError;
use relay_types::{
    ButtonAction, ChatId, ChatMessage, Command, MessageRef, Navigation, SettingChange, Settings,
};

use crate::prompt::{
    build_constrained_params, build_constrained_prompt, build_messages, unrestricted_params,
};
use crate::reply::{constrained_reply, unrestricted_reply};
use crate::screens::{
    APOLOGY_TEXT, PROMPT_TEXT, RESET_TEXT, START_TEXT, WELCOME_TEXT, help_text, prompt_keyboard,
    settings_keyboard, settings_text, start_keyboard,
};
use crate::session_state::SessionStore;
use crate::transport::{ChatTransport, CompletionGateway, TransportError};

/// A button press as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonPress {
    pub chat: ChatId,
    pub callback_id: String,
    /// Message the pressed button is attached to, when the transport knows it.
    pub origin: Option<MessageRef>,
    /// `None` when the callback data could not be decoded.
    pub action: Option<ButtonAction>,
}

impl ButtonPress {
    pub fn new(
        chat: ChatId,
        callback_id: impl Into<String>,
        origin: Option<MessageRef>,
        data: Option<&str>,
    ) -> Self {
        Self {
            chat,
            callback_id: callback_id.into(),
            origin,
            action: data.and_then(ButtonAction::decode),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Command { chat: ChatId, command: Command },
    Text { chat: ChatId, text: String },
    Button(ButtonPress),
}

impl InboundEvent {
    /// Route an incoming text message: known slash commands become
    /// [`InboundEvent::Command`], everything else is text.
    pub fn from_message(chat: ChatId, text: impl Into<String>) -> Self {
        let text = text.into();
        match Command::parse(&text) {
            Some(command) => InboundEvent::Command { chat, command },
            None => InboundEvent::Text { chat, text },
        }
    }

    #[must_use]
    pub fn chat(&self) -> ChatId {
        match self {
            InboundEvent::Command { chat, .. } | InboundEvent::Text { chat, .. } => *chat,
            InboundEvent::Button(press) => press.chat,
        }
    }
}

/// The two answers produced for one question.
#[derive(Debug)]
struct Answers {
    constrained: String,
    unrestricted: String,
}

pub struct Controller<T, G> {
    sessions: SessionStore,
    transport: T,
    gateway: G,
}

impl<T: ChatTransport, G: CompletionGateway> Controller<T, G> {
    pub fn new(transport: T, gateway: G) -> Self {
        Self::with_sessions(SessionStore::new(), transport, gateway)
    }

    pub fn with_sessions(sessions: SessionStore, transport: T, gateway: G) -> Self {
        Self {
            sessions,
            transport,
            gateway,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Handle one inbound event.
    ///
    /// Completion failures never escape; they are reported to the user.
    /// Transport failures outside the fallback paths are returned.
    pub async fn handle(&mut self, event: InboundEvent) -> Result<(), TransportError> {
        match event {
            InboundEvent::Command { chat, command } => {
                tracing::info!(%chat, command = command.name(), "Command received");
                match command {
                    Command::Start => self.start(chat, WELCOME_TEXT).await,
                    Command::Reset => self.start(chat, RESET_TEXT).await,
                    Command::Controls => {
                        self.sessions.ensure(chat);
                        self.render_settings(chat, None).await
                    }
                    Command::Help => self.transport.send_text(chat, &help_text()).await.map(drop),
                }
            }
            InboundEvent::Text { chat, text } => {
                tracing::info!(%chat, chars = text.chars().count(), "Text received");
                self.text(chat, text).await
            }
            InboundEvent::Button(press) => {
                tracing::info!(chat = %press.chat, action = ?press.action, "Button pressed");
                self.button(press).await
            }
        }
    }

    async fn start(&mut self, chat: ChatId, greeting: &str) -> Result<(), TransportError> {
        self.sessions.reset(chat);
        self.transport.send_text(chat, greeting).await?;
        self.render_settings(chat, None).await?;
        self.render_prompt(chat, None).await
    }

    async fn button(&mut self, press: ButtonPress) -> Result<(), TransportError> {
        let ButtonPress {
            chat,
            callback_id,
            origin,
            action,
        } = press;

        let Some(action) = action else {
            tracing::warn!(%chat, "Ignoring button with unknown callback data");
            self.acknowledge(&callback_id).await;
            return Ok(());
        };

        match action {
            ButtonAction::Set(change) => {
                self.change_setting(chat, &callback_id, origin, change)
                    .await
            }
            ButtonAction::Navigate(target) => {
                self.acknowledge(&callback_id).await;
                self.navigate(chat, origin, target).await
            }
            ButtonAction::Noop => {
                self.acknowledge(&callback_id).await;
                Ok(())
            }
        }
    }

    async fn change_setting(
        &mut self,
        chat: ChatId,
        callback_id: &str,
        origin: Option<MessageRef>,
        change: SettingChange,
    ) -> Result<(), TransportError> {
        self.sessions.ensure(chat).apply(change);
        tracing::debug!(%chat, ?change, "Setting changed");
        self.acknowledge(callback_id).await;
        self.render_settings(chat, origin).await
    }

    async fn navigate(
        &mut self,
        chat: ChatId,
        origin: Option<MessageRef>,
        target: Navigation,
    ) -> Result<(), TransportError> {
        match target {
            Navigation::DoStart => {
                self.sessions.reset(chat);
                self.render_settings(chat, None).await?;
                self.render_prompt(chat, None).await
            }
            Navigation::OpenSettings => {
                self.sessions.ensure(chat);
                self.render_settings(chat, origin).await
            }
            Navigation::BackToPrompt => self.render_prompt(chat, origin).await,
            Navigation::NewQuestion => self.render_prompt(chat, None).await,
        }
    }

    async fn text(&mut self, chat: ChatId, text: String) -> Result<(), TransportError> {
        if text.trim_start().starts_with('/') {
            tracing::debug!(%chat, "Ignoring unrecognized command");
            return Ok(());
        }

        let (history, settings) = match self.sessions.get(chat) {
            Ok(conversation) => (conversation.history().to_vec(), conversation.settings()),
            Err(err) => {
                tracing::debug!(%chat, %err, "Text without conversation; offering start");
                self.transport
                    .send_keyboard(chat, START_TEXT, &start_keyboard())
                    .await?;
                return Ok(());
            }
        };

        if let Err(err) = self.transport.send_typing(chat).await {
            tracing::debug!(%chat, %err, "Typing indicator failed");
        }

        match self.generate(&history, &settings, &text).await {
            Ok(answers) => {
                self.deliver(chat, &constrained_reply(&settings, &answers.constrained))
                    .await;
                self.deliver(chat, &unrestricted_reply(&answers.unrestricted))
                    .await;
                if let Ok(conversation) = self.sessions.get_mut(chat) {
                    conversation.record_exchange(text, answers.unrestricted);
                }
            }
            Err(err) => {
                tracing::error!(%chat, error = %err, "Completion request failed");
                self.deliver(chat, APOLOGY_TEXT).await;
            }
        }

        self.render_prompt(chat, None).await
    }

    /// Issue the constrained request, then the unrestricted one.
    ///
    /// Both requests see the same history; nothing is recorded here.
    async fn generate(
        &self,
        history: &[ChatMessage],
        settings: &Settings,
        text: &str,
    ) -> Result<Answers, CompletionError> {
        let messages = build_messages(history, build_constrained_prompt(text, settings));
        let params = build_constrained_params(settings);
        let constrained = self.gateway.complete(&messages, &params).await?;

        let messages = build_messages(history, text);
        let params = unrestricted_params();
        let unrestricted = self.gateway.complete(&messages, &params).await?;

        Ok(Answers {
            constrained,
            unrestricted,
        })
    }

    async fn deliver(&self, chat: ChatId, text: &str) {
        if let Err(err) = self.transport.send_text(chat, text).await {
            tracing::warn!(%chat, %err, "Failed to deliver reply");
        }
    }

    async fn acknowledge(&self, callback_id: &str) {
        if let Err(err) = self.transport.answer_button(callback_id).await {
            tracing::debug!(%err, "Failed to acknowledge button press");
        }
    }

    /// Show the settings screen, preferring to edit an existing message.
    ///
    /// Order: the pressed message, then the recorded settings message, then a
    /// fresh message which becomes the recorded one.
    async fn render_settings(
        &mut self,
        chat: ChatId,
        origin: Option<MessageRef>,
    ) -> Result<(), TransportError> {
        let conversation = self.sessions.ensure(chat);
        let settings = conversation.settings();
        let displayed = conversation.displayed_settings();
        let text = settings_text(&settings);
        let keyboard = settings_keyboard(&settings);

        if let Some(origin) = origin {
            match self.transport.edit_keyboard(origin, &text, &keyboard).await {
                Ok(()) => {
                    self.sessions.ensure(chat).set_displayed_settings(origin);
                    return Ok(());
                }
                Err(err) => tracing::debug!(%chat, %err, "In-place settings edit failed"),
            }
        }

        if let Some(displayed) = displayed.filter(|displayed| Some(*displayed) != origin) {
            match self.transport.edit_keyboard(displayed, &text, &keyboard).await {
                Ok(()) => return Ok(()),
                Err(err) => {
                    tracing::debug!(%chat, %err, "Recorded settings message is stale");
                    self.sessions.ensure(chat).clear_displayed_settings();
                }
            }
        }

        let sent = self
            .transport
            .send_keyboard(chat, &text, &keyboard)
            .await?;
        self.sessions.ensure(chat).set_displayed_settings(sent);
        Ok(())
    }

    /// Show the prompt screen, editing the pressed message when there is one.
    async fn render_prompt(
        &mut self,
        chat: ChatId,
        origin: Option<MessageRef>,
    ) -> Result<(), TransportError> {
        let keyboard = prompt_keyboard();

        if let Some(origin) = origin {
            match self.transport.edit_keyboard(origin, PROMPT_TEXT, &keyboard).await {
                Ok(()) => {
                    if let Ok(conversation) = self.sessions.get_mut(chat)
                        && conversation.displayed_settings() == Some(origin)
                    {
                        conversation.clear_displayed_settings();
                    }
                    return Ok(());
                }
                Err(err) => tracing::debug!(%chat, %err, "In-place prompt edit failed"),
            }
        }

        self.transport
            .send_keyboard(chat, PROMPT_TEXT, &keyboard)
            .await
            .map(drop)
    }
}
