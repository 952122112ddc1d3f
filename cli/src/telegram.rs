//! Telegram transport and dispatcher.
//!
//! Long polling via teloxide. Both endpoints funnel into one
//! [`Controller`] behind an async mutex, so events are handled one at a time.

use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, ChatAction, ChatId as TelegramChatId, InlineKeyboardButton, InlineKeyboardMarkup,
    MessageId, Update,
};
use teloxide::{ApiError, RequestError};
use tokio::sync::Mutex;

use relay_engine::{
    ButtonPress, ChatId, ChatTransport, Command, Controller, InboundEvent, Keyboard, MessageRef,
    OpenAIGateway, TransportError, TransportFut,
};
use relay_types::BotToken;

type SharedController = Arc<Mutex<Controller<TelegramTransport, OpenAIGateway>>>;

/// [`ChatTransport`] over the Telegram Bot API.
#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

fn telegram_chat(chat: ChatId) -> TelegramChatId {
    TelegramChatId(chat.0)
}

fn message_ref(message: &Message) -> MessageRef {
    MessageRef::new(ChatId(message.chat.id.0), message.id.0)
}

fn markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows().iter().map(|row| {
        row.iter()
            .map(|button| {
                InlineKeyboardButton::callback(button.label.clone(), button.action.encode())
            })
            .collect::<Vec<_>>()
    }))
}

fn transport_error(err: RequestError) -> TransportError {
    TransportError::new(err.to_string())
}

impl ChatTransport for TelegramTransport {
    fn send_text<'a>(&'a self, chat: ChatId, text: &'a str) -> TransportFut<'a, MessageRef> {
        Box::pin(async move {
            let sent = self
                .bot
                .send_message(telegram_chat(chat), text)
                .await
                .map_err(transport_error)?;
            Ok(message_ref(&sent))
        })
    }

    fn send_keyboard<'a>(
        &'a self,
        chat: ChatId,
        text: &'a str,
        keyboard: &'a Keyboard,
    ) -> TransportFut<'a, MessageRef> {
        Box::pin(async move {
            let sent = self
                .bot
                .send_message(telegram_chat(chat), text)
                .reply_markup(markup(keyboard))
                .await
                .map_err(transport_error)?;
            Ok(message_ref(&sent))
        })
    }

    fn edit_keyboard<'a>(
        &'a self,
        target: MessageRef,
        text: &'a str,
        keyboard: &'a Keyboard,
    ) -> TransportFut<'a, ()> {
        Box::pin(async move {
            let result = self
                .bot
                .edit_message_text(telegram_chat(target.chat), MessageId(target.id), text)
                .reply_markup(markup(keyboard))
                .await;
            match result {
                // Same text and keyboard: the screen already shows what we want.
                Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
                Err(err) => Err(transport_error(err)),
            }
        })
    }

    fn answer_button<'a>(&'a self, callback_id: &'a str) -> TransportFut<'a, ()> {
        Box::pin(async move {
            self.bot
                .answer_callback_query(callback_id)
                .await
                .map(drop)
                .map_err(transport_error)
        })
    }

    fn send_typing(&self, chat: ChatId) -> TransportFut<'_, ()> {
        Box::pin(async move {
            self.bot
                .send_chat_action(telegram_chat(chat), ChatAction::Typing)
                .await
                .map(drop)
                .map_err(transport_error)
        })
    }
}

/// Verify the token, register commands and poll until shutdown.
pub async fn run(token: &BotToken, gateway: OpenAIGateway) -> Result<()> {
    let bot = Bot::new(token.as_str());

    let me = bot
        .get_me()
        .await
        .context("failed to reach Telegram; check the bot token")?;
    tracing::info!(username = %me.username(), "Connected to Telegram");

    let commands: Vec<_> = Command::ALL
        .iter()
        .map(|(command, description)| BotCommand::new(command.name(), *description))
        .collect();
    if let Err(err) = bot.set_my_commands(commands).await {
        tracing::warn!(%err, "Failed to register bot commands");
    }

    let controller: SharedController = Arc::new(Mutex::new(Controller::new(
        TelegramTransport::new(bot.clone()),
        gateway,
    )));

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![controller])
        .default_handler(|update| async move {
            tracing::debug!(id = ?update.id, "Unhandled update");
        })
        .enable_ctrlc_handler()
        .build();

    let shutdown = dispatcher.shutdown_token();
    tokio::spawn(async move {
        wait_for_terminate().await;
        tracing::info!("SIGTERM received; shutting down");
        match shutdown.shutdown() {
            Ok(stopped) => stopped.await,
            Err(err) => tracing::debug!(%err, "Dispatcher was not running"),
        }
    });

    tracing::info!("Polling for updates");
    dispatcher.dispatch().await;
    tracing::info!("Dispatcher stopped");
    Ok(())
}

#[cfg(unix)]
async fn wait_for_terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut terminate) => {
            terminate.recv().await;
        }
        Err(err) => {
            tracing::warn!(%err, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_terminate() {
    std::future::pending::<()>().await;
}

async fn handle(controller: &SharedController, event: InboundEvent) {
    let chat = event.chat();
    if let Err(err) = controller.lock().await.handle(event).await {
        tracing::warn!(%chat, %err, "Failed to handle event");
    }
}

async fn on_message(msg: Message, controller: SharedController) -> ResponseResult<()> {
    let chat = ChatId(msg.chat.id.0);
    let Some(text) = msg.text() else {
        tracing::debug!(%chat, "Ignoring non-text message");
        return Ok(());
    };

    handle(&controller, InboundEvent::from_message(chat, text)).await;
    Ok(())
}

async fn on_callback(query: CallbackQuery, controller: SharedController) -> ResponseResult<()> {
    let origin = query
        .message
        .as_ref()
        .map(|message| MessageRef::new(ChatId(message.chat().id.0), message.id().0));
    // Without a message the press came from a private chat with the sender.
    let chat = origin.map_or(ChatId(query.from.id.0 as i64), |origin| origin.chat);

    let press = ButtonPress::new(chat, query.id.clone(), origin, query.data.as_deref());
    handle(&controller, InboundEvent::Button(press)).await;
    Ok(())
}
