//! Inline button actions and slash commands.
//!
//! Callback data is an opaque string on the wire. It is decoded exactly once,
//! at the transport boundary, into a [`ButtonAction`]; everything past that
//! point dispatches on the enum.

use crate::{MaxTokens, OutputFormat, Penalty, Temperature};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    NewQuestion,
    OpenSettings,
    BackToPrompt,
    DoStart,
}

impl Navigation {
    const fn as_str(self) -> &'static str {
        match self {
            Navigation::NewQuestion => "new_question",
            Navigation::OpenSettings => "open_settings",
            Navigation::BackToPrompt => "back_to_prompt",
            Navigation::DoStart => "do_start",
        }
    }
}

/// Assignment of one settings field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingChange {
    MaxTokens(MaxTokens),
    Format(OutputFormat),
    Temperature(Temperature),
    FrequencyPenalty(Penalty),
    PresencePenalty(Penalty),
    UseStop(bool),
}

impl SettingChange {
    fn encode(self) -> String {
        match self {
            SettingChange::MaxTokens(value) => format!("max_tokens={}", value.value()),
            SettingChange::Format(value) => format!("format={}", value.as_str()),
            SettingChange::Temperature(value) => format!("temperature={}", value.as_str()),
            SettingChange::FrequencyPenalty(value) => {
                format!("frequency_penalty={}", value.as_str())
            }
            SettingChange::PresencePenalty(value) => {
                format!("presence_penalty={}", value.as_str())
            }
            SettingChange::UseStop(value) => {
                format!("stop={}", if value { "on" } else { "off" })
            }
        }
    }

    fn decode(field: &str, value: &str) -> Option<Self> {
        match field {
            "max_tokens" => value
                .parse::<u32>()
                .ok()
                .and_then(MaxTokens::from_value)
                .map(SettingChange::MaxTokens),
            "format" => OutputFormat::parse(value).map(SettingChange::Format),
            "temperature" => Temperature::parse(value).map(SettingChange::Temperature),
            "frequency_penalty" => Penalty::parse(value).map(SettingChange::FrequencyPenalty),
            "presence_penalty" => Penalty::parse(value).map(SettingChange::PresencePenalty),
            "stop" => match value {
                "on" => Some(SettingChange::UseStop(true)),
                "off" => Some(SettingChange::UseStop(false)),
                _ => None,
            },
            _ => None,
        }
    }
}

/// What an inline button does when pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Navigate(Navigation),
    Set(SettingChange),
    /// Inert label button.
    Noop,
}

impl ButtonAction {
    const NOOP: &'static str = "noop";

    /// Callback identifier carried by the button on the wire.
    #[must_use]
    pub fn encode(self) -> String {
        match self {
            ButtonAction::Navigate(nav) => nav.as_str().to_string(),
            ButtonAction::Set(change) => change.encode(),
            ButtonAction::Noop => Self::NOOP.to_string(),
        }
    }

    #[must_use]
    pub fn decode(data: &str) -> Option<Self> {
        match data {
            "new_question" => Some(ButtonAction::Navigate(Navigation::NewQuestion)),
            "open_settings" => Some(ButtonAction::Navigate(Navigation::OpenSettings)),
            "back_to_prompt" => Some(ButtonAction::Navigate(Navigation::BackToPrompt)),
            "do_start" => Some(ButtonAction::Navigate(Navigation::DoStart)),
            Self::NOOP => Some(ButtonAction::Noop),
            other => {
                let (field, value) = other.split_once('=')?;
                SettingChange::decode(field, value).map(ButtonAction::Set)
            }
        }
    }
}

/// Slash commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Reset,
    Controls,
    Help,
}

impl Command {
    /// All commands with their menu descriptions.
    pub const ALL: [(Command, &'static str); 4] = [
        (Command::Start, "start a new conversation"),
        (Command::Reset, "forget history and restore default settings"),
        (Command::Controls, "show generation settings"),
        (Command::Help, "list commands"),
    ];

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Reset => "reset",
            Command::Controls => "controls",
            Command::Help => "help",
        }
    }

    /// Parse `/name`, `/name@botname` and `/name args`.
    ///
    /// Returns `None` for plain text and for unknown commands.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim_start().strip_prefix('/')?;
        let word = rest.split_whitespace().next()?;
        let name = word.split_once('@').map_or(word, |(name, _)| name);
        match name.to_ascii_lowercase().as_str() {
            "start" => Some(Command::Start),
            "reset" => Some(Command::Reset),
            "controls" => Some(Command::Controls),
            "help" => Some(Command::Help),
            _ => None,
        }
    }
}
