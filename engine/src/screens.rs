//! Screen texts and inline keyboards.

use relay_types::{
    ButtonAction, Command, InlineButton, Keyboard, MaxTokens, Navigation, OutputFormat, Penalty,
    SettingChange, Settings, Temperature,
};

pub const WELCOME_TEXT: &str = "Welcome! Ask me anything. Every question gets two answers: \
     a constrained one shaped by your settings, and an unrestricted one for comparison.";
pub const RESET_TEXT: &str =
    "Conversation reset. History cleared and settings restored to defaults.";
pub const PROMPT_TEXT: &str = "Send your question as a message.";
pub const START_TEXT: &str = "There is no active conversation. Press Start to begin.";
pub const APOLOGY_TEXT: &str =
    "Sorry, something went wrong while generating the answer. Please try again.";

pub const CONSTRAINED_LABEL: &str = "Constrained answer";
pub const UNRESTRICTED_LABEL: &str = "Unrestricted answer";

const SELECTED_MARK: &str = "✅ ";

fn nav(label: &str, target: Navigation) -> InlineButton {
    InlineButton::new(label, ButtonAction::Navigate(target))
}

fn heading(label: &str) -> Vec<InlineButton> {
    vec![InlineButton::new(label, ButtonAction::Noop)]
}

fn option(settings: &Settings, label: &str, change: SettingChange) -> InlineButton {
    let label = if settings.is_selected(change) {
        format!("{SELECTED_MARK}{label}")
    } else {
        label.to_string()
    };
    InlineButton::new(label, ButtonAction::Set(change))
}

#[must_use]
pub fn settings_text(settings: &Settings) -> String {
    format!("Settings\n{}", settings.summary())
}

/// Settings keyboard: one inert heading row and one option row per knob,
/// with the current value marked.
#[must_use]
pub fn settings_keyboard(settings: &Settings) -> Keyboard {
    let max_tokens: Vec<_> = MaxTokens::ALL
        .into_iter()
        .map(|value| {
            option(
                settings,
                &value.value().to_string(),
                SettingChange::MaxTokens(value),
            )
        })
        .collect();

    let temperature: Vec<_> = Temperature::SELECTABLE
        .into_iter()
        .map(|value| option(settings, value.as_str(), SettingChange::Temperature(value)))
        .collect();

    let frequency: Vec<_> = Penalty::ALL
        .into_iter()
        .map(|value| {
            option(
                settings,
                value.as_str(),
                SettingChange::FrequencyPenalty(value),
            )
        })
        .collect();

    let presence: Vec<_> = Penalty::ALL
        .into_iter()
        .map(|value| {
            option(
                settings,
                value.as_str(),
                SettingChange::PresencePenalty(value),
            )
        })
        .collect();

    Keyboard::new()
        .row(heading("Max tokens"))
        .row(max_tokens)
        .row(heading("Format"))
        .row(vec![
            option(settings, "Bullets", SettingChange::Format(OutputFormat::Bullets)),
            option(settings, "JSON", SettingChange::Format(OutputFormat::Json)),
        ])
        .row(heading("Temperature"))
        .row(temperature)
        .row(heading("Frequency penalty"))
        .row(frequency)
        .row(heading("Presence penalty"))
        .row(presence)
        .row(heading("Stop marker"))
        .row(vec![
            option(settings, "On", SettingChange::UseStop(true)),
            option(settings, "Off", SettingChange::UseStop(false)),
        ])
        .row(vec![nav("⬅️ Back to prompt", Navigation::BackToPrompt)])
}

#[must_use]
pub fn prompt_keyboard() -> Keyboard {
    Keyboard::new().row(vec![
        nav("📝 New question", Navigation::NewQuestion),
        nav("⚙️ Settings", Navigation::OpenSettings),
    ])
}

#[must_use]
pub fn start_keyboard() -> Keyboard {
    Keyboard::new().row(vec![nav("▶️ Start", Navigation::DoStart)])
}

#[must_use]
pub fn help_text() -> String {
    let mut text = String::from("Commands:");
    for (command, description) in Command::ALL {
        text.push_str(&format!("\n/{} - {description}", command.name()));
    }
    text
}
