//! Prompt construction for the constrained and unrestricted answers.
//!
//! Everything here is pure: same inputs, same output.

use relay_types::{ChatMessage, GenerationParams, OutputFormat, Settings};

/// Sentinel the model is asked to print when it is done.
///
/// Sent as a stop sequence when enabled. Never stripped from answers.
pub const STOP_MARKER: &str = "<<END>>";

/// Upper bound for the word-count directive.
pub const MAX_WORD_LIMIT: u32 = 120;

pub const UNRESTRICTED_TEMPERATURE: f64 = 0.7;
pub const UNRESTRICTED_MAX_TOKENS: u32 = 800;

const JSON_SCHEMA: &str = r#"{"answer": string, "points": [string]}"#;

/// Word budget for a token budget: `min(120, round(max_tokens * 0.75))`.
#[must_use]
pub fn word_limit(max_tokens: u32) -> u32 {
    let words = (f64::from(max_tokens) * 0.75).round() as u32;
    words.min(MAX_WORD_LIMIT)
}

fn format_directive(format: OutputFormat) -> String {
    match format {
        OutputFormat::Bullets => {
            "Format: answer as a bulleted list of 3 to 6 items, one item per line.".to_string()
        }
        OutputFormat::Json => format!(
            "Format: respond with strict JSON only, exactly matching the schema {JSON_SCHEMA}. \
             Do not add any text outside the JSON object."
        ),
    }
}

fn termination_directive(use_stop: bool) -> String {
    if use_stop {
        format!("Ending: when you are finished, print {STOP_MARKER} on its own final line.")
    } else {
        "Ending: stop immediately once these requirements are satisfied.".to_string()
    }
}

/// Raw user text followed by the format, length and ending requirements.
#[must_use]
pub fn build_constrained_prompt(user_text: &str, settings: &Settings) -> String {
    let words = word_limit(settings.max_tokens.value());
    format!(
        "{user_text}\n\nRequirements:\n- {}\n- Length: use at most {words} words.\n- {}",
        format_directive(settings.format),
        termination_directive(settings.use_stop),
    )
}

#[must_use]
pub fn build_constrained_params(settings: &Settings) -> GenerationParams {
    GenerationParams {
        temperature: Some(settings.temperature.value()),
        max_tokens: Some(settings.max_tokens.value()),
        frequency_penalty: Some(settings.frequency_penalty.value()),
        presence_penalty: Some(settings.presence_penalty.value()),
        stop: settings.use_stop.then(|| vec![STOP_MARKER.to_string()]),
    }
}

/// Fixed baseline parameters, independent of per-chat settings.
#[must_use]
pub fn unrestricted_params() -> GenerationParams {
    GenerationParams {
        temperature: Some(UNRESTRICTED_TEMPERATURE),
        max_tokens: Some(UNRESTRICTED_MAX_TOKENS),
        frequency_penalty: Some(0.0),
        presence_penalty: Some(0.0),
        stop: None,
    }
}

/// History followed by one new user message.
#[must_use]
pub fn build_messages(
    history: &[ChatMessage],
    user_content: impl Into<String>,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(user_content));
    messages
}
