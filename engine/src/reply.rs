//! Outbound answer formatting.

use relay_types::Settings;

use crate::screens::{CONSTRAINED_LABEL, UNRESTRICTED_LABEL};

/// Longest model answer sent as-is, in characters.
pub const MAX_REPLY_CHARS: usize = 3500;

/// Appended to answers cut at [`MAX_REPLY_CHARS`].
pub const TRUNCATION_MARKER: &str = "\n...(truncated)";

/// Cut `text` to its first [`MAX_REPLY_CHARS`] characters plus the marker.
///
/// Counts Unicode scalar values, so multi-byte text is never split mid-character.
#[must_use]
pub fn truncate_reply(text: &str) -> String {
    match text.char_indices().nth(MAX_REPLY_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
        None => text.to_string(),
    }
}

/// Labelled constrained answer, cut to [`MAX_REPLY_CHARS`] as a whole.
#[must_use]
pub fn constrained_reply(settings: &Settings, answer: &str) -> String {
    truncate_reply(&format!(
        "{CONSTRAINED_LABEL} ({})\n\n{answer}",
        settings.summary()
    ))
}

/// Labelled unrestricted answer, cut to [`MAX_REPLY_CHARS`] as a whole.
#[must_use]
pub fn unrestricted_reply(answer: &str) -> String {
    truncate_reply(&format!("{UNRESTRICTED_LABEL}\n\n{answer}"))
}
