use crate::{ApiConfig, CompletionError, EMPTY_COMPLETION, http_client, read_capped_error_body};
use relay_types::{ChatMessage, GenerationParams};
use serde_json::{Map, Value, json};

// ========================================================================
// Response payload
// ========================================================================

/// Text of the first choice, or the placeholder when there is none.
///
/// Any JSON shape is accepted: a missing, null, non-string or empty
/// `choices[0].message.content` yields [`EMPTY_COMPLETION`].
fn answer_text(payload: &Value) -> String {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .filter(|content| !content.is_empty())
        .map_or_else(|| EMPTY_COMPLETION.to_string(), str::to_string)
}

// ========================================================================
// Request body
// ========================================================================

/// Build the Chat Completions request body.
///
/// Parameters that are `None` are left out of the object entirely.
pub(crate) fn build_request_body(
    config: &ApiConfig,
    messages: &[ChatMessage],
    params: &GenerationParams,
) -> Value {
    let mut body = Map::new();
    body.insert("model".into(), json!(config.model()));
    body.insert("messages".into(), json!(messages));

    if let Some(temperature) = params.temperature {
        body.insert("temperature".into(), json!(temperature));
    }
    if let Some(max_tokens) = params.max_tokens {
        body.insert("max_tokens".into(), json!(max_tokens));
    }
    if let Some(frequency_penalty) = params.frequency_penalty {
        body.insert("frequency_penalty".into(), json!(frequency_penalty));
    }
    if let Some(presence_penalty) = params.presence_penalty {
        body.insert("presence_penalty".into(), json!(presence_penalty));
    }
    if let Some(stop) = params.stop.as_ref().filter(|stop| !stop.is_empty()) {
        body.insert("stop".into(), json!(stop));
    }

    Value::Object(body)
}

/// Send one completion request and return the answer text.
///
/// Exactly one HTTP request is made. Transport and status failures are
/// returned as-is; a body that is not JSON at all is a decode error.
pub async fn complete(
    config: &ApiConfig,
    messages: &[ChatMessage],
    params: &GenerationParams,
) -> Result<String, CompletionError> {
    let body = build_request_body(config, messages, params);

    tracing::debug!(
        model = config.model(),
        messages = messages.len(),
        max_tokens = ?params.max_tokens,
        "Sending completion request"
    );

    let response = http_client()
        .post(config.chat_completions_url())
        .bearer_auth(config.api_key())
        .json(&body)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = read_capped_error_body(response).await;
        return Err(CompletionError::Api {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    let payload: Value = serde_json::from_slice(&bytes)?;
    Ok(answer_text(&payload))
}
