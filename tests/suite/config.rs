//! Config file loading and secret resolution.

use std::collections::HashMap;
use std::fs;

use relay_config::{ConfigError, RelayConfig, ResolvedConfig};

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn file_with_env_references_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
[telegram]
bot_token = "${TG_TOKEN}"

[openai]
api_key = "${OPENAI_KEY}"
model = "gpt-4o"
base_url = "http://localhost:8080/v1"
"#,
    )
    .unwrap();

    let config = RelayConfig::load_from(&path).unwrap();
    let resolved = ResolvedConfig::resolve_with(
        Some(&config),
        env(&[("TG_TOKEN", "123:abc"), ("OPENAI_KEY", "sk-file")]),
    )
    .unwrap();

    assert_eq!(resolved.bot_token.as_str(), "123:abc");
    assert_eq!(resolved.api_key.as_str(), "sk-file");
    assert_eq!(resolved.model.as_deref(), Some("gpt-4o"));
    assert_eq!(resolved.base_url.as_deref(), Some("http://localhost:8080/v1"));
}

#[test]
fn environment_alone_is_enough() {
    let resolved = ResolvedConfig::resolve_with(
        None,
        env(&[
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("OPENAI_API_KEY", "sk-env"),
        ]),
    )
    .unwrap();

    assert_eq!(resolved.api_key.as_str(), "sk-env");
    assert!(resolved.model.is_none());
    assert!(resolved.base_url.is_none());
}

#[test]
fn secrets_never_appear_in_debug_output() {
    let resolved = ResolvedConfig::resolve_with(
        None,
        env(&[
            ("TELEGRAM_BOT_TOKEN", "123:super-secret"),
            ("OPENAI_API_KEY", "sk-super-secret"),
        ]),
    )
    .unwrap();

    let debug = format!("{resolved:?}");
    assert!(!debug.contains("super-secret"));
}

#[test]
fn missing_api_key_is_fatal() {
    let err = ResolvedConfig::resolve_with(None, env(&[("TELEGRAM_BOT_TOKEN", "123:abc")]))
        .unwrap_err();

    assert!(matches!(
        err,
        ConfigError::MissingSecret {
            env_var: "OPENAI_API_KEY",
            ..
        }
    ));
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "[openai\napi_key = ").unwrap();

    let err = RelayConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}
