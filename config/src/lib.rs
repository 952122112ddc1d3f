//! Configuration loading for Relay.
//!
//! Raw TOML structs keep every field optional. [`ResolvedConfig::resolve`]
//! turns them (plus the process environment) into the validated values the
//! binary needs. A missing secret is a [`ConfigError::MissingSecret`], which
//! the binary treats as fatal.
//!
//! ```toml
//! [telegram]
//! bot_token = "${TELEGRAM_BOT_TOKEN}"
//!
//! [openai]
//! api_key = "${OPENAI_API_KEY}"
//! model = "gpt-4o-mini"
//! base_url = "https://api.openai.com/v1"
//! ```

use relay_types::{ApiKey, BotToken};
use serde::Deserialize;
use std::{env, path::Path, path::PathBuf};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "RELAY_CONFIG";
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Default, Deserialize)]
pub struct RelayConfig {
    pub telegram: Option<TelegramConfig>,
    pub openai: Option<OpenAIConfig>,
}

#[derive(Default, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
}

// Manual Debug impl to prevent leaking the token in logs.
impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("bot_token", &mask(self.bot_token.as_ref()))
            .finish()
    }
}

#[derive(Default, Deserialize)]
pub struct OpenAIConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &mask(self.api_key.as_ref()))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

fn mask(opt: Option<&String>) -> &'static str {
    if opt.is_some() { "[REDACTED]" } else { "None" }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("missing required secret `{name}`: set {env_var} or `{name}` in the config file")]
    MissingSecret {
        name: &'static str,
        env_var: &'static str,
    },
}

/// Replace `${VAR}` references with environment values looked up via `lookup`.
///
/// Unset variables expand to the empty string; unterminated references are
/// kept verbatim.
pub fn expand_env_vars(value: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&lookup(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

impl RelayConfig {
    /// Load from `$RELAY_CONFIG` when set, otherwise from
    /// [`RelayConfig::default_path`] if that file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let explicit = env::var_os(CONFIG_PATH_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        Self::load_with(explicit.as_deref(), Self::default_path().as_deref())
    }

    /// An explicit path must be readable; only the default path may be absent.
    pub fn load_with(
        explicit: Option<&Path>,
        default: Option<&Path>,
    ) -> Result<Option<Self>, ConfigError> {
        if let Some(path) = explicit {
            return Self::load_from(path).map(Some);
        }
        match default {
            Some(path) if path.exists() => Self::load_from(path).map(Some),
            Some(path) => {
                tracing::debug!(path = %path.display(), "No config file; using environment only");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    /// `~/.relay/config.toml`, when a home directory is known.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".relay").join("config.toml"))
    }
}

/// Fully validated startup configuration.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub bot_token: BotToken,
    pub api_key: ApiKey,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

impl ResolvedConfig {
    /// Resolve against the process environment.
    pub fn resolve(config: Option<&RelayConfig>) -> Result<Self, ConfigError> {
        Self::resolve_with(config, |name| env::var(name).ok())
    }

    /// Resolve with an explicit environment lookup.
    ///
    /// Each secret comes from the config file (after `${VAR}` expansion) when
    /// non-blank, otherwise from its environment variable.
    pub fn resolve_with(
        config: Option<&RelayConfig>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let telegram = config.and_then(|c| c.telegram.as_ref());
        let openai = config.and_then(|c| c.openai.as_ref());

        let expand = |raw: Option<&String>| {
            raw.map(|value| expand_env_vars(value, &lookup))
                .filter(|value| !value.trim().is_empty())
        };

        let bot_token = expand(telegram.and_then(|t| t.bot_token.as_ref()))
            .or_else(|| lookup(BOT_TOKEN_ENV))
            .and_then(|raw| BotToken::new(raw.trim()).ok())
            .ok_or(ConfigError::MissingSecret {
                name: "telegram.bot_token",
                env_var: BOT_TOKEN_ENV,
            })?;

        let api_key = expand(openai.and_then(|o| o.api_key.as_ref()))
            .or_else(|| lookup(API_KEY_ENV))
            .and_then(|raw| ApiKey::new(raw.trim()).ok())
            .ok_or(ConfigError::MissingSecret {
                name: "openai.api_key",
                env_var: API_KEY_ENV,
            })?;

        let model = expand(openai.and_then(|o| o.model.as_ref()));
        let base_url = expand(openai.and_then(|o| o.base_url.as_ref()));

        Ok(Self {
            bot_token,
            api_key,
            model,
            base_url,
        })
    }
}
