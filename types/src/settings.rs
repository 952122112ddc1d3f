//! Per-conversation generation settings.
//!
//! Each knob is a closed enum so an out-of-range value cannot be represented.
//! `Settings` is `Copy`: readers get a snapshot, the controller mutates one
//! field at a time through [`Settings::apply`].

use crate::SettingChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MaxTokens {
    T64,
    #[default]
    T128,
    T256,
    T512,
}

impl MaxTokens {
    pub const ALL: [MaxTokens; 4] = [
        MaxTokens::T64,
        MaxTokens::T128,
        MaxTokens::T256,
        MaxTokens::T512,
    ];

    #[must_use]
    pub const fn value(self) -> u32 {
        match self {
            MaxTokens::T64 => 64,
            MaxTokens::T128 => 128,
            MaxTokens::T256 => 256,
            MaxTokens::T512 => 512,
        }
    }

    #[must_use]
    pub fn from_value(value: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.value() == value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Bullets,
    Json,
}

impl OutputFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Bullets => "bullets",
            OutputFormat::Json => "json",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "bullets" => Some(OutputFormat::Bullets),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Sampling temperature.
///
/// `Balanced` is the default and is never offered as a button; the UI only
/// switches between `Precise` and `Creative`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Temperature {
    Precise,
    #[default]
    Balanced,
    Creative,
}

impl Temperature {
    /// Values selectable from the settings keyboard.
    pub const SELECTABLE: [Temperature; 2] = [Temperature::Precise, Temperature::Creative];

    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Temperature::Precise => 0.2,
            Temperature::Balanced => 0.7,
            Temperature::Creative => 0.9,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Temperature::Precise => "0.2",
            Temperature::Balanced => "0.7",
            Temperature::Creative => "0.9",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "0.2" => Some(Temperature::Precise),
            "0.7" => Some(Temperature::Balanced),
            "0.9" => Some(Temperature::Creative),
            _ => None,
        }
    }
}

/// Frequency or presence penalty level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Penalty {
    #[default]
    Off,
    On,
}

impl Penalty {
    pub const ALL: [Penalty; 2] = [Penalty::Off, Penalty::On];

    #[must_use]
    pub const fn value(self) -> f64 {
        match self {
            Penalty::Off => 0.0,
            Penalty::On => 0.6,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Penalty::Off => "0",
            Penalty::On => "0.6",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "0" => Some(Penalty::Off),
            "0.6" => Some(Penalty::On),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub max_tokens: MaxTokens,
    pub format: OutputFormat,
    pub temperature: Temperature,
    pub frequency_penalty: Penalty,
    pub presence_penalty: Penalty,
    pub use_stop: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_tokens: MaxTokens::default(),
            format: OutputFormat::default(),
            temperature: Temperature::default(),
            frequency_penalty: Penalty::default(),
            presence_penalty: Penalty::default(),
            use_stop: true,
        }
    }
}

impl Settings {
    /// Overwrite the single field named by `change`.
    pub fn apply(&mut self, change: SettingChange) {
        match change {
            SettingChange::MaxTokens(value) => self.max_tokens = value,
            SettingChange::Format(value) => self.format = value,
            SettingChange::Temperature(value) => self.temperature = value,
            SettingChange::FrequencyPenalty(value) => self.frequency_penalty = value,
            SettingChange::PresencePenalty(value) => self.presence_penalty = value,
            SettingChange::UseStop(value) => self.use_stop = value,
        }
    }

    /// Whether `change` describes the value this snapshot already holds.
    #[must_use]
    pub fn is_selected(&self, change: SettingChange) -> bool {
        let mut updated = *self;
        updated.apply(change);
        updated == *self
    }

    /// One-line human readable summary, shown on the settings screen and
    /// above constrained answers.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "max_tokens={} · format={} · temperature={} · \
             frequency_penalty={} · presence_penalty={} · stop={}",
            self.max_tokens.value(),
            self.format.as_str(),
            self.temperature.as_str(),
            self.frequency_penalty.as_str(),
            self.presence_penalty.as_str(),
            if self.use_stop { "on" } else { "off" },
        )
    }
}
