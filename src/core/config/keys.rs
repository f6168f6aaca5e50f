//! Settable configuration keys for `threadline config set/unset`.

use crate::core::config::data::Config;
use crate::core::config::io::ConfigError;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingError {
    #[error("Unknown config key: {0}")]
    UnknownKey(String),

    #[error("Invalid boolean value: {0} (use on/off, true/false, or yes/no)")]
    InvalidBoolean(String),

    #[error("Invalid number for {key}: {input}")]
    InvalidNumber { key: ConfigKey, input: String },

    #[error("{key} cannot be set from the command line; edit the config file instead")]
    NotSettable { key: ConfigKey },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    BackendUrl,
    ApiKey,
    Theme,
    Markdown,
    Syntax,
    LogoutDisabled,
    RevealStep,
    RevealIntervalMs,
    CustomNavItems,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 9] = [
        ConfigKey::BackendUrl,
        ConfigKey::ApiKey,
        ConfigKey::Theme,
        ConfigKey::Markdown,
        ConfigKey::Syntax,
        ConfigKey::LogoutDisabled,
        ConfigKey::RevealStep,
        ConfigKey::RevealIntervalMs,
        ConfigKey::CustomNavItems,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::BackendUrl => "backend-url",
            ConfigKey::ApiKey => "api-key",
            ConfigKey::Theme => "theme",
            ConfigKey::Markdown => "markdown",
            ConfigKey::Syntax => "syntax",
            ConfigKey::LogoutDisabled => "logout-disabled",
            ConfigKey::RevealStep => "reveal-step",
            ConfigKey::RevealIntervalMs => "reveal-interval-ms",
            ConfigKey::CustomNavItems => "custom-nav-items",
        }
    }

    /// Apply `value` to `config`. Values are validated before anything is
    /// touched.
    pub fn set(self, config: &mut Config, value: &str) -> Result<String, SettingError> {
        let value = value.trim();
        match self {
            ConfigKey::BackendUrl => config.backend_url = Some(value.to_string()),
            ConfigKey::ApiKey => config.api_key = Some(value.to_string()),
            ConfigKey::Theme => config.theme = Some(value.to_lowercase()),
            ConfigKey::Markdown => config.markdown = Some(parse_bool_setting(value)?),
            ConfigKey::Syntax => config.syntax = Some(parse_bool_setting(value)?),
            ConfigKey::LogoutDisabled => config.logout_disabled = Some(parse_bool_setting(value)?),
            ConfigKey::RevealStep => config.reveal_step = Some(self.parse_number(value)?),
            ConfigKey::RevealIntervalMs => {
                config.reveal_interval_ms = Some(self.parse_number(value)?)
            }
            ConfigKey::CustomNavItems => return Err(SettingError::NotSettable { key: self }),
        }
        Ok(self.display(config))
    }

    pub fn unset(self, config: &mut Config) {
        match self {
            ConfigKey::BackendUrl => config.backend_url = None,
            ConfigKey::ApiKey => config.api_key = None,
            ConfigKey::Theme => config.theme = None,
            ConfigKey::Markdown => config.markdown = None,
            ConfigKey::Syntax => config.syntax = None,
            ConfigKey::LogoutDisabled => config.logout_disabled = None,
            ConfigKey::RevealStep => config.reveal_step = None,
            ConfigKey::RevealIntervalMs => config.reveal_interval_ms = None,
            ConfigKey::CustomNavItems => config.custom_nav_items.clear(),
        }
    }

    /// One `key: value` line for `config show`. The API key is masked.
    pub fn display(self, config: &Config) -> String {
        let value = match self {
            ConfigKey::BackendUrl => config.backend_url.clone(),
            ConfigKey::ApiKey => config.api_key.as_ref().map(|_| "********".to_string()),
            ConfigKey::Theme => config.theme.clone(),
            ConfigKey::Markdown => config.markdown.map(format_bool),
            ConfigKey::Syntax => config.syntax.map(format_bool),
            ConfigKey::LogoutDisabled => config.logout_disabled.map(format_bool),
            ConfigKey::RevealStep => config.reveal_step.map(|v| v.to_string()),
            ConfigKey::RevealIntervalMs => config.reveal_interval_ms.map(|v| v.to_string()),
            ConfigKey::CustomNavItems => (!config.custom_nav_items.is_empty())
                .then(|| format!("{} item(s)", config.custom_nav_items.len())),
        };
        format!(
            "{}: {}",
            self.name(),
            value.unwrap_or_else(|| "(unset)".to_string())
        )
    }

    fn parse_number<T: FromStr>(self, value: &str) -> Result<T, SettingError> {
        value.parse().map_err(|_| SettingError::InvalidNumber {
            key: self,
            input: value.to_string(),
        })
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = SettingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.name() == normalized)
            .ok_or_else(|| SettingError::UnknownKey(s.to_string()))
    }
}

pub fn parse_bool(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

fn parse_bool_setting(input: &str) -> Result<bool, SettingError> {
    parse_bool(input).ok_or_else(|| SettingError::InvalidBoolean(input.to_string()))
}

fn format_bool(value: bool) -> String {
    if value { "on" } else { "off" }.to_string()
}
