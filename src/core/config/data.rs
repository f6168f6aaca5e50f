use crate::api::NavigationItem;
use crate::core::reveal::{DEFAULT_REVEAL_INTERVAL, DEFAULT_REVEAL_STEP};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8080";
pub const ENV_BACKEND_URL: &str = "THREADLINE_BACKEND_URL";
pub const ENV_API_KEY: &str = "THREADLINE_API_KEY";

/// On-disk configuration. Every field is optional so that a partial file
/// (or none at all) still loads.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the chat backend (e.g., "https://chat.example.com")
    pub backend_url: Option<String>,
    /// Bearer token sent with every backend request
    pub api_key: Option<String>,
    /// UI theme name ("dark", "light", "monochrome")
    pub theme: Option<String>,
    /// Render answers as markdown; plain text otherwise
    pub markdown: Option<bool>,
    /// Enable syntax highlighting for fenced code blocks when markdown is enabled
    pub syntax: Option<bool>,
    /// Hide "Log out" from the account menu
    pub logout_disabled: Option<bool>,
    /// Characters revealed per tick when animating an answer
    pub reveal_step: Option<usize>,
    /// Milliseconds between reveal ticks
    pub reveal_interval_ms: Option<u64>,
    /// Extra links shown at the top of the account menu
    #[serde(default)]
    pub custom_nav_items: Vec<NavigationItem>,
}

/// Resolved settings handed explicitly to components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub backend_url: String,
    pub api_key: Option<String>,
    pub theme: String,
    pub markdown: bool,
    pub syntax: bool,
    pub logout_disabled: bool,
    pub reveal_step: usize,
    pub reveal_interval: Duration,
    pub custom_nav_items: Vec<NavigationItem>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings::resolve_with_env(&Config::default(), |_| None)
    }
}

impl Settings {
    pub fn resolve(config: &Config) -> Self {
        Self::resolve_with_env(config, |key| std::env::var(key).ok())
    }

    /// Config file values win over the environment; the environment only
    /// fills gaps.
    pub fn resolve_with_env(config: &Config, env: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        Settings {
            backend_url: non_empty(config.backend_url.clone())
                .or_else(|| non_empty(env(ENV_BACKEND_URL)))
                .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string()),
            api_key: non_empty(config.api_key.clone()).or_else(|| non_empty(env(ENV_API_KEY))),
            theme: config.theme.clone().unwrap_or_else(|| "dark".to_string()),
            markdown: config.markdown.unwrap_or(true),
            syntax: config.syntax.unwrap_or(true),
            logout_disabled: config.logout_disabled.unwrap_or(false),
            reveal_step: config.reveal_step.unwrap_or(DEFAULT_REVEAL_STEP).max(1),
            reveal_interval: config
                .reveal_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_REVEAL_INTERVAL),
            custom_nav_items: config.custom_nav_items.clone(),
        }
    }
}

/// Get a user-friendly display string for a path, using `~` for the home
/// directory on Unix-like systems.
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_config_or_env() {
        let settings = Settings::default();
        assert_eq!(settings.backend_url, DEFAULT_BACKEND_URL);
        assert_eq!(settings.api_key, None);
        assert!(settings.markdown);
        assert_eq!(settings.reveal_step, DEFAULT_REVEAL_STEP);
        assert_eq!(settings.reveal_interval, DEFAULT_REVEAL_INTERVAL);
    }

    #[test]
    fn environment_fills_missing_values_only() {
        let config = Config {
            backend_url: Some("https://from-file.example".into()),
            ..Config::default()
        };
        let settings = Settings::resolve_with_env(&config, |key| match key {
            ENV_BACKEND_URL => Some("https://from-env.example".into()),
            ENV_API_KEY => Some("secret".into()),
            _ => None,
        });
        assert_eq!(settings.backend_url, "https://from-file.example");
        assert_eq!(settings.api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn zero_reveal_step_is_clamped() {
        let config = Config {
            reveal_step: Some(0),
            reveal_interval_ms: Some(25),
            ..Config::default()
        };
        let settings = Settings::resolve_with_env(&config, |_| None);
        assert_eq!(settings.reveal_step, 1);
        assert_eq!(settings.reveal_interval, Duration::from_millis(25));
    }

    #[test]
    fn nav_items_parse_from_toml() {
        let config: Config = toml::from_str(
            r#"
backend_url = "https://chat.example.com"

[[custom_nav_items]]
link = "https://wiki.example.com"
title = "Wiki"
icon = "FaBook"
"#,
        )
        .unwrap();
        assert_eq!(config.custom_nav_items.len(), 1);
        assert_eq!(config.custom_nav_items[0].title, "Wiki");
        assert_eq!(config.custom_nav_items[0].svg_logo, None);
    }
}
