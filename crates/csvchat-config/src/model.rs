//! Configuration schema for csvchat.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Endpoint the CSV analysis service listens on.
pub const DEFAULT_ENDPOINT: &str = "https://csvbot.onrender.com/query";

/// Root config for the csvchat client.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CsvChatConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub files: FilesConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl CsvChatConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> CsvChatConfigBuilder {
        CsvChatConfigBuilder::new()
    }
}

/// Builder for assembling a `CsvChatConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct CsvChatConfigBuilder {
    config: CsvChatConfig,
}

impl CsvChatConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: CsvChatConfig::default(),
        }
    }

    /// Replace the analysis API configuration.
    pub fn api(mut self, api: ApiConfig) -> Self {
        self.config.api = api;
        self
    }

    /// Replace the uploaded file configuration.
    pub fn files(mut self, files: FilesConfig) -> Self {
        self.config.files = files;
        self
    }

    /// Replace the reply pipeline configuration.
    pub fn reply(mut self, reply: ReplyConfig) -> Self {
        self.config.reply = reply;
        self
    }

    /// Replace the presentation configuration.
    pub fn ui(mut self, ui: UiConfig) -> Self {
        self.config.ui = ui;
        self
    }

    /// Finalize and return the built `CsvChatConfig`.
    pub fn build(self) -> CsvChatConfig {
        self.config
    }
}

/// Remote analysis API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Forward the conversation id as the `sessionId` form field.
    #[serde(default = "default_true")]
    pub send_session_id: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            send_session_id: true,
        }
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_true() -> bool {
    true
}

/// Local CSV files attached to every query.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FilesConfig {
    #[serde(default)]
    pub payers: Option<PathBuf>,
    #[serde(default)]
    pub transactions: Option<PathBuf>,
}

impl FilesConfig {
    /// True when both uploads are configured.
    pub fn is_complete(&self) -> bool {
        self.payers.is_some() && self.transactions.is_some()
    }
}

/// Where assistant replies come from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplyMode {
    /// Ask the remote CSV analysis API.
    #[default]
    Api,
    /// Answer with a canned reply after a fixed delay.
    Simulated,
}

/// Reply pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    #[serde(default)]
    pub mode: ReplyMode,
    #[serde(default = "default_simulated_delay_ms")]
    pub simulated_delay_ms: u64,
    #[serde(default = "default_simulated_text")]
    pub simulated_text: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            mode: ReplyMode::default(),
            simulated_delay_ms: default_simulated_delay_ms(),
            simulated_text: default_simulated_text(),
        }
    }
}

fn default_simulated_delay_ms() -> u64 {
    1500
}

fn default_simulated_text() -> String {
    "on it".to_string()
}

/// Color theme for the terminal UI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Dark,
    Light,
}

/// Presentation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Terminals narrower than this many columns use the compact layout.
    #[serde(default = "default_mobile_breakpoint")]
    pub mobile_breakpoint: u16,
    #[serde(default)]
    pub theme: ThemeMode,
    /// Start with the two demo conversations loaded.
    #[serde(default)]
    pub seed_demo: bool,
    #[serde(default)]
    pub user_name: Option<String>,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            mobile_breakpoint: default_mobile_breakpoint(),
            theme: ThemeMode::default(),
            seed_demo: false,
            user_name: None,
        }
    }
}

fn default_mobile_breakpoint() -> u16 {
    100
}
