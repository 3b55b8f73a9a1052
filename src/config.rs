use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = ".pr-digest.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-digest.toml.
/// All fields are optional; the tool works with zero config when the
/// secrets come from the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub notion: NotionConfig,

    #[serde(default)]
    pub slack: WebhookConfig,

    #[serde(default)]
    pub discord: WebhookConfig,

    /// Default label filters, merged with the CLI flags
    #[serde(default)]
    pub filters: FilterConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_per_page")]
    pub per_page: usize,
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
    /// Concurrent detail/issue lookups
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_per_page() -> usize {
    100
}
fn default_max_pages() -> usize {
    10
}
fn default_concurrency() -> usize {
    8
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_url: default_api_url(),
            per_page: default_per_page(),
            max_pages: default_max_pages(),
            concurrency: default_concurrency(),
        }
    }
}

impl GitHubConfig {
    /// Config file value takes precedence, falls back to GITHUB_TOKEN.
    pub fn resolve_token(&self) -> Option<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("GITHUB_TOKEN").ok())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotionConfig {
    pub token: Option<String>,
    pub database_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookConfig {
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub include_labels: Vec<String>,
    #[serde(default)]
    pub exclude_labels: Vec<String>,
}

fn fill_from_env(slot: &mut Option<String>, var: &str) {
    if slot.is_none() {
        if let Ok(value) = std::env::var(var) {
            *slot = Some(value);
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from .pr-digest.toml in the current
    /// directory. A missing default file yields the default config; a missing
    /// explicit path is an error. Unset secrets are filled from the environment.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match path {
            Some(explicit) => Self::load_from(explicit)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        fill_from_env(&mut config.github.token, "GITHUB_TOKEN");
        fill_from_env(&mut config.notion.token, "NOTION_TOKEN");
        fill_from_env(&mut config.notion.database_id, "NOTION_DATABASE_ID");
        fill_from_env(&mut config.slack.webhook_url, "SLACK_WEBHOOK_URL");
        fill_from_env(&mut config.discord.webhook_url, "DISCORD_WEBHOOK_URL");

        Ok(config)
    }

    /// Load from a specific path without consulting the environment.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }
}
