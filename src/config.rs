use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::ai::DEFAULT_MODEL;
use crate::error::{AppError, Result};

const APP_DIR: &str = "tagesbrief";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub claude_api_key: Option<String>,

    #[serde(default = "default_claude_model")]
    pub claude_model: String,

    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,

    /// Active articles needed before announcements offer more recommendations.
    #[serde(default = "default_min_active_articles")]
    pub min_active_articles: u64,

    #[serde(default = "default_recommend_limit")]
    pub recommend_limit: usize,

    #[serde(default = "default_source_base_url")]
    pub source_base_url: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR);
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("articles.db").to_string_lossy().to_string()
}

fn default_claude_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_min_active_articles() -> u64 {
    8
}

fn default_recommend_limit() -> usize {
    2
}

fn default_source_base_url() -> String {
    "https://www.tagesschau.de".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            claude_api_key: None,
            claude_model: default_claude_model(),
            telegram_bot_token: None,
            telegram_chat_id: None,
            min_active_articles: default_min_active_articles(),
            recommend_limit: default_recommend_limit(),
            source_base_url: default_source_base_url(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Read `path`, writing defaults there first if it doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config: Config = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            toml::from_str(&content)?
        } else {
            let config = Config::default();
            config.save_to(path)?;
            config
        };
        config.apply_env();
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Secrets left out of the file are taken from the environment.
    fn apply_env(&mut self) {
        fill_from_env(&mut self.claude_api_key, "ANTHROPIC_API_KEY");
        fill_from_env(&mut self.telegram_bot_token, "TELEGRAM_BOT_TOKEN");
        fill_from_env(&mut self.telegram_chat_id, "TELEGRAM_CHAT_ID");
    }

    pub fn require_claude_key(&self) -> Result<&str> {
        self.claude_api_key
            .as_deref()
            .ok_or_else(|| AppError::Config("claude_api_key is not set".to_string()))
    }

    /// Token and chat id, when both are configured.
    pub fn telegram(&self) -> Option<(&str, &str)> {
        Some((
            self.telegram_bot_token.as_deref()?,
            self.telegram_chat_id.as_deref()?,
        ))
    }
}

fn fill_from_env(slot: &mut Option<String>, var: &str) {
    if slot.is_none() {
        *slot = std::env::var(var).ok().filter(|v| !v.is_empty());
    }
}
