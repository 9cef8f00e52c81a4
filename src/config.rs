//! # Bot Configuration Module
//!
//! Runtime settings read from the environment (optionally seeded from a
//! `.env` file by `main`).

use anyhow::{bail, Context, Result};

pub const DEFAULT_MAX_AUDIO_BYTES: u32 = 20 * 1024 * 1024; // Bot API download limit
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 5;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Configuration for the bot process
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token
    pub telegram_bot_token: String,
    /// Postgres connection string
    pub database_url: String,
    /// Users allowed to edit and delete songs; empty means everybody
    pub admin_user_ids: Vec<u64>,
    /// Largest audio file accepted for upload
    pub max_audio_bytes: u32,
    /// Connection pool size
    pub db_max_connections: u32,
    pub log_format: LogFormat,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_bot_token: String::new(),
            database_url: String::new(),
            admin_user_ids: Vec::new(),
            max_audio_bytes: DEFAULT_MAX_AUDIO_BYTES,
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            log_format: LogFormat::Text,
        }
    }
}

impl BotConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            match lookup(key) {
                Some(value) if !value.trim().is_empty() => Ok(value),
                _ => bail!("{key} must be set"),
            }
        };

        let mut config = Self {
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            database_url: required("DATABASE_URL")?,
            ..Default::default()
        };

        if let Some(ids) = lookup("ADMIN_USER_IDS") {
            config.admin_user_ids = parse_admin_ids(&ids)?;
        }

        if let Some(value) = lookup("MAX_AUDIO_BYTES") {
            config.max_audio_bytes = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid MAX_AUDIO_BYTES: {value}"))?;
        }

        if let Some(value) = lookup("DB_MAX_CONNECTIONS") {
            config.db_max_connections = value
                .trim()
                .parse()
                .with_context(|| format!("Invalid DB_MAX_CONNECTIONS: {value}"))?;
        }

        if let Some(value) = lookup("LOG_FORMAT") {
            config.log_format = match value.trim().to_lowercase().as_str() {
                "json" => LogFormat::Json,
                "" | "text" => LogFormat::Text,
                other => bail!("Invalid LOG_FORMAT: {other}"),
            };
        }

        Ok(config)
    }

    /// Whether the user may run admin commands
    pub fn is_admin(&self, user_id: u64) -> bool {
        self.admin_user_ids.is_empty() || self.admin_user_ids.contains(&user_id)
    }
}

fn parse_admin_ids(raw: &str) -> Result<Vec<u64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .with_context(|| format!("Invalid user id in ADMIN_USER_IDS: {s}"))
        })
        .collect()
}
