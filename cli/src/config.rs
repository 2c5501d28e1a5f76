use crate::notifier::NotificationChannel;
use anyhow::{bail, Context, Result};
use common::{SelectionPolicy, Visibility};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// `{filename}` and `{stem}` are substituted per file.
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_description")]
    pub description: String,
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
    #[serde(default = "default_category_id")]
    pub category_id: String,
    #[serde(default)]
    pub visibility: Visibility,
}

fn default_title() -> String { common::DEFAULT_TITLE_TEMPLATE.to_string() }
fn default_description() -> String { common::DEFAULT_DESCRIPTION_TEMPLATE.to_string() }
fn default_tags() -> Vec<String> { common::DEFAULT_TAGS.iter().map(|t| t.to_string()).collect() }
fn default_category_id() -> String { common::DEFAULT_CATEGORY_ID.to_string() }

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            description: default_description(),
            tags: default_tags(),
            category_id: default_category_id(),
            visibility: Visibility::Private,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSettings {
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
}

fn default_poll_interval() -> u64 { common::DEFAULT_POLL_INTERVAL_SECS }

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_client_secrets")]
    pub client_secrets: PathBuf,
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Where the refresh token is kept between runs. `None` disables caching.
    #[serde(default = "default_token_cache")]
    pub token_cache: Option<PathBuf>,
}

fn default_client_secrets() -> PathBuf { PathBuf::from(common::DEFAULT_CLIENT_SECRETS) }
fn default_scope() -> String { crate::auth::YOUTUBE_SCOPE.to_string() }
fn default_token_cache() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(common::TOKEN_CACHE_FILE_NAME))
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            client_secrets: default_client_secrets(),
            scope: default_scope(),
            token_cache: default_token_cache(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub output: Option<PathBuf>,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            output: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub selection: SelectionPolicy,
    #[serde(default)]
    pub upload: UploadConfig,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub notifications: Vec<NotificationChannel>,
}

fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(common::CONFIG_DIR_NAME))
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(common::CONFIG_FILE_NAME))
}

impl Config {
    /// Load a `.yaml`, `.yml` or `.toml` file, chosen by extension.
    pub fn from_file(path: &Path) -> Result<Self> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if !matches!(ext, "yaml" | "yml" | "toml") {
            bail!("Unsupported config file format {}: use .yaml, .yml or .toml", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let parsed: Result<Config> = if ext == "toml" {
            toml::from_str(&content).map_err(Into::into)
        } else {
            serde_yaml::from_str(&content).map_err(Into::into)
        };
        parsed.with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// An explicit path must exist; the default location is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.selection.categories.is_empty() {
            bail!("selection.categories must list at least one category prefix");
        }
        if self.selection.categories.iter().any(|c| c.is_empty()) {
            bail!("selection.categories must not contain an empty prefix");
        }
        if self.selection.extensions.is_empty() {
            bail!("selection.extensions must list at least one extension");
        }
        if self.schedule.poll_interval_secs == 0 {
            bail!("schedule.poll_interval_secs must be greater than zero");
        }
        self.logging.level.parse::<log::LevelFilter>()
            .map_err(|_| anyhow::anyhow!("Unknown logging.level: {}", self.logging.level))?;
        Ok(())
    }
}
