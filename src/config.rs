use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Which handler set serves a bot.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum BotKind {
    #[default]
    Unreal4u,
    UptimeMonitor,
}

impl std::fmt::Display for BotKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BotKind::Unreal4u => write!(f, "unreal4u"),
            BotKind::UptimeMonitor => write!(f, "uptime_monitor"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    #[serde(default = "default_telegram_config")]
    pub telegram: TelegramConfig,
    #[serde(default = "default_media_config")]
    pub media: MediaConfig,
    #[serde(default = "default_storage_config")]
    pub storage: StorageConfig,
    #[serde(default = "default_monitor_config")]
    pub monitor: MonitorConfig,
    pub bots: Vec<BotConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
    /// Where unroutable requests get redirected
    #[serde(default = "default_fallback_url")]
    pub fallback_url: String,
    /// Public base URL of this service, used to build monitor webhook links
    #[serde(default)]
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    #[serde(default = "default_media_dir")]
    pub directory: PathBuf,
    #[serde(default = "default_media_base_url")]
    pub base_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Name of the bot that relays uptime monitor callbacks
    #[serde(default = "default_monitor_bot_name")]
    pub bot_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BotConfig {
    /// Webhook path, without the leading slash
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub kind: BotKind,
    pub token: String,
}

fn default_listen() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_fallback_url() -> String {
    "https://github.com/unreal4u?tab=repositories".to_string()
}

fn default_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_media_dir() -> PathBuf {
    PathBuf::from("media")
}

fn default_media_base_url() -> String {
    "http://media.unreal4u.com".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("botgate.db")
}

fn default_monitor_bot_name() -> String {
    "UptimeMonitorBot".to_string()
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        listen: default_listen(),
        fallback_url: default_fallback_url(),
        public_url: String::new(),
    }
}

fn default_telegram_config() -> TelegramConfig {
    TelegramConfig {
        api_url: default_api_url(),
    }
}

fn default_media_config() -> MediaConfig {
    MediaConfig {
        directory: default_media_dir(),
        base_url: default_media_base_url(),
    }
}

fn default_storage_config() -> StorageConfig {
    StorageConfig {
        database_path: default_db_path(),
    }
}

fn default_monitor_config() -> MonitorConfig {
    MonitorConfig {
        bot_name: default_monitor_bot_name(),
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config = Self::parse(&content)?;

        if !config.media.directory.exists() {
            std::fs::create_dir_all(&config.media.directory).with_context(|| {
                format!(
                    "Failed to create media directory: {}",
                    config.media.directory.display()
                )
            })?;
        }

        Ok(config)
    }

    /// Parse and validate config text without touching the filesystem.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(content).context("Failed to parse config file")?;

        for bot in &mut config.bots {
            bot.path = bot.path.trim_start_matches('/').to_string();
        }
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.bots.is_empty() {
            anyhow::bail!("No bots configured: add at least one [[bots]] entry");
        }

        let mut paths = HashSet::new();
        let mut names = HashSet::new();
        for bot in &self.bots {
            if bot.path.is_empty() {
                anyhow::bail!("Bot '{}' has an empty webhook path", bot.name);
            }
            if bot.token.trim().is_empty() {
                anyhow::bail!("Bot '{}' has an empty token", bot.name);
            }
            if !paths.insert(bot.path.as_str()) {
                anyhow::bail!("Duplicate webhook path for bot '{}'", bot.name);
            }
            if !names.insert(bot.name.as_str()) {
                anyhow::bail!("Duplicate bot name: {}", bot.name);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[[bots]]
path = "/secret-path"
name = "unreal4uBot"
token = "123:abc"
"#;

    #[test]
    fn test_defaults_applied() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.server.listen, "0.0.0.0:8080");
        assert_eq!(
            config.server.fallback_url,
            "https://github.com/unreal4u?tab=repositories"
        );
        assert_eq!(config.telegram.api_url, "https://api.telegram.org");
        assert_eq!(config.media.base_url, "http://media.unreal4u.com");
        assert_eq!(config.monitor.bot_name, "UptimeMonitorBot");
        assert_eq!(config.bots[0].kind, BotKind::Unreal4u);
    }

    #[test]
    fn test_leading_slash_stripped_from_path() {
        let config = Config::parse(MINIMAL).unwrap();
        assert_eq!(config.bots[0].path, "secret-path");
    }

    #[test]
    fn test_bot_kind_parsed() {
        let content = r#"
[[bots]]
path = "a"
name = "UptimeMonitorBot"
kind = "uptime_monitor"
token = "1:x"
"#;
        let config = Config::parse(content).unwrap();
        assert_eq!(config.bots[0].kind, BotKind::UptimeMonitor);
        assert_eq!(config.bots[0].kind.to_string(), "uptime_monitor");
    }

    #[test]
    fn test_no_bots_rejected() {
        assert!(Config::parse("bots = []").is_err());
    }

    #[test]
    fn test_duplicate_paths_rejected() {
        let content = r#"
[[bots]]
path = "same"
name = "one"
token = "1:x"

[[bots]]
path = "/same"
name = "two"
token = "2:y"
"#;
        let err = Config::parse(content).unwrap_err();
        assert!(err.to_string().contains("Duplicate webhook path"));
    }

    #[test]
    fn test_empty_token_rejected() {
        let content = r#"
[[bots]]
path = "p"
name = "one"
token = "  "
"#;
        assert!(Config::parse(content).is_err());
    }

    #[test]
    fn test_load_creates_media_directory() {
        let dir = tempfile::tempdir().unwrap();
        let media = dir.path().join("media");
        let config_path = dir.path().join("config.toml");
        std::fs::write(
            &config_path,
            format!(
                "[media]\ndirectory = {:?}\n{}",
                media.display().to_string(),
                MINIMAL
            ),
        )
        .unwrap();

        Config::load(&config_path).unwrap();
        assert!(media.is_dir());
    }
}
