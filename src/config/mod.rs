use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::models::SourceEntry;

pub const DEFAULT_CLASSIFIER_URL: &str =
    "https://api-inference.huggingface.co/models/facebook/bart-large-mnli";

pub const DEFAULT_FOOTER: &str = "Theta Bot";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub sources: SourcesConfig,
    pub scheduler: SchedulerConfig,
    pub classifier: ClassifierConfig,
    pub chat: ChatConfig,
    pub announcer: AnnouncerConfig,
    pub web: WebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// `name: url` pairs, one per line
    pub repos_file: PathBuf,
    pub fetch_timeout_secs: u64,
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub interval_minutes: u64,
    pub run_on_startup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    pub enabled: bool,
    pub api_url: String,
    /// Read from `HUGGINGFACE_TOKEN`; never written back to the config file
    #[serde(skip_serializing)]
    pub token: Option<String>,
    pub labels: Vec<String>,
    pub confidence_threshold: f64,
    pub timeout_secs: u64,
    pub model_loading_retry_secs: u64,
    pub request_delay_ms: u64,
    pub rate_limit: BackoffConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Read from `DISCORD_WEBHOOK_URL`; never written back to the config file
    #[serde(skip_serializing)]
    pub webhook_url: Option<String>,
    pub username: String,
    /// Leading text of every announcement footer, followed by the source name
    pub footer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnouncerConfig {
    pub batch_size: i64,
    pub pacing_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/thetabot.db".to_string(),
            max_connections: Some(5),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            repos_file: PathBuf::from("./data/repos.txt"),
            fetch_timeout_secs: 30,
            user_agent: format!("ThetaBot/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 120,
            run_on_startup: true,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: DEFAULT_CLASSIFIER_URL.to_string(),
            token: None,
            labels: [
                "Computer Science",
                "Electrical Engineering",
                "Mechanical Engineering",
                "Civil Engineering",
                "Chemical Engineering",
                "Biomedical Engineering",
            ]
            .iter()
            .map(|label| label.to_string())
            .collect(),
            confidence_threshold: 0.5,
            timeout_secs: 30,
            model_loading_retry_secs: 20,
            request_delay_ms: 500,
            rate_limit: BackoffConfig::default(),
        }
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 2_000,
            max_delay_ms: 30_000,
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            username: "Theta Bot".to_string(),
            footer: DEFAULT_FOOTER.to_string(),
        }
    }
}

impl Default for AnnouncerConfig {
    fn default() -> Self {
        Self {
            batch_size: 50,
            pacing_ms: 1_000,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Config {
    /// Load `path`, writing a default config there first when it is missing.
    /// Environment overrides are applied on top.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, contents)?;
            default_config
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Secrets and deployment-specific values come from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = non_empty_env("DATABASE_URL") {
            self.database.url = url;
        }
        if let Some(webhook) = non_empty_env("DISCORD_WEBHOOK_URL") {
            self.chat.webhook_url = Some(webhook);
        }
        if let Some(token) = non_empty_env("HUGGINGFACE_TOKEN") {
            self.classifier.token = Some(token);
        }
    }

    /// Startup validation. `require_chat` is false for dry runs.
    pub fn validate(&self, require_chat: bool) -> Result<()> {
        if self.scheduler.interval_minutes == 0 {
            bail!("scheduler.interval_minutes must be greater than zero");
        }
        if !(0.0..=1.0).contains(&self.classifier.confidence_threshold) {
            bail!(
                "classifier.confidence_threshold must be between 0 and 1, got {}",
                self.classifier.confidence_threshold
            );
        }
        if self.classifier.enabled && self.classifier.labels.is_empty() {
            bail!("classifier.labels must list at least one candidate label");
        }
        if self.announcer.batch_size <= 0 {
            bail!("announcer.batch_size must be greater than zero");
        }
        if require_chat {
            match self.chat.webhook_url.as_deref() {
                Some(webhook) => {
                    url::Url::parse(webhook).context("DISCORD_WEBHOOK_URL is not a valid URL")?;
                }
                None => bail!("DISCORD_WEBHOOK_URL is not set"),
            }
        }
        Ok(())
    }

    pub fn scheduler_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.interval_minutes * 60)
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Read the origin list file.
pub fn load_repos(path: impl AsRef<Path>) -> Result<Vec<SourceEntry>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading origin list {}", path.display()))?;
    Ok(parse_repos(&contents))
}

/// Parse `name: url` lines. Blank lines, `#` comments, lines without a colon
/// and entries whose URL does not parse are ignored.
pub fn parse_repos(contents: &str) -> Vec<SourceEntry> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let (name, url) = line.split_once(':')?;
            let (name, url) = (name.trim(), url.trim());
            match url::Url::parse(url) {
                Ok(_) => Some(SourceEntry {
                    name: name.to_string(),
                    url: url.to_string(),
                }),
                Err(e) => {
                    warn!("Ignoring origin '{}' with invalid URL '{}': {}", name, url, e);
                    None
                }
            }
        })
        .collect()
}
