// src/config/mod.rs
//! Static configuration, read once at startup.
//!
//! Lookup order for the relay file:
//! 1) $RELAY_CONFIG_PATH
//! 2) config/relay.toml
//! 3) built-in defaults (the Swedish news deployment)
//!
//! Channel ids and secrets come from the environment (`.env` is loaded by
//! the binary before this runs).

pub mod defaults;
pub mod summarizer;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

use crate::category::{Category, ChannelId};
use crate::ledger::DEFAULT_RETENTION_DAYS;
pub use summarizer::SummarizerConfig;

pub const ENV_CONFIG_PATH: &str = "RELAY_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/relay.toml";
const ENV_INTERVAL_MINUTES: &str = "RUN_INTERVAL_MINUTES";
const ENV_LEDGER_PATH: &str = "RELAY_LEDGER_PATH";

/// Upper bounds keep date and timer arithmetic in range.
pub const MAX_RETENTION_DAYS: i64 = 3650;
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

fn default_ledger_path() -> PathBuf {
    PathBuf::from("posted_links.json")
}
fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS
}
fn default_interval_minutes() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Timeouts {
    #[serde(default = "Timeouts::default_feed_secs")]
    pub feed_secs: u64,
    #[serde(default = "Timeouts::default_channel_secs")]
    pub channel_secs: u64,
    #[serde(default = "Timeouts::default_summarize_secs")]
    pub summarize_secs: u64,
}

impl Timeouts {
    fn default_feed_secs() -> u64 {
        20
    }
    fn default_channel_secs() -> u64 {
        10
    }
    fn default_summarize_secs() -> u64 {
        30
    }

    pub fn feed(&self) -> Duration {
        Duration::from_secs(self.feed_secs)
    }
    pub fn channel(&self) -> Duration {
        Duration::from_secs(self.channel_secs)
    }
    pub fn summarize(&self) -> Duration {
        Duration::from_secs(self.summarize_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            feed_secs: Self::default_feed_secs(),
            channel_secs: Self::default_channel_secs(),
            summarize_secs: Self::default_summarize_secs(),
        }
    }
}

/// Category as written in the file; the channel is resolved against env.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CategoryConfig {
    pub id: String,
    pub name: String,
    pub feeds: Vec<String>,
    #[serde(default)]
    pub keywords: Option<Vec<String>>,
    #[serde(default)]
    pub cap: Option<usize>,
    /// Literal channel id; wins over `channel_env`.
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    /// Env var holding the channel id. Defaults to `CHANNEL_<ID>`.
    #[serde(default)]
    pub channel_env: Option<String>,
}

impl CategoryConfig {
    fn channel_env_name(&self) -> String {
        self.channel_env
            .clone()
            .unwrap_or_else(|| format!("CHANNEL_{}", self.id.to_ascii_uppercase()))
    }

    fn resolve(self, env: &dyn Fn(&str) -> Option<String>) -> Result<Category> {
        let channel = match self.channel_id {
            Some(id) => id,
            None => {
                let var = self.channel_env_name();
                let raw = env(&var)
                    .ok_or_else(|| anyhow!("category {}: {} is not set", self.id, var))?;
                raw.trim()
                    .parse::<ChannelId>()
                    .with_context(|| format!("category {}: {} is not a channel id", self.id, var))?
            }
        };
        Ok(Category {
            // An empty set filters nothing, same as no set.
            keywords: self.keywords.map(clean_list).filter(|ks| !ks.is_empty()),
            id: self.id,
            name: self.name,
            feeds: self.feeds,
            cap: self.cap,
            channel,
        })
    }
}

/// Shape of `config/relay.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct RelayFile {
    #[serde(default = "default_ledger_path")]
    pub ledger_path: PathBuf,
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u64,
    #[serde(default)]
    pub timeouts: Timeouts,
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    pub categories: Vec<CategoryConfig>,
}

/// Resolved runtime configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub ledger_path: PathBuf,
    pub retention: chrono::Duration,
    pub interval: Duration,
    pub timeouts: Timeouts,
    pub summarizer: SummarizerConfig,
    pub categories: Vec<Category>,
}

impl RelayConfig {
    /// Load using env var + fallbacks (see module docs).
    pub fn load_default() -> Result<Self> {
        Self::from_file(load_file_default()?, &|k| std::env::var(k).ok())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        Self::from_file(load_file_from(path)?, &|k| std::env::var(k).ok())
    }

    /// Apply env overrides, resolve channels and validate.
    pub fn from_file(file: RelayFile, env: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        let interval_minutes = match env(ENV_INTERVAL_MINUTES) {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .with_context(|| format!("{ENV_INTERVAL_MINUTES} must be whole minutes"))?,
            None => file.interval_minutes,
        };
        let ledger_path = env(ENV_LEDGER_PATH)
            .map(PathBuf::from)
            .unwrap_or(file.ledger_path);

        if !(1..=MAX_INTERVAL_MINUTES).contains(&interval_minutes) {
            bail!("interval must be between 1 and {MAX_INTERVAL_MINUTES} minutes, got {interval_minutes}");
        }
        if !(1..=MAX_RETENTION_DAYS).contains(&file.retention_days) {
            bail!(
                "retention_days must be between 1 and {MAX_RETENTION_DAYS}, got {}",
                file.retention_days
            );
        }
        if file.categories.is_empty() {
            bail!("no categories configured");
        }

        let mut seen = HashSet::new();
        let mut categories = Vec::with_capacity(file.categories.len());
        for cat_cfg in file.categories {
            if !seen.insert(cat_cfg.id.clone()) {
                bail!("duplicate category id {}", cat_cfg.id);
            }
            if cat_cfg.feeds.is_empty() {
                bail!("category {} has no feeds", cat_cfg.id);
            }
            categories.push(cat_cfg.resolve(env)?);
        }

        let summarizer = file.summarizer.resolve(env)?;

        Ok(Self {
            ledger_path,
            retention: chrono::Duration::days(file.retention_days),
            interval: Duration::from_secs(interval_minutes * 60),
            timeouts: file.timeouts,
            summarizer,
            categories,
        })
    }
}

pub fn load_file_from(path: &Path) -> Result<RelayFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading relay config from {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing relay config {}", path.display()))
}

pub fn load_file_default() -> Result<RelayFile> {
    if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
        let pb = PathBuf::from(p);
        if !pb.exists() {
            bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
        }
        return load_file_from(&pb);
    }
    let default = PathBuf::from(DEFAULT_CONFIG_PATH);
    if default.exists() {
        return load_file_from(&default);
    }
    tracing::info!("no relay config file found, using built-in categories");
    Ok(defaults::builtin())
}

/// Trim, drop blanks and duplicates; keeps first-seen order.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .map(|it| it.trim().to_string())
        .filter(|it| !it.is_empty() && seen.insert(it.to_lowercase()))
        .collect()
}
