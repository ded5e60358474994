// src/config/summarizer.rs
use anyhow::{anyhow, bail, Result};
use serde::Deserialize;

use crate::summarize::DEFAULT_SYSTEM_PROMPT;

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SummarizerConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Only "openai" is wired up.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// "ENV" means: read from OPENAI_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_provider() -> String {
    "openai".to_string()
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: default_model(),
            api_key: default_api_key(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl SummarizerConfig {
    /// Normalize provider and resolve an "ENV" key. Disabled configs pass
    /// through untouched.
    pub fn resolve(mut self, env: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        self.provider = self.provider.trim().to_lowercase();
        if !self.enabled {
            return Ok(self);
        }
        if self.provider != "openai" {
            bail!("unsupported summarizer provider: {}", self.provider);
        }
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env("OPENAI_API_KEY")
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| anyhow!("summarizer enabled but OPENAI_API_KEY is not set"))?;
        }
        Ok(self)
    }
}
