// src/summarize.rs
//! Summarizer adapter: completion provider abstraction + soft-fail wrapper.
//!
//! `Summarizer::summarize` never returns an error. Whatever goes wrong below it
//! (timeout, auth, bad payload, empty answer) becomes `SUMMARY_FALLBACK`, and
//! the item is delivered anyway.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::error::SummarizationError;

/// Body used when the completion service fails.
pub const SUMMARY_FALLBACK: &str = "Kunde inte skapa en sammanfattning.";

/// Discord embed descriptions are capped at 4096 chars.
const SUMMARY_MAX_CHARS: usize = 4000;

pub const DEFAULT_SYSTEM_PROMPT: &str = "Du sammanfattar svenska nyheter. Svara med högst tre korta meningar på svenska, neutral ton, inga emojis. Skriv bara sammanfattningen.";

/// Low-level text generation call. Kept separate so tests can swap it.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, system_prompt: &str, text: &str) -> Result<String, SummarizationError>;
    fn name(&self) -> &'static str;
}

/// OpenAI provider (Chat Completions API).
pub struct OpenAiCompletion {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiCompletion {
    pub fn new(api_key: String, model: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("news-feed-relay/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_key,
            model: model.to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(&self, system_prompt: &str, text: &str) -> Result<String, SummarizationError> {
        if self.api_key.is_empty() {
            return Err(SummarizationError::MissingKey);
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: system_prompt,
                },
                Msg {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.2,
            max_tokens: 200,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SummarizationError::Status(status.as_u16()));
        }
        let body: Resp = resp.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or(SummarizationError::Empty)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Soft-fail wrapper around a completion service.
#[derive(Clone)]
pub struct Summarizer {
    service: Arc<dyn CompletionService>,
    system_prompt: String,
    timeout: Duration,
}

impl Summarizer {
    pub fn new(service: Arc<dyn CompletionService>, system_prompt: impl Into<String>, timeout: Duration) -> Self {
        Self {
            service,
            system_prompt: system_prompt.into(),
            timeout,
        }
    }

    pub async fn summarize(&self, text: &str) -> String {
        let call = self.service.complete(&self.system_prompt, text);
        let res = match tokio::time::timeout(self.timeout, call).await {
            Ok(res) => res,
            Err(_) => Err(SummarizationError::Timeout(self.timeout.as_secs())),
        };
        match res.and_then(|s| clamp_summary(&s).ok_or(SummarizationError::Empty)) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(error = %e, provider = self.service.name(), "summary fallback used");
                counter!("relay_summary_fallback_total").increment(1);
                SUMMARY_FALLBACK.to_string()
            }
        }
    }
}

/// Collapse to a single trimmed block that fits an embed description.
fn clamp_summary(s: &str) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().count() <= SUMMARY_MAX_CHARS {
        return Some(trimmed.to_string());
    }
    let mut out: String = trimmed.chars().take(SUMMARY_MAX_CHARS - 3).collect();
    out.push_str("...");
    Some(out)
}
