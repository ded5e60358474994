// src/notify/discord.rs
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use super::{ChannelHandle, ChatChannel, ItemMessage};
use crate::category::ChannelId;
use crate::error::ChannelError;

const API_BASE: &str = "https://discord.com/api/v10";
const EMBED_COLOR: u32 = 0x005BBB;
const TITLE_MAX_CHARS: usize = 256;
const DESCRIPTION_MAX_CHARS: usize = 4096;

/// Discord bot over the REST API (no gateway connection needed for sending).
#[derive(Clone)]
pub struct DiscordChannel {
    token: String,
    client: Client,
    base: String,
    timeout: Duration,
    max_retries: u8,
}

impl DiscordChannel {
    pub fn new(token: String) -> Self {
        Self {
            token,
            client: Client::new(),
            base: API_BASE.to_string(),
            timeout: Duration::from_secs(10),
            max_retries: 3,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_retries(mut self, retries: u8) -> Self {
        self.max_retries = retries.max(1);
        self
    }

    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    /// Longest a single `send_*` call can take: every attempt timing out plus
    /// the clamped waits between them. Callers bounding a send from outside
    /// must allow at least this much, or they can cancel a delivered post.
    pub fn call_budget(&self) -> Duration {
        let attempts = u32::from(self.max_retries);
        self.timeout * attempts + self.timeout * (attempts - 1) + Duration::from_secs(1)
    }

    /// Pause before the next attempt, never longer than one attempt's timeout.
    fn retry_wait(&self, body: Option<&str>, attempt: u8) -> Duration {
        body.and_then(retry_after)
            .unwrap_or_else(|| backoff(attempt))
            .min(self.timeout)
    }

    async fn post_message(&self, channel: ChannelId, payload: &MessagePayload) -> Result<(), ChannelError> {
        let url = format!("{}/channels/{}/messages", self.base, channel);

        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let res = self
                .client
                .post(&url)
                .header("Authorization", format!("Bot {}", self.token))
                .timeout(self.timeout)
                .json(payload)
                .send()
                .await;

            let err = match res {
                Ok(rsp) if rsp.status().is_success() => return Ok(()),
                Ok(rsp) => {
                    let status = rsp.status();
                    let retryable =
                        status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error();
                    let body = rsp.text().await.unwrap_or_default();
                    if retryable && attempt < self.max_retries {
                        let wait = self.retry_wait(Some(body.as_str()), attempt);
                        tracing::debug!(status = status.as_u16(), ?wait, "discord send retry");
                        tokio::time::sleep(wait).await;
                        continue;
                    }
                    ChannelError::Status {
                        status: status.as_u16(),
                        body,
                    }
                }
                Err(e) if e.is_timeout() => ChannelError::Timeout(self.timeout.as_secs()),
                Err(e) => {
                    if attempt < self.max_retries {
                        tokio::time::sleep(self.retry_wait(None, attempt)).await;
                        continue;
                    }
                    ChannelError::Http(e)
                }
            };
            return Err(err);
        }
    }
}

fn backoff(attempt: u8) -> Duration {
    Duration::from_millis(500u64 << (attempt - 1))
}

/// 429 bodies carry `retry_after` in (fractional) seconds.
fn retry_after(body: &str) -> Option<Duration> {
    #[derive(Deserialize)]
    struct RateLimited {
        retry_after: f64,
    }
    let rl: RateLimited = serde_json::from_str(body).ok()?;
    Duration::try_from_secs_f64(rl.retry_after).ok()
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

#[async_trait]
impl ChatChannel for DiscordChannel {
    async fn resolve(&self, id: ChannelId) -> Result<Option<ChannelHandle>, ChannelError> {
        #[derive(Deserialize)]
        struct ChannelObj {
            name: Option<String>,
        }

        let url = format!("{}/channels/{}", self.base, id);
        let rsp = self
            .client
            .get(&url)
            .header("Authorization", format!("Bot {}", self.token))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChannelError::Timeout(self.timeout.as_secs())
                } else {
                    ChannelError::Http(e)
                }
            })?;

        match rsp.status() {
            s if s.is_success() => {
                let obj: ChannelObj = rsp.json().await?;
                Ok(Some(ChannelHandle { id, name: obj.name }))
            }
            // Unknown channel, or one the bot cannot see.
            StatusCode::NOT_FOUND | StatusCode::FORBIDDEN => Ok(None),
            s => Err(ChannelError::Status {
                status: s.as_u16(),
                body: rsp.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn send_text(&self, channel: &ChannelHandle, content: &str) -> Result<(), ChannelError> {
        self.post_message(channel.id, &MessagePayload::text(content)).await
    }

    async fn send_item(&self, channel: &ChannelHandle, item: &ItemMessage) -> Result<(), ChannelError> {
        self.post_message(channel.id, &MessagePayload::item(item)).await
    }
}

#[derive(Serialize)]
struct EmbedFooter {
    text: String,
}

#[derive(Serialize)]
struct DiscordEmbed {
    title: String,
    description: String,
    url: String,
    color: u32,
    footer: EmbedFooter,
}

#[derive(Serialize)]
struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    embeds: Vec<DiscordEmbed>,
}

impl MessagePayload {
    fn text(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            embeds: Vec::new(),
        }
    }

    fn item(item: &ItemMessage) -> Self {
        Self {
            content: None,
            embeds: vec![DiscordEmbed {
                title: truncate_chars(&item.title, TITLE_MAX_CHARS),
                description: truncate_chars(&item.body, DESCRIPTION_MAX_CHARS),
                url: item.link.clone(),
                color: EMBED_COLOR,
                footer: EmbedFooter {
                    text: item.category_label.clone(),
                },
            }],
        }
    }
}
