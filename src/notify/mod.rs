// src/notify/mod.rs
pub mod discord;

use crate::category::ChannelId;
use crate::error::ChannelError;

/// A channel that was confirmed to exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub id: ChannelId,
    pub name: Option<String>,
}

/// One delivered news item, rendered by the platform adapter as an embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemMessage {
    pub title: String,
    pub body: String,
    pub link: String,
    pub category_label: String,
}

#[async_trait::async_trait]
pub trait ChatChannel: Send + Sync {
    /// `Ok(None)` when the id does not name a reachable channel.
    async fn resolve(&self, id: ChannelId) -> Result<Option<ChannelHandle>, ChannelError>;
    async fn send_text(&self, channel: &ChannelHandle, content: &str) -> Result<(), ChannelError>;
    async fn send_item(&self, channel: &ChannelHandle, item: &ItemMessage) -> Result<(), ChannelError>;
}
