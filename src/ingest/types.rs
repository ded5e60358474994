// src/ingest/types.rs
use crate::error::FeedFetchError;

/// One candidate item from a feed, already normalized at parse time.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FeedEntry {
    pub link: String,  // dedup key
    pub title: String, // may be empty
    pub body: String,  // HTML-free summary/description, may be empty
}

impl FeedEntry {
    pub fn new(link: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            body: body.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse one feed URL. Entries come back in the feed's own order.
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, FeedFetchError>;
    fn name(&self) -> &'static str;
}
