// src/ingest/mod.rs
pub mod providers;
pub mod types;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;

use crate::category::Category;
use crate::error::FeedFetchError;
use crate::ingest::types::{FeedEntry, FeedSource};

/// Max chars of raw body shown when summarization is off.
pub const SNIPPET_MAX_CHARS: usize = 200;
/// Display body for entries that carry no text at all.
pub const EMPTY_BODY_TEXT: &str = "Klicka för att läsa mer.";

/// Normalize feed text: decode entities, strip tags, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let mut out = html_escape::decode_html_entities(s).to_string();

    // 2) Strip HTML tags
    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    // 3) Collapse whitespace
    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").to_string();
    out.trim().to_string()
}

/// Raw display body: first `SNIPPET_MAX_CHARS` chars plus "...".
pub fn snippet(body: &str) -> String {
    if body.trim().is_empty() {
        return EMPTY_BODY_TEXT.to_string();
    }
    let head: String = body.chars().take(SNIPPET_MAX_CHARS).collect();
    format!("{head}...")
}

/// Walks a category's sources lazily, one fetch at a time.
pub struct FeedPoller {
    source: Arc<dyn FeedSource>,
    timeout: Duration,
}

impl FeedPoller {
    pub fn new(source: Arc<dyn FeedSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Fresh cursor over `category`'s feeds. Nothing is fetched until the
    /// first `next_entry` call.
    pub fn poll<'a>(&'a self, category: &'a Category) -> CategoryPoll<'a> {
        CategoryPoll {
            poller: self,
            category,
            next_source: 0,
            buffered: VecDeque::new(),
        }
    }

    async fn fetch_one(&self, url: &str) -> Result<Vec<FeedEntry>, FeedFetchError> {
        match tokio::time::timeout(self.timeout, self.source.fetch(url)).await {
            Ok(res) => res,
            Err(_) => Err(FeedFetchError::Timeout {
                url: url.to_string(),
                secs: self.timeout.as_secs(),
            }),
        }
    }
}

pub struct CategoryPoll<'a> {
    poller: &'a FeedPoller,
    category: &'a Category,
    next_source: usize,
    buffered: VecDeque<FeedEntry>,
}

impl CategoryPoll<'_> {
    /// Next candidate in source-then-entry order, or `None` once every source
    /// has been visited. Failing sources are logged and skipped.
    pub async fn next_entry(&mut self) -> Option<FeedEntry> {
        loop {
            if let Some(entry) = self.buffered.pop_front() {
                return Some(entry);
            }
            let url = self.category.feeds.get(self.next_source)?;
            self.next_source += 1;

            match self.poller.fetch_one(url).await {
                Ok(entries) => {
                    tracing::debug!(
                        category = %self.category.id,
                        url = %url,
                        entries = entries.len(),
                        provider = self.poller.source.name(),
                        "feed fetched"
                    );
                    self.buffered.extend(entries);
                }
                Err(e) => {
                    tracing::warn!(error = %e, category = %self.category.id, url = %url, "feed source skipped");
                    counter!("relay_source_errors_total").increment(1);
                }
            }
        }
    }

    /// Number of sources fetched (or attempted) so far.
    pub fn sources_visited(&self) -> usize {
        self.next_source
    }
}
