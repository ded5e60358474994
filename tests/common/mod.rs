// Shared doubles for the pipeline integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};

use news_feed_relay::dispatch::Dispatcher;
use news_feed_relay::error::{ChannelError, FeedFetchError, SummarizationError};
use news_feed_relay::ingest::FeedPoller;
use news_feed_relay::ledger::LedgerStore;
use news_feed_relay::summarize::{CompletionService, Summarizer};
use news_feed_relay::{Category, ChannelHandle, ChatChannel, FeedEntry, FeedSource, ItemMessage};

pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
}

pub fn entry(link: &str, title: &str, body: &str) -> FeedEntry {
    FeedEntry::new(link, title, body)
}

pub fn category(id: &str, feeds: &[&str], keywords: Option<&[&str]>, cap: Option<usize>, channel: u64) -> Category {
    Category {
        id: id.to_string(),
        name: format!("{} NEWS", id.to_uppercase()),
        feeds: feeds.iter().map(|s| s.to_string()).collect(),
        keywords: keywords.map(|ks| ks.iter().map(|k| k.to_string()).collect()),
        cap,
        channel,
    }
}

// --- chat channel ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text { channel: u64, content: String },
    Item { channel: u64, item: ItemMessage },
}

#[derive(Default)]
pub struct RecordingChannel {
    known: HashSet<u64>,
    fail_items: bool,
    sent: Mutex<Vec<Sent>>,
}

impl RecordingChannel {
    pub fn with_channels(ids: &[u64]) -> Self {
        Self {
            known: ids.iter().copied().collect(),
            ..Default::default()
        }
    }

    pub fn failing_items(mut self) -> Self {
        self.fail_items = true;
        self
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    pub fn items(&self, channel: u64) -> Vec<ItemMessage> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Item { channel: c, item } if c == channel => Some(item),
                _ => None,
            })
            .collect()
    }

    pub fn texts(&self, channel: u64) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { channel: c, content } if c == channel => Some(content),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatChannel for RecordingChannel {
    async fn resolve(&self, id: u64) -> Result<Option<ChannelHandle>, ChannelError> {
        Ok(self.known.contains(&id).then(|| ChannelHandle { id, name: None }))
    }

    async fn send_text(&self, channel: &ChannelHandle, content: &str) -> Result<(), ChannelError> {
        self.sent.lock().unwrap().push(Sent::Text {
            channel: channel.id,
            content: content.to_string(),
        });
        Ok(())
    }

    async fn send_item(&self, channel: &ChannelHandle, item: &ItemMessage) -> Result<(), ChannelError> {
        if self.fail_items {
            return Err(ChannelError::Status {
                status: 500,
                body: "boom".into(),
            });
        }
        self.sent.lock().unwrap().push(Sent::Item {
            channel: channel.id,
            item: item.clone(),
        });
        Ok(())
    }
}

// --- feed source ---

#[derive(Default)]
pub struct StubFeeds {
    feeds: HashMap<String, Vec<FeedEntry>>,
    failing: HashSet<String>,
    hanging: HashSet<String>,
    fetched: Mutex<Vec<String>>,
}

impl StubFeeds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, entries: Vec<FeedEntry>) -> Self {
        self.feeds.insert(url.to_string(), entries);
        self
    }

    pub fn with_failing(mut self, url: &str) -> Self {
        self.failing.insert(url.to_string());
        self
    }

    pub fn with_hanging(mut self, url: &str) -> Self {
        self.hanging.insert(url.to_string());
        self
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }
}

#[async_trait]
impl FeedSource for StubFeeds {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, FeedFetchError> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.hanging.contains(url) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failing.contains(url) {
            return Err(FeedFetchError::Status {
                url: url.to_string(),
                status: 503,
            });
        }
        Ok(self.feeds.get(url).cloned().unwrap_or_default())
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

// --- completion service ---

pub struct FailingCompletion;

#[async_trait]
impl CompletionService for FailingCompletion {
    async fn complete(&self, _sys: &str, _text: &str) -> Result<String, SummarizationError> {
        Err(SummarizationError::Status(401))
    }
    fn name(&self) -> &'static str {
        "failing"
    }
}

pub struct EchoCompletion;

#[async_trait]
impl CompletionService for EchoCompletion {
    async fn complete(&self, _sys: &str, text: &str) -> Result<String, SummarizationError> {
        Ok(format!("Sammanfattning: {text}"))
    }
    fn name(&self) -> &'static str {
        "echo"
    }
}

pub fn summarizer(svc: impl CompletionService + 'static) -> Summarizer {
    Summarizer::new(Arc::new(svc), "sys", Duration::from_secs(5))
}

pub fn dispatcher(
    channel: Arc<RecordingChannel>,
    feeds: Arc<StubFeeds>,
    store: Arc<dyn LedgerStore>,
    summarizer: Option<Summarizer>,
) -> Dispatcher {
    Dispatcher::new(
        channel,
        FeedPoller::new(feeds, Duration::from_secs(20)),
        store,
        summarizer,
    )
    .with_clock(Arc::new(fixed_now))
}
