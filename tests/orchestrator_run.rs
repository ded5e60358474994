// tests/orchestrator_run.rs
mod common;

use std::sync::Arc;

use common::*;
use news_feed_relay::error::StorageError;
use news_feed_relay::ledger::{Ledger, LedgerStore, MemoryStore};
use news_feed_relay::Orchestrator;

#[tokio::test]
async fn unresolved_channel_does_not_stop_later_categories() {
    // Channel 1 (category "eu") is unknown to the platform.
    let channel = Arc::new(RecordingChannel::with_channels(&[2]));
    let feeds = Arc::new(
        StubFeeds::new()
            .with_feed("https://a.test/rss", vec![entry("https://a.test/1", "EU", "")])
            .with_feed("https://b.test/rss", vec![entry("https://b.test/1", "Budget", "")]),
    );
    let store = Arc::new(MemoryStore::new());
    let d = dispatcher(channel.clone(), feeds.clone(), store.clone(), None);
    let cats = vec![
        category("eu", &["https://a.test/rss"], None, Some(3), 1),
        category("ekonomi", &["https://b.test/rss"], None, Some(3), 2),
    ];
    let mut orch = Orchestrator::new(cats, d, Ledger::new());

    let report = orch.run_all().await.unwrap();

    assert_eq!(report.failed, ["eu"]);
    assert_eq!(report.delivered_for("ekonomi"), Some(1));
    assert_eq!(report.delivered_for("eu"), None);
    // The failed category never polled its feed nor touched the ledger.
    assert_eq!(feeds.fetched(), ["https://b.test/rss"]);
    assert!(!orch.ledger().contains("https://a.test/1"));
    assert!(orch.ledger().contains("https://b.test/1"));
}

#[tokio::test]
async fn link_delivered_earlier_in_run_is_skipped_later() {
    let channel = Arc::new(RecordingChannel::with_channels(&[1, 2]));
    let shared = "https://svt.test/inrikes";
    let feeds = Arc::new(StubFeeds::new().with_feed(
        shared,
        vec![entry("https://svt.test/skott", "Skjutning i Göteborg", "")],
    ));
    let d = dispatcher(channel.clone(), feeds, Arc::new(MemoryStore::new()), None);
    let cats = vec![
        category("dagens", &[shared], None, Some(3), 1),
        category("gang", &[shared], Some(&["skjutning"]), Some(3), 2),
    ];
    let mut orch = Orchestrator::new(cats, d, Ledger::new());

    let report = orch.run_all().await.unwrap();

    assert_eq!(report.delivered, [("dagens".to_string(), 1), ("gang".to_string(), 0)]);
    assert_eq!(channel.items(1).len(), 1);
    assert!(channel.items(2).is_empty());
}

#[tokio::test]
async fn categories_run_in_configured_order() {
    let channel = Arc::new(RecordingChannel::with_channels(&[1, 2, 3]));
    let feeds = Arc::new(StubFeeds::new());
    let d = dispatcher(channel.clone(), feeds.clone(), Arc::new(MemoryStore::new()), None);
    let cats = vec![
        category("c", &["https://c.test"], None, None, 3),
        category("a", &["https://a.test"], None, None, 1),
        category("b", &["https://b.test"], None, None, 2),
    ];
    let mut orch = Orchestrator::new(cats, d, Ledger::new());

    orch.run_all().await.unwrap();
    assert_eq!(feeds.fetched(), ["https://c.test", "https://a.test", "https://b.test"]);
}

#[tokio::test]
async fn failed_item_send_skips_category_without_recording() {
    let channel = Arc::new(RecordingChannel::with_channels(&[1]).failing_items());
    let feeds = Arc::new(StubFeeds::new().with_feed("https://a.test/rss", vec![entry("https://a.test/1", "X", "")]));
    let d = dispatcher(channel, feeds, Arc::new(MemoryStore::new()), None);
    let mut orch = Orchestrator::new(vec![category("dagens", &["https://a.test/rss"], None, None, 1)], d, Ledger::new());

    let report = orch.run_all().await.unwrap();
    assert_eq!(report.failed, ["dagens"]);
    assert!(orch.ledger().is_empty());
}

struct BrokenStore;

impl LedgerStore for BrokenStore {
    fn load(&self) -> Result<Ledger, StorageError> {
        Ok(Ledger::new())
    }
    fn save(&self, _ledger: &Ledger) -> Result<(), StorageError> {
        Err(StorageError::Write {
            path: "posted_links.json".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        })
    }
}

#[tokio::test]
async fn ledger_write_failure_aborts_the_run() {
    let channel = Arc::new(RecordingChannel::with_channels(&[1, 2]));
    let feeds = Arc::new(
        StubFeeds::new()
            .with_feed("https://a.test/rss", vec![entry("https://a.test/1", "X", "")])
            .with_feed("https://b.test/rss", vec![entry("https://b.test/1", "Y", "")]),
    );
    let d = dispatcher(channel, feeds.clone(), Arc::new(BrokenStore), None);
    let cats = vec![
        category("a", &["https://a.test/rss"], None, None, 1),
        category("b", &["https://b.test/rss"], None, None, 2),
    ];
    let mut orch = Orchestrator::new(cats, d, Ledger::new());

    let err = orch.run_all().await.unwrap_err();
    assert!(matches!(err, StorageError::Write { .. }));
    assert_eq!(feeds.fetched(), ["https://a.test/rss"]);
}
