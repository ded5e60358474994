// tests/dispatch_filter.rs
mod common;

use std::sync::Arc;

use common::*;
use news_feed_relay::dispatch::NO_NEW_ITEMS_TEXT;
use news_feed_relay::ledger::{Ledger, MemoryStore};

#[tokio::test]
async fn keyword_category_delivers_only_matches() {
    let channel = Arc::new(RecordingChannel::with_channels(&[3]));
    let feeds = Arc::new(StubFeeds::new().with_feed(
        "https://svt.test/utrikes",
        vec![
            entry("https://svt.test/eu", "EU-möte i Bryssel", ""),
            entry("https://svt.test/budget", "Ny budget presenterad", "Regeringen lägger fram"),
            entry("https://svt.test/europa", "Val", "Stort val i Europa"),
        ],
    ));
    let d = dispatcher(channel.clone(), feeds, Arc::new(MemoryStore::new()), None);
    let cat = category("eu", &["https://svt.test/utrikes"], Some(&["eu", "bryssel", "europa"]), None, 3);

    let mut ledger = Ledger::new();
    assert_eq!(d.dispatch(&cat, &mut ledger).await.unwrap(), 2);

    let links: Vec<_> = channel.items(3).into_iter().map(|i| i.link).collect();
    assert_eq!(links, ["https://svt.test/eu", "https://svt.test/europa"]);
    // Filtered entries are not recorded.
    assert!(!ledger.contains("https://svt.test/budget"));
}

#[tokio::test]
async fn no_keywords_delivers_everything() {
    let channel = Arc::new(RecordingChannel::with_channels(&[3]));
    let feeds = Arc::new(StubFeeds::new().with_feed(
        "https://riksdagen.test/rss",
        vec![
            entry("https://riksdagen.test/1", "Debatt", ""),
            entry("https://riksdagen.test/2", "", ""),
            entry("https://riksdagen.test/3", "Votering", "Utskottets förslag"),
        ],
    ));
    let d = dispatcher(channel.clone(), feeds, Arc::new(MemoryStore::new()), None);
    let cat = category("riksdagen", &["https://riksdagen.test/rss"], None, None, 3);

    let mut ledger = Ledger::new();
    assert_eq!(d.dispatch(&cat, &mut ledger).await.unwrap(), 3);
    assert_eq!(channel.items(3).len(), 3);
}

#[tokio::test]
async fn nothing_new_sends_exactly_one_notice_after_header() {
    let channel = Arc::new(RecordingChannel::with_channels(&[3]));
    let feeds = Arc::new(StubFeeds::new().with_feed(
        "https://svt.test/inrikes",
        vec![
            entry("https://svt.test/dup", "Skjutning i Malmö", ""),
            entry("https://svt.test/off", "Väder", "Sol i helgen"),
            entry("https://svt.test/blank", "", ""),
        ],
    ));
    let d = dispatcher(channel.clone(), feeds, Arc::new(MemoryStore::new()), None);
    let cat = category("gang", &["https://svt.test/inrikes"], Some(&["skjutning", "gäng"]), Some(3), 3);

    let mut ledger = Ledger::new();
    ledger.record("https://svt.test/dup", fixed_now());

    assert_eq!(d.dispatch(&cat, &mut ledger).await.unwrap(), 0);

    let sent = channel.sent();
    assert_eq!(sent.len(), 2);
    assert!(matches!(&sent[0], Sent::Text { content, .. } if content.contains("GANG NEWS")));
    assert_eq!(
        sent[1],
        Sent::Text {
            channel: 3,
            content: NO_NEW_ITEMS_TEXT.to_string()
        }
    );
    assert!(channel.items(3).is_empty());
}

#[tokio::test]
async fn header_precedes_items_and_items_carry_category_label() {
    let channel = Arc::new(RecordingChannel::with_channels(&[3]));
    let feeds = Arc::new(StubFeeds::new().with_feed(
        "https://svt.test/ekonomi",
        vec![entry("https://svt.test/r", "Riksbanken sänker räntan", "Styrräntan sänks")],
    ));
    let d = dispatcher(channel.clone(), feeds, Arc::new(MemoryStore::new()), None);
    let cat = category("ekonomi", &["https://svt.test/ekonomi"], Some(&["ränta"]), Some(3), 3);

    let mut ledger = Ledger::new();
    d.dispatch(&cat, &mut ledger).await.unwrap();

    let sent = channel.sent();
    assert_eq!(sent.len(), 2);
    assert!(matches!(&sent[0], Sent::Text { content, .. } if content.contains("2025-06-01 12:00")));
    match &sent[1] {
        Sent::Item { item, .. } => {
            assert_eq!(item.title, "Riksbanken sänker räntan");
            assert_eq!(item.category_label, "EKONOMI NEWS");
            assert_eq!(item.body, "Styrräntan sänks...");
        }
        other => panic!("expected item, got {other:?}"),
    }
}
