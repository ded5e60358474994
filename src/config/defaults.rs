// src/config/defaults.rs
//! Built-in deployment: Swedish domestic, parliament, EU, economy and gang
//! crime news. Order here is dispatch order.

use super::{CategoryConfig, RelayFile, SummarizerConfig, Timeouts};

fn category(
    id: &str,
    name: &str,
    feeds: &[&str],
    keywords: Option<&[&str]>,
    cap: Option<usize>,
) -> CategoryConfig {
    CategoryConfig {
        id: id.to_string(),
        name: name.to_string(),
        feeds: feeds.iter().map(|s| s.to_string()).collect(),
        keywords: keywords.map(|ks| ks.iter().map(|s| s.to_string()).collect()),
        cap,
        channel_id: None,
        channel_env: None,
    }
}

pub fn builtin() -> RelayFile {
    RelayFile {
        ledger_path: super::default_ledger_path(),
        retention_days: super::default_retention_days(),
        interval_minutes: super::default_interval_minutes(),
        timeouts: Timeouts::default(),
        summarizer: SummarizerConfig::default(),
        categories: vec![
            category(
                "dagens",
                "📰 DAGENS NYHETER",
                &["https://www.svt.se/nyheter/inrikes/rss.xml"],
                None,
                Some(3),
            ),
            category(
                "riksdagen",
                "🏛 RIKSDAGEN",
                &[
                    "https://www.riksdagen.se/sv/aktuellt/rss/aktuellt-fran-riksdagen/",
                    "https://www.riksdagen.se/sv/press/rss/pressmeddelanden/",
                ],
                None,
                None,
            ),
            category(
                "eu",
                "🇪🇺 EU-POLITIK",
                &["https://www.svt.se/nyheter/utrikes/rss.xml"],
                Some(&["eu", "bryssel", "europa"]),
                Some(3),
            ),
            category(
                "ekonomi",
                "💰 EKONOMI",
                &["https://www.svt.se/nyheter/ekonomi/rss.xml"],
                Some(&["ränta", "inflation", "bank", "budget", "ekonomi", "riksbank"]),
                Some(3),
            ),
            category(
                "gang",
                "🚨 GÄNGKRIMINALITET",
                &["https://www.svt.se/nyheter/inrikes/rss.xml"],
                Some(&["skjutning", "gäng", "sprängning", "kriminell", "gängkriminalitet"]),
                Some(3),
            ),
        ],
    }
}
