// src/ingest/providers/rss.rs
use std::time::Duration;

use async_trait::async_trait;
use metrics::{counter, histogram};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::error::FeedFetchError;
use crate::ingest::normalize_text;
use crate::ingest::types::{FeedEntry, FeedSource};

// --- RSS 2.0 ---

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    summary: Option<String>,
    description: Option<String>,
}

// --- Atom ---

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entry: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    #[serde(rename = "link", default)]
    links: Vec<AtomLink>,
    summary: Option<AtomText>,
    content: Option<AtomText>,
}

#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text", default)]
    value: String,
}

#[derive(Debug, Deserialize)]
struct AtomLink {
    #[serde(rename = "@href")]
    href: String,
    #[serde(rename = "@rel")]
    rel: Option<String>,
}

impl AtomEntry {
    fn alternate_link(&self) -> Option<String> {
        self.links
            .iter()
            .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
            .or_else(|| self.links.first())
            .map(|l| l.href.clone())
    }
}

/// Build a normalized entry; `None` when there is no usable link.
fn normalized(link: Option<String>, title: Option<&str>, body: Option<&str>) -> Option<FeedEntry> {
    let link = link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty())?;
    Some(FeedEntry {
        link,
        title: normalize_text(title.unwrap_or_default()),
        body: normalize_text(body.unwrap_or_default()),
    })
}

/// Parse an RSS 2.0 or Atom document into entries, in document order.
pub fn parse_feed(url: &str, xml: &str) -> Result<Vec<FeedEntry>, FeedFetchError> {
    let t0 = std::time::Instant::now();
    let xml_clean = scrub_html_entities_for_xml(xml);

    let entries: Vec<FeedEntry> = match from_str::<Rss>(&xml_clean) {
        Ok(rss) => rss
            .channel
            .item
            .into_iter()
            // `summary` wins over `description` when a feed carries both.
            .filter_map(|it| {
                let body = it.summary.as_deref().or(it.description.as_deref());
                normalized(it.link, it.title.as_deref(), body)
            })
            .collect(),
        Err(rss_err) => {
            let parse_err = |message: String| FeedFetchError::Parse {
                url: url.to_string(),
                message,
            };
            if !xml_clean.contains("<feed") {
                return Err(parse_err(rss_err.to_string()));
            }
            let atom: AtomFeed = from_str(&xml_clean).map_err(|e| parse_err(e.to_string()))?;
            atom.entry
                .into_iter()
                .filter_map(|e| {
                    let body = e.summary.as_ref().or(e.content.as_ref()).map(|t| t.value.as_str());
                    let title = e.title.as_ref().map(|t| t.value.as_str());
                    normalized(e.alternate_link(), title, body)
                })
                .collect()
        }
    };

    let ms = t0.elapsed().as_secs_f64() * 1_000.0;
    histogram!("relay_parse_ms").record(ms);
    counter!("relay_entries_parsed_total").increment(entries.len() as u64);
    Ok(entries)
}

/// Fetches feeds over HTTP and parses them as RSS/Atom.
pub struct HttpFeedSource {
    client: reqwest::Client,
}

impl HttpFeedSource {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("news-feed-relay/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str) -> Result<Vec<FeedEntry>, FeedFetchError> {
        let http_err = |source: reqwest::Error| FeedFetchError::Http {
            url: url.to_string(),
            source,
        };
        let resp = self.client.get(url).send().await.map_err(http_err)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FeedFetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let body = resp.text().await.map_err(http_err)?;
        parse_feed(url, &body)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// HTML entities that show up in real feeds but are not valid XML.
fn scrub_html_entities_for_xml(s: &str) -> String {
    s.replace("&nbsp;", " ")
        .replace("&ndash;", "-")
        .replace("&mdash;", "-")
        .replace("&ldquo;", "\"")
        .replace("&rdquo;", "\"")
        .replace("&lsquo;", "'")
        .replace("&rsquo;", "'")
        .replace("&hellip;", "...")
}
