// src/dispatch.rs
//! One category, one pass: header → candidates → dedup → keyword gate → cap →
//! summary/snippet → send → record. Sends and ledger writes happen in that
//! order for every item.

use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use metrics::counter;

use crate::category::Category;
use crate::error::{ChannelError, DispatchError};
use crate::filter;
use crate::ingest::{self, FeedPoller};
use crate::ledger::{Ledger, LedgerStore};
use crate::notify::{ChannelHandle, ChatChannel, ItemMessage};
use crate::summarize::Summarizer;

/// Sent once when a pass delivers nothing.
pub const NO_NEW_ITEMS_TEXT: &str = "Inga nya nyheter.";

/// Current time on the process-local clock.
pub type Clock = Arc<dyn Fn() -> NaiveDateTime + Send + Sync>;

pub fn local_clock() -> Clock {
    Arc::new(|| Local::now().naive_local())
}

pub fn header_text(category: &Category, now: NaiveDateTime) -> String {
    format!(
        "\n🇸🇪 **{} – {}**\n",
        category.name,
        now.format("%Y-%m-%d %H:%M")
    )
}

pub struct Dispatcher {
    channel: Arc<dyn ChatChannel>,
    poller: FeedPoller,
    store: Arc<dyn LedgerStore>,
    summarizer: Option<Summarizer>,
    channel_timeout: Duration,
    clock: Clock,
}

impl Dispatcher {
    pub fn new(
        channel: Arc<dyn ChatChannel>,
        poller: FeedPoller,
        store: Arc<dyn LedgerStore>,
        summarizer: Option<Summarizer>,
    ) -> Self {
        Self {
            channel,
            poller,
            store,
            summarizer,
            channel_timeout: Duration::from_secs(10),
            clock: local_clock(),
        }
    }

    pub fn with_channel_timeout(mut self, timeout: Duration) -> Self {
        self.channel_timeout = timeout;
        self
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Deliver new matching entries of `category`. `ledger` is updated and
    /// persisted after every single send. Returns how many items went out.
    pub async fn dispatch(&self, category: &Category, ledger: &mut Ledger) -> Result<usize, DispatchError> {
        let handle = self.resolve(category).await?;

        let send_err = |source: ChannelError| DispatchError::Channel {
            category: category.id.clone(),
            source,
        };

        let header = header_text(category, (self.clock)());
        self.timed(self.channel.send_text(&handle, &header))
            .await
            .map_err(send_err)?;

        let mut delivered = 0usize;
        let mut candidates = self.poller.poll(category);
        loop {
            // Cap ends the whole pass, not just the current source.
            if category.cap_reached(delivered) {
                tracing::debug!(category = %category.id, delivered, "cap reached");
                break;
            }
            let Some(entry) = candidates.next_entry().await else {
                break;
            };

            if ledger.contains(&entry.link) {
                counter!("relay_dedup_skipped_total").increment(1);
                continue;
            }

            let text = filter::combined_text(&entry);
            if !filter::matches(category, &text) {
                counter!("relay_filtered_total").increment(1);
                continue;
            }

            let body = match &self.summarizer {
                Some(s) => s.summarize(&text).await,
                None => ingest::snippet(&entry.body),
            };

            let item = ItemMessage {
                title: entry.title,
                body,
                link: entry.link,
                category_label: category.name.clone(),
            };
            self.timed(self.channel.send_item(&handle, &item))
                .await
                .map_err(send_err)?;

            ledger.record(item.link.clone(), (self.clock)());
            self.store.save(ledger)?;
            delivered += 1;
            counter!("relay_items_delivered_total", "category" => category.id.clone()).increment(1);
        }

        if delivered == 0 {
            self.timed(self.channel.send_text(&handle, NO_NEW_ITEMS_TEXT))
                .await
                .map_err(send_err)?;
        }

        tracing::info!(
            category = %category.id,
            delivered,
            sources = candidates.sources_visited(),
            "dispatch done"
        );
        Ok(delivered)
    }

    async fn resolve(&self, category: &Category) -> Result<ChannelHandle, DispatchError> {
        let unresolved = |reason: String| DispatchError::ChannelResolution {
            category: category.id.clone(),
            channel: category.channel,
            reason,
        };
        match self.timed(self.channel.resolve(category.channel)).await {
            Ok(Some(handle)) => Ok(handle),
            Ok(None) => Err(unresolved("channel not found".to_string())),
            Err(e) => Err(unresolved(e.to_string())),
        }
    }

    async fn timed<T>(
        &self,
        fut: impl std::future::Future<Output = Result<T, ChannelError>>,
    ) -> Result<T, ChannelError> {
        tokio::time::timeout(self.channel_timeout, fut)
            .await
            .unwrap_or_else(|_| Err(ChannelError::Timeout(self.channel_timeout.as_secs())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn header_has_name_and_minute_timestamp() {
        let c = Category {
            id: "eu".into(),
            name: "🇪🇺 EU-POLITIK".into(),
            feeds: vec![],
            keywords: None,
            cap: Some(3),
            channel: 1,
        };
        let now = NaiveDate::from_ymd_opt(2025, 5, 4)
            .unwrap()
            .and_hms_opt(9, 7, 42)
            .unwrap();
        assert_eq!(
            header_text(&c, now),
            "\n🇸🇪 **🇪🇺 EU-POLITIK – 2025-05-04 09:07**\n"
        );
    }
}
