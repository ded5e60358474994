// src/bootstrap.rs
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::RelayConfig;
use crate::dispatch::{local_clock, Dispatcher};
use crate::ingest::providers::rss::HttpFeedSource;
use crate::ingest::FeedPoller;
use crate::ledger::{load_and_prune, JsonFileStore, LedgerStore};
use crate::notify::discord::DiscordChannel;
use crate::notify::ChatChannel;
use crate::orchestrator::Orchestrator;
use crate::scheduler::Scheduler;
use crate::summarize::{OpenAiCompletion, Summarizer};

pub type RelayScheduler = Scheduler<tokio::sync::Mutex<Orchestrator>>;

/// Wire the real collaborators around the pipeline.
///
/// Loads and prunes the ledger before returning, so a corrupt ledger file
/// stops startup here.
pub fn build_scheduler(cfg: RelayConfig, discord_token: String) -> anyhow::Result<RelayScheduler> {
    // Safe diagnostics: never log secrets, only whether they are present.
    info!(
        categories = cfg.categories.len(),
        interval_secs = cfg.interval.as_secs(),
        retention_days = cfg.retention.num_days(),
        ledger = %cfg.ledger_path.display(),
        summarizer = cfg.summarizer.enabled,
        "relay config loaded"
    );

    let store: Arc<dyn LedgerStore> = Arc::new(JsonFileStore::new(&cfg.ledger_path));
    let clock = local_clock();
    let ledger = load_and_prune(store.as_ref(), clock(), cfg.retention)
        .context("loading link ledger")?;

    let discord = DiscordChannel::new(discord_token).with_timeout(cfg.timeouts.channel_secs);
    let channel_budget = discord.call_budget();
    let channel: Arc<dyn ChatChannel> = Arc::new(discord);
    let feeds = HttpFeedSource::new(cfg.timeouts.feed()).context("building feed http client")?;
    let poller = FeedPoller::new(Arc::new(feeds), cfg.timeouts.feed());

    let summarizer = if cfg.summarizer.enabled {
        let svc = OpenAiCompletion::new(
            cfg.summarizer.api_key.clone(),
            &cfg.summarizer.model,
            cfg.timeouts.summarize(),
        )
        .context("building summarizer http client")?;
        Some(Summarizer::new(
            Arc::new(svc),
            cfg.summarizer.system_prompt.clone(),
            cfg.timeouts.summarize(),
        ))
    } else {
        None
    };

    // Outer bound per channel call, never shorter than the adapter's retries.
    let dispatcher = Dispatcher::new(channel, poller, store, summarizer)
        .with_channel_timeout(channel_budget)
        .with_clock(clock);
    let orchestrator = Orchestrator::new(cfg.categories, dispatcher, ledger);

    Ok(Scheduler::new(
        Arc::new(tokio::sync::Mutex::new(orchestrator)),
        cfg.interval,
    ))
}
