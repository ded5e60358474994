// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod bootstrap;
pub mod category;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod ingest;
pub mod ledger;
pub mod notify;
pub mod orchestrator;
pub mod scheduler;
pub mod summarize;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::category::{Category, ChannelId};
pub use crate::dispatch::Dispatcher;
pub use crate::ingest::types::{FeedEntry, FeedSource};
pub use crate::ledger::{Ledger, LedgerStore};
pub use crate::notify::{ChannelHandle, ChatChannel, ItemMessage};
pub use crate::orchestrator::{Orchestrator, RunReport};
pub use crate::scheduler::{RunSlot, RunState, ScheduledRun, Scheduler};
