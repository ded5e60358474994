// src/category.rs
use serde::{Deserialize, Serialize};

/// Discord snowflake of the destination channel.
pub type ChannelId = u64;

/// A configured news topic. Built once at startup and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Stable identifier, e.g. "ekonomi".
    pub id: String,
    /// Display name used in headers and item footers.
    pub name: String,
    /// Feed URLs, polled in this order.
    pub feeds: Vec<String>,
    /// `None` accepts every entry.
    pub keywords: Option<Vec<String>>,
    /// Max items per run; `None` is unlimited.
    pub cap: Option<usize>,
    pub channel: ChannelId,
}

impl Category {
    pub fn cap_reached(&self, delivered: usize) -> bool {
        self.cap.is_some_and(|cap| delivered >= cap)
    }
}
