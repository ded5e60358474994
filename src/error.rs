// src/error.rs
//! Error taxonomy for the relay pipeline.
//!
//! Only `StorageError` is allowed to stop the process (at startup). Every other
//! kind is contained by the component that produced it and turned into a log
//! line, a skipped source, a skipped category or a fallback summary.

use thiserror::Error;

/// Ledger file could not be read, parsed or written.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("reading ledger {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("writing ledger {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("ledger {path} is corrupt: {message}")]
    Corrupt { path: String, message: String },
}

/// Chat platform call failed.
#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("channel request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("channel returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("channel call timed out after {0}s")]
    Timeout(u64),
}

/// A single feed source could not be fetched or parsed.
#[derive(Error, Debug)]
pub enum FeedFetchError {
    #[error("fetching {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("fetching {url}: HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("parsing {url}: {message}")]
    Parse { url: String, message: String },

    #[error("fetching {url} timed out after {secs}s")]
    Timeout { url: String, secs: u64 },
}

/// Summarization service failed. Never leaves the summarizer adapter.
#[derive(Error, Debug)]
pub enum SummarizationError {
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("completion returned HTTP {0}")]
    Status(u16),

    #[error("completion was empty")]
    Empty,

    #[error("completion timed out after {0}s")]
    Timeout(u64),

    #[error("no API key configured")]
    MissingKey,
}

/// Why a single category's dispatch stopped early.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("channel {channel} for category {category} could not be resolved: {reason}")]
    ChannelResolution {
        category: String,
        channel: u64,
        reason: String,
    },

    #[error("sending to category {category}: {source}")]
    Channel {
        category: String,
        #[source]
        source: ChannelError,
    },

    #[error(transparent)]
    Storage(#[from] StorageError),
}
