// src/ledger.rs
//! Link ledger: which links were delivered, and when.
//!
//! The ledger is a plain value (`Ledger`) plus a persistence seam
//! (`LedgerStore`). Dedup is global across categories: the key is the link
//! alone. Timestamps use the process-local clock and are stored as naive
//! ISO-8601 strings, e.g. `2025-03-01T10:15:00.123456`.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Duration, NaiveDateTime};

use crate::error::StorageError;

/// Default retention window for delivered links.
pub const DEFAULT_RETENTION_DAYS: i64 = 30;

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, NaiveDateTime>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, link: &str) -> bool {
        self.entries.contains_key(link)
    }

    /// Mark `link` as delivered at `now`. Re-recording overwrites the timestamp.
    pub fn record(&mut self, link: impl Into<String>, now: NaiveDateTime) {
        self.entries.insert(link.into(), now);
    }

    /// Keep only entries strictly younger than `max_age` relative to `now`.
    /// A window reaching past the calendar range keeps everything.
    pub fn evict(&self, now: NaiveDateTime, max_age: Duration) -> Ledger {
        let Some(cutoff) = now.checked_sub_signed(max_age) else {
            return self.clone();
        };
        let entries = self
            .entries
            .iter()
            .filter(|(_, ts)| **ts > cutoff)
            .map(|(link, ts)| (link.clone(), *ts))
            .collect();
        Ledger { entries }
    }

    pub fn delivered_at(&self, link: &str) -> Option<NaiveDateTime> {
        self.entries.get(link).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Persistence for the ledger. `save` always writes the whole ledger.
pub trait LedgerStore: Send + Sync {
    fn load(&self) -> Result<Ledger, StorageError>;
    fn save(&self, ledger: &Ledger) -> Result<(), StorageError>;
}

/// Flat JSON object on disk, replaced atomically via a sibling temp file.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Ledger, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(s) => s,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Ledger::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.display(),
                    source,
                })
            }
        };

        // A present file must parse; blank content is corrupt.
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            path: self.display(),
            message: e.to_string(),
        })
    }

    fn save(&self, ledger: &Ledger) -> Result<(), StorageError> {
        let write_err = |source: std::io::Error| StorageError::Write {
            path: self.display(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let json = serde_json::to_vec(ledger).map_err(|e| StorageError::Corrupt {
            path: self.display(),
            message: e.to_string(),
        })?;

        let tmp = self.path.with_extension("json.tmp");
        let mut f = fs::File::create(&tmp).map_err(write_err)?;
        f.write_all(&json).map_err(write_err)?;
        f.sync_all().map_err(write_err)?;
        fs::rename(&tmp, &self.path).map_err(write_err)?;
        Ok(())
    }
}

/// In-memory store; keeps the last saved ledger and a save counter.
#[derive(Default)]
pub struct MemoryStore {
    saved: Mutex<Option<Ledger>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        Self {
            saved: Mutex::new(Some(ledger)),
            saves: Mutex::new(0),
        }
    }

    pub fn snapshot(&self) -> Option<Ledger> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn save_count(&self) -> usize {
        *self.saves.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Ledger, StorageError> {
        Ok(self.snapshot().unwrap_or_default())
    }

    fn save(&self, ledger: &Ledger) -> Result<(), StorageError> {
        *self.saved.lock().unwrap_or_else(|e| e.into_inner()) = Some(ledger.clone());
        *self.saves.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        Ok(())
    }
}

/// Startup sequence: load, prune by age, write the pruned ledger back.
pub fn load_and_prune(
    store: &dyn LedgerStore,
    now: NaiveDateTime,
    retention: Duration,
) -> Result<Ledger, StorageError> {
    let loaded = store.load()?;
    let pruned = loaded.evict(now, retention);
    tracing::info!(
        loaded = loaded.len(),
        kept = pruned.len(),
        evicted = loaded.len() - pruned.len(),
        "ledger pruned"
    );
    store.save(&pruned)?;
    Ok(pruned)
}
