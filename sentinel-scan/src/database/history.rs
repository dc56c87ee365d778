//! Scan history
//!
//! A capped, most-recent-first list of scan summaries persisted as one JSON
//! value. Reads fail soft: history is convenience state, so an unreadable
//! value is logged and treated as empty.

use super::{DatabaseError, KeyValueStore};
use crate::engine::result::{ScanHistoryItem, ScanResult};
use std::sync::Arc;
use tracing::{debug, warn};

/// Storage key holding the serialized history
pub const HISTORY_KEY: &str = "sentinel_history";

/// Number of entries kept
pub const HISTORY_LIMIT: usize = 10;

pub struct HistoryStore {
    backend: Arc<dyn KeyValueStore>,
    items: Vec<ScanHistoryItem>,
    limit: usize,
}

impl HistoryStore {
    /// Load the persisted history with the default cap
    pub fn load(backend: Arc<dyn KeyValueStore>) -> Self {
        Self::load_with_limit(backend, HISTORY_LIMIT)
    }

    pub fn load_with_limit(backend: Arc<dyn KeyValueStore>, limit: usize) -> Self {
        let mut items = read_history(backend.as_ref());
        items.truncate(limit);
        debug!("Loaded {} history entries", items.len());
        Self {
            backend,
            items,
            limit,
        }
    }

    /// Prepend the summary of `result`, drop the oldest entries beyond the
    /// cap and persist the whole list.
    ///
    /// The in-memory list is updated even when persisting fails.
    pub fn record_result(&mut self, result: &ScanResult) -> Result<(), DatabaseError> {
        self.items.insert(0, result.summary());
        self.items.truncate(self.limit);

        let json = serde_json::to_string(&self.items)?;
        self.backend.set(HISTORY_KEY, &json)
    }

    /// Entries, most recent first
    pub fn items(&self) -> &[ScanHistoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn read_history(backend: &dyn KeyValueStore) -> Vec<ScanHistoryItem> {
    match backend.get(HISTORY_KEY) {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(items) => items,
            Err(e) => {
                warn!("Failed to load history, starting empty: {}", e);
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Failed to read history, starting empty: {}", e);
            Vec::new()
        }
    }
}
