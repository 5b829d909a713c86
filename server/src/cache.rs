//! Last-known rank data shared between the poll cycle and the frame loop
//!
//! The poll cycle writes observed ratings into the cache, the per-frame
//! applier reads the records back out. Both sides run on independent
//! schedules, so every access goes through a read-write lock.

use log::debug;
use parking_lot::RwLock;
use shared::{PlayerIdentity, RankRecord};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    /// Record the applier should display
    record: RankRecord,
    /// Raw rating from the most recent successful query
    last_observed: i32,
}

/// Maps player identities to the rank that should be on their scoreboard
///
/// An identity only appears after a successful provider query. Entries are
/// rewritten when the observed rating changes and removed on disconnect.
#[derive(Debug, Default)]
pub struct RankCache {
    entries: RwLock<HashMap<PlayerIdentity, CacheEntry>>,
}

impl RankCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record to display for the identity, if one was ever fetched
    pub fn get(&self, identity: &PlayerIdentity) -> Option<RankRecord> {
        self.entries.read().get(identity).map(|entry| entry.record)
    }

    /// Stores a freshly observed rating
    ///
    /// Returns true if the record changed, false when the rating matches the
    /// last observed value for this identity.
    pub fn set_if_changed(&self, identity: &PlayerIdentity, rating: i32) -> bool {
        let mut entries = self.entries.write();

        if let Some(entry) = entries.get(identity) {
            if entry.last_observed == rating {
                return false;
            }
        }

        debug!("Rank for {} is now {}", identity, rating);
        entries.insert(
            identity.clone(),
            CacheEntry {
                record: RankRecord::from_rating(rating),
                last_observed: rating,
            },
        );
        true
    }

    /// Drops the entry for a player who left the server
    pub fn evict(&self, identity: &PlayerIdentity) -> bool {
        self.entries.write().remove(identity).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}
