//! Access to the external rank provider
//!
//! Ratings come from a leveling plugin running in the same host. The
//! reconciliation code only sees the narrow [`RankProvider`] trait and looks
//! the provider up by capability name at startup.

use async_trait::async_trait;
use log::info;
use parking_lot::RwLock;
use rand::Rng;
use shared::{steam2_identity, PlayerIdentity};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Capability name the leveling plugin registers itself under
pub const LEVELS_RANKS_CAPABILITY: &str = "levels_ranks";

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Rank provider unavailable: {0}")]
    Unavailable(String),

    #[error("Rank query timed out after {0:?}")]
    Timeout(Duration),

    #[error("Rank provider failed: {0}")]
    Backend(String),
}

/// Source of current ratings for connected players
#[async_trait]
pub trait RankProvider: Send + Sync {
    /// Maps a SteamID64 to the key the provider indexes ratings by
    fn convert_identity(&self, steam_id64: u64) -> PlayerIdentity;

    /// Fetches every rating the provider currently knows
    async fn current_ratings(&self) -> Result<HashMap<PlayerIdentity, i32>, ProviderError>;

    /// Looks up a single rating
    ///
    /// The default goes through the bulk query, which is what the leveling
    /// plugin exposes. Providers with a per-player endpoint should override it.
    async fn rating_for(&self, identity: &PlayerIdentity) -> Result<Option<i32>, ProviderError> {
        let ratings = self.current_ratings().await?;
        Ok(ratings.get(identity).copied())
    }
}

/// Named capabilities published by other plugins in the host
#[derive(Default)]
pub struct CapabilityRegistry {
    providers: HashMap<String, Arc<dyn RankProvider>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: &str, provider: Arc<dyn RankProvider>) {
        info!("Capability '{}' registered", name);
        self.providers.insert(name.to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn RankProvider>> {
        self.providers.get(name).cloned()
    }
}

/// In-process provider backing the standalone server binary
///
/// Keeps a rating per SteamID64 and lets the caller nudge ratings around
/// to mimic matches being played.
#[derive(Debug, Default)]
pub struct SimulatedProvider {
    ratings: RwLock<HashMap<PlayerIdentity, i32>>,
}

impl SimulatedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rating(&self, steam_id64: u64, rating: i32) {
        self.ratings
            .write()
            .insert(steam2_identity(steam_id64), rating);
    }

    pub fn remove_rating(&self, steam_id64: u64) {
        self.ratings.write().remove(&steam2_identity(steam_id64));
    }

    /// Shifts a random subset of ratings by up to `max_delta` in either direction
    pub fn drift(&self, max_delta: i32) -> usize {
        let mut rng = rand::thread_rng();
        let mut changed = 0;

        for rating in self.ratings.write().values_mut() {
            if rng.gen_bool(0.25) {
                let delta = rng.gen_range(-max_delta..=max_delta);
                *rating = (*rating + delta).max(0);
                changed += 1;
            }
        }

        changed
    }
}

#[async_trait]
impl RankProvider for SimulatedProvider {
    fn convert_identity(&self, steam_id64: u64) -> PlayerIdentity {
        steam2_identity(steam_id64)
    }

    async fn current_ratings(&self) -> Result<HashMap<PlayerIdentity, i32>, ProviderError> {
        Ok(self.ratings.read().clone())
    }
}
