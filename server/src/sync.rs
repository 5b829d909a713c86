//! Wiring of the rank sync subsystem
//!
//! Owns the cache and hands it to both sides: the poll scheduler writes into
//! it on its own timer, the host's frame callback reads from it through
//! [`RankSync::on_tick`]. The two sides never share anything else.

use crate::applier::TickApplier;
use crate::cache::RankCache;
use crate::config::{ConfigError, FakeRankSettings};
use crate::fetcher::BoundedFetcher;
use crate::game::GameState;
use crate::provider::{CapabilityRegistry, RankProvider, LEVELS_RANKS_CAPABILITY};
use crate::scheduler::PollScheduler;
use log::{error, info};
use shared::{DEFAULT_POLL_INTERVAL, DEFAULT_QUERY_TIMEOUT, MAX_CONCURRENT_QUERIES};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy)]
pub struct SyncOptions {
    pub poll_interval: Duration,
    pub max_concurrent: usize,
    pub query_timeout: Duration,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_concurrent: MAX_CONCURRENT_QUERIES,
            query_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

pub struct RankSync {
    provider: Arc<dyn RankProvider>,
    cache: Arc<RankCache>,
    applier: TickApplier,
    scheduler: PollScheduler,
    poll_task: JoinHandle<()>,
    settings: FakeRankSettings,
}

impl RankSync {
    /// Brings up rank sync if the rank provider is available
    ///
    /// Returns `Ok(None)` when the provider capability is missing; sync then
    /// stays off for the rest of the process. A zero poll interval or a
    /// settings file that cannot be created is an error.
    pub fn start(
        registry: &CapabilityRegistry,
        settings_root: &Path,
        game_state: Arc<RwLock<GameState>>,
        options: SyncOptions,
    ) -> Result<Option<Self>, ConfigError> {
        if options.poll_interval.is_zero() {
            return Err(ConfigError::InvalidPollInterval(options.poll_interval));
        }

        let Some(provider) = registry.get(LEVELS_RANKS_CAPABILITY) else {
            error!("Levels Ranks API is currently unavailable.");
            return Ok(None);
        };

        let settings = FakeRankSettings::load_or_create(settings_root)?;

        let cache = Arc::new(RankCache::new());
        let fetcher = Arc::new(BoundedFetcher::new(
            Arc::clone(&provider),
            Arc::clone(&cache),
            options.max_concurrent,
            options.query_timeout,
        ));
        let applier = TickApplier::new(Arc::clone(&provider), Arc::clone(&cache));

        let scheduler = PollScheduler::new(options.poll_interval);
        let poll_task = scheduler.spawn(fetcher, game_state);

        info!(
            "Rank sync enabled (poll every {:?}, {} concurrent queries, {:?} timeout)",
            scheduler.period(),
            options.max_concurrent,
            options.query_timeout
        );

        Ok(Some(Self {
            provider,
            cache,
            applier,
            scheduler,
            poll_task,
            settings,
        }))
    }

    /// Frame callback: pushes changed ranks onto the scoreboard
    pub fn on_tick(&self, game_state: &mut GameState) -> usize {
        self.applier.apply(game_state)
    }

    /// Forgets the cached rank of a player who left
    pub fn on_player_disconnect(&self, steam_id64: u64) -> bool {
        let identity = self.provider.convert_identity(steam_id64);
        self.cache.evict(&identity)
    }

    pub fn cache(&self) -> &Arc<RankCache> {
        &self.cache
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn settings(&self) -> &FakeRankSettings {
        &self.settings
    }

    /// Stops polling; cycles already in flight run to completion
    pub fn shutdown(&self) {
        self.poll_task.abort();
        info!("Rank sync stopped");
    }
}

impl Drop for RankSync {
    fn drop(&mut self) {
        self.poll_task.abort();
    }
}
