//! Fixed-interval trigger for poll cycles
//!
//! Runs on its own task, independent of the frame loop. Only one cycle is in
//! flight at a time: a tick that arrives while the previous cycle is still
//! waiting on the provider is skipped instead of stacking another cycle.

use crate::fetcher::BoundedFetcher;
use crate::game::GameState;
use log::{debug, info};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

#[derive(Debug, Default)]
struct SchedulerStats {
    in_flight: AtomicBool,
    started: AtomicU64,
    skipped: AtomicU64,
}

/// Clears the in-flight flag when the cycle task ends, even on panic
struct InFlightGuard(Arc<SchedulerStats>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.in_flight.store(false, Ordering::Release);
    }
}

pub struct PollScheduler {
    period: Duration,
    stats: Arc<SchedulerStats>,
}

impl PollScheduler {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            stats: Arc::new(SchedulerStats::default()),
        }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn cycles_started(&self) -> u64 {
        self.stats.started.load(Ordering::Relaxed)
    }

    pub fn cycles_skipped(&self) -> u64 {
        self.stats.skipped.load(Ordering::Relaxed)
    }

    /// Starts the repeating timer
    ///
    /// The first cycle fires one period after this call. Aborting the
    /// returned handle stops the timer; a cycle already running finishes on
    /// its own task.
    pub fn spawn(
        &self,
        fetcher: Arc<BoundedFetcher>,
        game_state: Arc<RwLock<GameState>>,
    ) -> JoinHandle<()> {
        let period = self.period;
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

            // Skip the first tick since it fires immediately
            timer.tick().await;
            info!("Rank polling started every {:?}", period);

            loop {
                timer.tick().await;

                if stats.in_flight.swap(true, Ordering::AcqRel) {
                    stats.skipped.fetch_add(1, Ordering::Relaxed);
                    debug!("Previous poll cycle still running, skipping this one");
                    continue;
                }
                stats.started.fetch_add(1, Ordering::Relaxed);

                let steam_ids = game_state.read().await.eligible_steam_ids();
                let fetcher = Arc::clone(&fetcher);
                let guard = InFlightGuard(Arc::clone(&stats));

                tokio::spawn(async move {
                    let _guard = guard;
                    fetcher.run_cycle(steam_ids).await;
                });
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RankCache;
    use crate::provider::{ProviderError, RankProvider, SimulatedProvider};
    use async_trait::async_trait;
    use shared::{steam2_identity, PlayerIdentity, Team};
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    const PLAYER: u64 = 76_561_197_960_265_730;

    struct SlowProvider {
        delay: Duration,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    #[async_trait]
    impl RankProvider for SlowProvider {
        fn convert_identity(&self, steam_id64: u64) -> PlayerIdentity {
            steam2_identity(steam_id64)
        }

        async fn current_ratings(&self) -> Result<HashMap<PlayerIdentity, i32>, ProviderError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(HashMap::from([(steam2_identity(PLAYER), 1500)]))
        }
    }

    fn roster() -> Arc<RwLock<GameState>> {
        let mut state = GameState::new();
        state.add_player(1, PLAYER, false, Team::Terrorist);
        Arc::new(RwLock::new(state))
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_waits_one_period() {
        let provider = Arc::new(SimulatedProvider::new());
        provider.set_rating(PLAYER, 1500);
        let cache = Arc::new(RankCache::new());
        let fetcher = Arc::new(BoundedFetcher::new(
            provider,
            Arc::clone(&cache),
            10,
            Duration::from_secs(3),
        ));

        let scheduler = PollScheduler::new(Duration::from_secs(2));
        let handle = scheduler.spawn(fetcher, roster());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(scheduler.cycles_started(), 0);
        assert!(cache.is_empty());

        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert_eq!(scheduler.cycles_started(), 1);
        assert_eq!(cache.get(&steam2_identity(PLAYER)).map(|r| r.rating), Some(1500));

        handle.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_cycles_do_not_overlap() {
        let provider = Arc::new(SlowProvider {
            delay: Duration::from_secs(5),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        });
        let cache = Arc::new(RankCache::new());
        let fetcher = Arc::new(BoundedFetcher::new(
            provider.clone(),
            cache,
            10,
            Duration::from_secs(10),
        ));

        let scheduler = PollScheduler::new(Duration::from_secs(2));
        let handle = scheduler.spawn(fetcher, roster());

        tokio::time::sleep(Duration::from_secs(15)).await;
        handle.abort();

        assert!(scheduler.cycles_started() >= 2);
        assert!(scheduler.cycles_skipped() >= 2);
        assert_eq!(provider.peak.load(Ordering::SeqCst), 1);
    }
}
