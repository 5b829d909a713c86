//! Bounded fan-out of rank queries for one poll cycle
//!
//! Every eligible player gets its own query task. A shared semaphore caps how
//! many of them talk to the provider at once, and each query is wrapped in a
//! timeout so a hung provider only stalls its own slot. Failures are logged
//! per player and never abort the rest of the cycle.

use crate::cache::RankCache;
use crate::provider::{ProviderError, RankProvider};
use log::{debug, warn};
use shared::PlayerIdentity;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Outcome of a single player's query
#[derive(Debug)]
enum QueryOutcome {
    Updated,
    Unchanged,
    Missing(PlayerIdentity),
    Failed,
}

/// Summary of one completed poll cycle
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub queried: usize,
    pub updated: usize,
    pub unchanged: usize,
    /// Players the provider had no rating for
    pub missing: Vec<PlayerIdentity>,
    /// Queries that errored or timed out
    pub failed: usize,
}

pub struct BoundedFetcher {
    provider: Arc<dyn RankProvider>,
    cache: Arc<RankCache>,
    permits: Arc<Semaphore>,
    query_timeout: Duration,
}

impl BoundedFetcher {
    pub fn new(
        provider: Arc<dyn RankProvider>,
        cache: Arc<RankCache>,
        max_concurrent: usize,
        query_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
            query_timeout,
        }
    }

    /// Queries the provider for every given player and records the results
    ///
    /// Resolves once all queries issued by this cycle have finished.
    pub async fn run_cycle(&self, steam_ids: Vec<u64>) -> CycleReport {
        let mut tasks = JoinSet::new();
        let mut report = CycleReport {
            queried: steam_ids.len(),
            ..CycleReport::default()
        };

        for steam_id64 in steam_ids {
            let provider = Arc::clone(&self.provider);
            let cache = Arc::clone(&self.cache);
            let permits = Arc::clone(&self.permits);
            let query_timeout = self.query_timeout;

            tasks.spawn(async move {
                // The permit is dropped when the task ends, success or not
                let _permit = match permits.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return QueryOutcome::Failed,
                };
                Self::update_player(provider.as_ref(), &cache, steam_id64, query_timeout).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(QueryOutcome::Updated) => report.updated += 1,
                Ok(QueryOutcome::Unchanged) => report.unchanged += 1,
                Ok(QueryOutcome::Missing(identity)) => report.missing.push(identity),
                Ok(QueryOutcome::Failed) => report.failed += 1,
                Err(e) => {
                    warn!("Rank query task failed: {}", e);
                    report.failed += 1;
                }
            }
        }

        debug!(
            "Poll cycle done: {} queried, {} updated, {} unchanged, {} missing, {} failed",
            report.queried,
            report.updated,
            report.unchanged,
            report.missing.len(),
            report.failed
        );
        report
    }

    async fn update_player(
        provider: &dyn RankProvider,
        cache: &RankCache,
        steam_id64: u64,
        query_timeout: Duration,
    ) -> QueryOutcome {
        let identity = provider.convert_identity(steam_id64);

        let result = match tokio::time::timeout(query_timeout, provider.rating_for(&identity)).await
        {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(query_timeout)),
        };

        match result {
            Ok(Some(rating)) => {
                if cache.set_if_changed(&identity, rating) {
                    QueryOutcome::Updated
                } else {
                    QueryOutcome::Unchanged
                }
            }
            Ok(None) => {
                warn!(
                    "No rank found for player {} (SteamID64: {})",
                    identity, steam_id64
                );
                QueryOutcome::Missing(identity)
            }
            Err(e) => {
                warn!(
                    "Rank query for player {} (SteamID64: {}) failed: {}",
                    identity, steam_id64, e
                );
                QueryOutcome::Failed
            }
        }
    }
}
