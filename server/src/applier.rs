//! Per-frame application of cached ranks onto live player state

use crate::cache::RankCache;
use crate::game::GameState;
use crate::provider::RankProvider;
use std::sync::Arc;

/// Copies cached rank records onto the scoreboard of eligible players
///
/// Runs every frame, so it only writes when the displayed rank differs from
/// the cached one. Players without a cache entry are left alone.
pub struct TickApplier {
    provider: Arc<dyn RankProvider>,
    cache: Arc<RankCache>,
}

impl TickApplier {
    pub fn new(provider: Arc<dyn RankProvider>, cache: Arc<RankCache>) -> Self {
        Self { provider, cache }
    }

    /// Returns the number of players whose displayed rank was rewritten
    pub fn apply(&self, game_state: &mut GameState) -> usize {
        let mut written = 0;

        for player in game_state.eligible_players_mut() {
            let identity = self.provider.convert_identity(player.steam_id64);

            let Some(record) = self.cache.get(&identity) else {
                continue;
            };

            if player.displayed_rank() != record {
                player.display_rank(record);
                written += 1;
            }
        }

        written
    }
}
