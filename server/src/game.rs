use log::info;
use shared::{Player, Team};
use std::collections::HashMap;

/// Live player roster owned by the host
#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub tick: u32,
    pub players: HashMap<u32, Player>,
}

impl GameState {
    pub fn new() -> Self {
        Self {
            tick: 0,
            players: HashMap::new(),
        }
    }

    pub fn add_player(&mut self, slot: u32, steam_id64: u64, is_bot: bool, team: Team) {
        let player = Player::new(slot, steam_id64, is_bot, team);

        info!(
            "Added {} {} in slot {} ({:?})",
            if is_bot { "bot" } else { "player" },
            steam_id64,
            slot,
            team
        );
        self.players.insert(slot, player);
    }

    pub fn remove_player(&mut self, slot: &u32) -> Option<Player> {
        let removed = self.players.remove(slot);
        if removed.is_some() {
            info!("Removed player in slot {}", slot);
        }
        removed
    }

    pub fn set_team(&mut self, slot: u32, team: Team) -> bool {
        if let Some(player) = self.players.get_mut(&slot) {
            player.team = team;
            true
        } else {
            false
        }
    }

    pub fn eligible_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|player| player.is_eligible())
    }

    pub fn eligible_players_mut(&mut self) -> impl Iterator<Item = &mut Player> {
        self.players.values_mut().filter(|player| player.is_eligible())
    }

    pub fn eligible_steam_ids(&self) -> Vec<u64> {
        self.eligible_players().map(|player| player.steam_id64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_and_remove_player() {
        let mut state = GameState::new();
        state.add_player(1, 100, false, Team::Terrorist);
        assert_eq!(state.players.len(), 1);

        let removed = state.remove_player(&1).unwrap();
        assert_eq!(removed.steam_id64, 100);
        assert!(state.remove_player(&1).is_none());
    }

    #[test]
    fn test_eligible_players_skip_bots_and_spectators() {
        let mut state = GameState::new();
        state.add_player(1, 100, false, Team::Terrorist);
        state.add_player(2, 200, true, Team::Terrorist);
        state.add_player(3, 300, false, Team::Spectator);
        state.add_player(4, 400, false, Team::CounterTerrorist);

        let mut ids = state.eligible_steam_ids();
        ids.sort();
        assert_eq!(ids, vec![100, 400]);
    }

    #[test]
    fn test_set_team() {
        let mut state = GameState::new();
        state.add_player(1, 100, false, Team::Terrorist);

        assert!(state.set_team(1, Team::Spectator));
        assert!(state.eligible_steam_ids().is_empty());
        assert!(!state.set_team(9, Team::Terrorist));
    }
}
