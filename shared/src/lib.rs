use std::fmt;
use std::time::Duration;

/// Rank class written for every record. The rank provider only supplies the
/// rating, so the class never varies.
pub const RANK_CLASS_SENTINEL: i8 = 11;
/// Wins value shown next to the rank whenever a new rank is applied.
pub const FORCED_WINS: i32 = 777;
/// Upper bound on outstanding provider queries during one poll cycle.
pub const MAX_CONCURRENT_QUERIES: usize = 10;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(3);

/// Offset between a SteamID64 and the account number of an individual account.
const STEAM_ID64_BASE: u64 = 76_561_197_960_265_728;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Team {
    None,
    Spectator,
    Terrorist,
    CounterTerrorist,
}

/// Stable per-session key used by the rank provider to index ratings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerIdentity(String);

impl PlayerIdentity {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Converts a SteamID64 into the `STEAM_1:Y:Z` form used as a rating key.
pub fn steam2_identity(steam_id64: u64) -> PlayerIdentity {
    let account = steam_id64.wrapping_sub(STEAM_ID64_BASE);
    PlayerIdentity(format!("STEAM_1:{}:{}", account & 1, account >> 1))
}

/// The rank pair shown on a player's scoreboard entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankRecord {
    pub rating: i32,
    pub rank_class: i8,
}

impl RankRecord {
    pub fn from_rating(rating: i32) -> Self {
        Self {
            rating,
            rank_class: RANK_CLASS_SENTINEL,
        }
    }
}

/// Live state of one connected player as exposed by the host.
#[derive(Debug, Clone)]
pub struct Player {
    pub slot: u32,
    pub steam_id64: u64,
    pub is_bot: bool,
    pub team: Team,
    pub competitive_rank_type: i8,
    pub competitive_ranking: i32,
    pub competitive_wins: i32,
}

impl Player {
    pub fn new(slot: u32, steam_id64: u64, is_bot: bool, team: Team) -> Self {
        Self {
            slot,
            steam_id64,
            is_bot,
            team,
            competitive_rank_type: 0,
            competitive_ranking: 0,
            competitive_wins: 0,
        }
    }

    /// Bots and spectators never take part in rank sync.
    pub fn is_eligible(&self) -> bool {
        !self.is_bot && self.team != Team::Spectator
    }

    pub fn displayed_rank(&self) -> RankRecord {
        RankRecord {
            rating: self.competitive_ranking,
            rank_class: self.competitive_rank_type,
        }
    }

    pub fn display_rank(&mut self, record: RankRecord) {
        self.competitive_rank_type = record.rank_class;
        self.competitive_ranking = record.rating;
        self.competitive_wins = FORCED_WINS;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steam2_identity() {
        assert_eq!(
            steam2_identity(76_561_197_960_287_930).as_str(),
            "STEAM_1:0:11101"
        );
        assert_eq!(
            steam2_identity(76_561_197_960_265_729).as_str(),
            "STEAM_1:1:0"
        );
    }

    #[test]
    fn test_rank_record_uses_sentinel_class() {
        let record = RankRecord::from_rating(1500);
        assert_eq!(record.rating, 1500);
        assert_eq!(record.rank_class, RANK_CLASS_SENTINEL);
    }

    #[test]
    fn test_player_eligibility() {
        assert!(Player::new(1, 1, false, Team::Terrorist).is_eligible());
        assert!(Player::new(2, 2, false, Team::None).is_eligible());
        assert!(!Player::new(3, 3, true, Team::CounterTerrorist).is_eligible());
        assert!(!Player::new(4, 4, false, Team::Spectator).is_eligible());
    }

    #[test]
    fn test_display_rank_forces_wins() {
        let mut player = Player::new(1, 1, false, Team::Terrorist);
        player.display_rank(RankRecord::from_rating(1600));

        assert_eq!(player.competitive_ranking, 1600);
        assert_eq!(player.competitive_rank_type, RANK_CLASS_SENTINEL);
        assert_eq!(player.competitive_wins, FORCED_WINS);
        assert_eq!(player.displayed_rank(), RankRecord::from_rating(1600));
    }
}
