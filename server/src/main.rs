use clap::Parser;
use log::{debug, info, warn};
use rand::Rng;
use server::game::GameState;
use server::provider::{CapabilityRegistry, SimulatedProvider, LEVELS_RANKS_CAPABILITY};
use server::sync::{RankSync, SyncOptions};
use shared::Team;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// First SteamID64 handed out to simulated players
const FIRST_STEAM_ID64: u64 = 76_561_197_960_265_728;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Application root holding the `configs/` directory
    #[clap(short, long, default_value = ".")]
    root_dir: PathBuf,
    /// Frame rate of the simulated host (ticks per second)
    #[clap(short, long, default_value = "64")]
    tick_rate: u32,
    /// Seconds between rank poll cycles
    #[clap(short, long, default_value = "2.0", value_parser = parse_poll_interval)]
    poll_interval: Duration,
    /// Maximum rank queries outstanding at once
    #[clap(short, long, default_value = "10")]
    max_concurrent: usize,
    /// Per-query timeout in milliseconds
    #[clap(long, default_value = "3000")]
    query_timeout_ms: u64,
    /// Number of simulated human players
    #[clap(long, default_value = "8")]
    players: u32,
    /// Number of simulated bots
    #[clap(long, default_value = "2")]
    bots: u32,
    /// Start without registering the rank provider
    #[clap(long)]
    disable_provider: bool,
}

/// Parses a strictly positive number of seconds.
fn parse_poll_interval(value: &str) -> Result<Duration, String> {
    let seconds: f32 = value
        .parse()
        .map_err(|e| format!("`{}` is not a number: {}", value, e))?;

    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("poll interval must be greater than zero, got {}", value));
    }

    Duration::try_from_secs_f32(seconds).map_err(|e| e.to_string())
}

/// Main-method of the application.
/// Builds a simulated host roster and rank provider, then runs the frame loop.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let game_state = Arc::new(RwLock::new(GameState::new()));
    let provider = Arc::new(SimulatedProvider::new());
    populate_roster(&mut *game_state.write().await, &provider, &args);

    let mut registry = CapabilityRegistry::new();
    if !args.disable_provider {
        registry.register(LEVELS_RANKS_CAPABILITY, provider.clone());
    }

    let options = SyncOptions {
        poll_interval: args.poll_interval,
        max_concurrent: args.max_concurrent,
        query_timeout: Duration::from_millis(args.query_timeout_ms),
    };

    let sync = match RankSync::start(&registry, &args.root_dir, Arc::clone(&game_state), options)? {
        Some(sync) => sync,
        None => {
            warn!("Rank sync disabled, nothing to do");
            return Ok(());
        }
    };

    // Ratings move while matches are played
    let drift_handle = {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move {
            let mut timer = interval(Duration::from_secs(5));
            loop {
                timer.tick().await;
                let changed = provider.drift(25);
                debug!("Simulated {} rating changes", changed);
            }
        })
    };

    tokio::select! {
        _ = run_frame_loop(&sync, Arc::clone(&game_state), args.tick_rate) => {}
        _ = tokio::signal::ctrl_c() => {
            println!("Received Ctrl+C, shutting down gracefully...");
        }
    }

    drift_handle.abort();
    sync.shutdown();

    Ok(())
}

/// Fills the host with players, bots and one spectator.
/// The last human player has no rating so the missing-rank path is visible.
fn populate_roster(state: &mut GameState, provider: &SimulatedProvider, args: &Args) {
    let mut rng = rand::thread_rng();
    let mut slot = 0;

    for i in 0..args.players {
        slot += 1;
        let steam_id64 = FIRST_STEAM_ID64 + u64::from(slot);
        let team = if i % 2 == 0 {
            Team::Terrorist
        } else {
            Team::CounterTerrorist
        };
        state.add_player(slot, steam_id64, false, team);

        if i + 1 < args.players {
            provider.set_rating(steam_id64, rng.gen_range(800..2500));
        }
    }

    for _ in 0..args.bots {
        slot += 1;
        state.add_player(slot, 0, true, Team::Terrorist);
    }

    slot += 1;
    let spectator = FIRST_STEAM_ID64 + u64::from(slot);
    state.add_player(slot, spectator, false, Team::Spectator);
    provider.set_rating(spectator, 1000);
}

/// Moves one random human player: spectators rejoin a team, everyone else
/// either goes to spectate or reconnects, which drops their cached rank.
fn simulate_churn(state: &mut GameState, sync: &RankSync) {
    let mut rng = rand::thread_rng();

    let humans: Vec<u32> = state
        .players
        .values()
        .filter(|player| !player.is_bot)
        .map(|player| player.slot)
        .collect();
    if humans.is_empty() {
        return;
    }

    let slot = humans[rng.gen_range(0..humans.len())];
    let Some(player) = state.players.get(&slot) else {
        return;
    };
    let (steam_id64, team) = (player.steam_id64, player.team);

    if team == Team::Spectator {
        state.set_team(slot, Team::CounterTerrorist);
    } else if rng.gen_bool(0.5) {
        state.set_team(slot, Team::Spectator);
    } else if state.remove_player(&slot).is_some() {
        if sync.on_player_disconnect(steam_id64) {
            debug!("Dropped cached rank for {}", steam_id64);
        }
        state.add_player(slot, steam_id64, false, team);
    }
}

/// Runs the host frame loop, applying cached ranks once per frame.
async fn run_frame_loop(sync: &RankSync, game_state: Arc<RwLock<GameState>>, tick_rate: u32) {
    let mut interval_timer = interval(Duration::from_secs_f32(1.0 / tick_rate.max(1) as f32));
    interval_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Frame loop running at {}Hz", tick_rate);

    loop {
        interval_timer.tick().await;

        let mut state = game_state.write().await;
        state.tick += 1;

        // Every ten seconds someone leaves, rejoins or changes team
        if state.tick % (tick_rate.max(1) * 10) == 0 {
            simulate_churn(&mut state, sync);
        }

        let written = sync.on_tick(&mut state);
        if written > 0 {
            info!("Tick {}: updated rank for {} players", state.tick, written);
        }

        // Periodic monitoring
        if state.tick % (tick_rate.max(1) * 10) == 0 {
            debug!(
                "Tick {}: {} cached ranks, {} poll cycles run, {} skipped",
                state.tick,
                sync.cache().len(),
                sync.scheduler().cycles_started(),
                sync.scheduler().cycles_skipped()
            );
        }
    }
}
