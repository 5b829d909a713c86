//! Performance benchmarks for the per-frame and per-cycle hot paths

use server::applier::TickApplier;
use server::cache::RankCache;
use server::fetcher::BoundedFetcher;
use server::game::GameState;
use server::provider::SimulatedProvider;
use shared::{steam2_identity, Team};
use std::sync::Arc;
use std::time::{Duration, Instant};

const BASE_STEAM_ID64: u64 = 76_561_197_960_265_728;

fn full_server(players: u32) -> GameState {
    let mut state = GameState::new();
    for slot in 1..=players {
        let team = if slot % 2 == 0 {
            Team::Terrorist
        } else {
            Team::CounterTerrorist
        };
        state.add_player(slot, BASE_STEAM_ID64 + u64::from(slot), false, team);
    }
    state
}

/// Benchmarks steady-state ticks where every rank is already displayed
#[test]
fn benchmark_steady_state_ticks() {
    let cache = Arc::new(RankCache::new());
    let applier = TickApplier::new(Arc::new(SimulatedProvider::new()), Arc::clone(&cache));
    let mut state = full_server(64);

    for slot in 1..=64u32 {
        cache.set_if_changed(&steam2_identity(BASE_STEAM_ID64 + u64::from(slot)), 1000 + slot as i32);
    }
    assert_eq!(applier.apply(&mut state), 64);

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        assert_eq!(applier.apply(&mut state), 0);
    }

    let duration = start.elapsed();
    println!(
        "Steady-state tick (64 players): {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    // A frame at 64Hz is ~15.6ms; one tick must stay far below that
    assert!(duration.as_secs() < 5);
}

/// Benchmarks change detection on repeated observations
#[test]
fn benchmark_cache_change_detection() {
    let cache = RankCache::new();
    let identities: Vec<_> = (0..64u64)
        .map(|i| steam2_identity(BASE_STEAM_ID64 + i))
        .collect();

    let iterations = 10_000;
    let start = Instant::now();

    for round in 0..iterations {
        for identity in &identities {
            cache.set_if_changed(identity, (round / 100) as i32);
        }
    }

    let duration = start.elapsed();
    println!(
        "Cache change detection: {} rounds of 64 in {:?}",
        iterations, duration
    );

    assert_eq!(cache.len(), 64);
    assert!(duration.as_secs() < 5);
}

/// Benchmarks one full poll cycle against an in-process provider
#[tokio::test]
async fn benchmark_poll_cycle() {
    let provider = Arc::new(SimulatedProvider::new());
    let state = full_server(64);
    for steam_id64 in state.eligible_steam_ids() {
        provider.set_rating(steam_id64, 1200);
    }

    let fetcher = BoundedFetcher::new(
        provider,
        Arc::new(RankCache::new()),
        shared::MAX_CONCURRENT_QUERIES,
        Duration::from_secs(3),
    );

    let start = Instant::now();
    let report = fetcher.run_cycle(state.eligible_steam_ids()).await;
    let duration = start.elapsed();

    println!("Poll cycle (64 players): {:?}", duration);

    assert_eq!(report.updated, 64);
    // Must comfortably fit inside the default poll interval
    assert!(duration < shared::DEFAULT_POLL_INTERVAL);
}
