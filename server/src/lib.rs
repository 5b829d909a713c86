//! # Rank Sync Server Library
//!
//! Keeps the competitive rank shown on each player's scoreboard in line with
//! the rating held by an external leveling plugin. Ratings are never computed
//! here; they are copied verbatim from the provider.
//!
//! ## Architecture
//!
//! Two independent schedules drive the subsystem:
//!
//! - **Poll cycle**: a fixed-interval timer (2 seconds by default) collects
//!   the eligible players, queries the provider for each of them with at most
//!   ten queries outstanding, and records any changed rating in the cache.
//! - **Tick**: the host's per-frame callback reads the cache and writes the
//!   rank onto players whose scoreboard is out of date.
//!
//! The cache is the only state the two schedules share. Bots and spectators
//! take part in neither.
//!
//! ## Module Organization
//!
//! - `cache`: thread-safe map from player identity to the rank to display
//! - `provider`: the rank provider trait, capability lookup and a simulated provider
//! - `fetcher`: bounded, timeout-guarded fan-out of provider queries
//! - `scheduler`: single-flight interval timer driving poll cycles
//! - `applier`: per-frame change-only write of cached ranks
//! - `game`: the host's live player roster
//! - `config`: bootstrap of `settings_fakerank.json`
//! - `sync`: wiring of all of the above behind one handle
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::game::GameState;
//! use server::provider::{CapabilityRegistry, SimulatedProvider, LEVELS_RANKS_CAPABILITY};
//! use server::sync::{RankSync, SyncOptions};
//! use std::path::Path;
//! use std::sync::Arc;
//! use tokio::sync::RwLock;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut registry = CapabilityRegistry::new();
//!     registry.register(LEVELS_RANKS_CAPABILITY, Arc::new(SimulatedProvider::new()));
//!
//!     let game_state = Arc::new(RwLock::new(GameState::new()));
//!     let sync = RankSync::start(&registry, Path::new("."), Arc::clone(&game_state), SyncOptions::default())?;
//!
//!     if let Some(sync) = sync {
//!         // Call once per frame from the host
//!         let mut state = game_state.write().await;
//!         sync.on_tick(&mut state);
//!     }
//!     Ok(())
//! }
//! ```

pub mod applier;
pub mod cache;
pub mod config;
pub mod fetcher;
pub mod game;
pub mod provider;
pub mod scheduler;
pub mod sync;
