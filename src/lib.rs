//! # Pool Standings
//!
//! Standings, tiebreakers and bracket advancement for pool-play tournaments.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (teams, pools, games, tiebreaker rules, standings)
//! - **standings**: Pure standings engine with recursive tie resolution
//! - **bracket**: Fills semifinal and final slots as results come in
//! - **storage**: Record access (JSONL files, in-memory)
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod bracket;
pub mod config;
pub mod models;
pub mod standings;
pub mod storage;

pub use models::*;
